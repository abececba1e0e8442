use futures::executor::block_on;
use itertools::assert_equal;
use seqpipe::{
    AsyncSeq, GroupByArg, Operator, Seq, SeqErr, TryGroupByArg, compose, filter, group_by, group_by_key, map, pipe,
    slice, slice_range,
};
use test_case::test_case;

#[test_case(0, Some(1) => vec![1] ; "first element")]
#[test_case(1, Some(2) => vec![2, 3] ; "middle window")]
#[test_case(1, None => vec![2, 3, 4] ; "open end")]
#[test_case(3, Some(5) => vec![4] ; "window past end")]
#[test_case(9, None => Vec::<i32>::new() ; "begin past end")]
#[test_case(2, Some(0) => Vec::<i32>::new() ; "empty window")]
fn slice_scenarios(begin: usize, take: Option<usize>) -> Vec<i32> {
    let sync = Seq::of([1, 2, 3, 4]).pipe(slice(begin, take)).to_vec();
    let async_ = block_on(AsyncSeq::from_vec(vec![1, 2, 3, 4]).pipe(slice(begin, take)).to_vec());
    assert_eq!(sync, async_);
    sync
}

#[test_case(vec![] => (0, 0) ; "empty")]
#[test_case(vec![1, 2, 3] => (3, 2) ; "three elements")]
#[test_case(vec![5, 6] => (2, 0) ; "no match")]
fn count_scenarios(values: Vec<i32>) -> (usize, usize) {
    let seq = Seq::from_vec(values.clone());
    let async_seq = AsyncSeq::from_vec(values);
    let counts = (seq.count(), seq.count_by(|x| *x < 3));
    assert_eq!(counts, (block_on(async_seq.count()), block_on(async_seq.count_by(|x| *x < 3))));
    counts
}

#[test]
fn group_by_parity_keeps_first_occurrence_order() {
    let groups: Vec<_> = Seq::of([1, 2, 3, 4]).pipe(group_by_key(|x: &i32| x % 2)).to_vec();
    assert_eq!(groups.len(), 2);
    assert_eq!(*groups[0].key(), 1);
    assert_equal(groups[0].cursor(), [1, 3]);
    assert_eq!(*groups[1].key(), 0);
    assert_equal(groups[1].cursor(), [2, 4]);
}

#[test]
fn chained_pipeline() {
    let words = Seq::text_lines("apple\navocado\nbanana\nblueberry\ncherry\ncoconut\ncranberry");
    let summary = pipe!(
        words,
        group_by(GroupByArg::new(|w: &String| w.chars().next()).element(|w| w.len()).result(|key, lens| {
            (key, lens.count(), lens.to_vec().into_iter().max())
        })),
        slice(1, Some(2))
    );
    assert_eq!(summary.to_vec(), vec![(Some('b'), 2, Some(9)), (Some('c'), 3, Some(9))]);
    assert_eq!(summary.to_vec(), summary.to_vec());
}

#[test]
fn compose_matches_sequential_pipe() {
    let evens_squared = compose(filter(|x: &i64| x % 2 == 0), map(|x: i64| x * x));
    let window = compose(evens_squared, slice_range(1..3));
    let seq = Seq::range(0, 20, 1);
    assert_eq!(window.apply(seq.clone()).to_vec(), vec![4, 16]);
    assert_eq!(seq.filter(|x| x % 2 == 0).map(|x| x * x).slice(1, Some(2)).to_vec(), vec![4, 16]);
}

#[test]
fn slice_over_infinite_source() {
    let seq = Seq::range(5, 5, 0).pipe(slice(2, Some(3)));
    assert_eq!(seq.to_vec(), vec![5, 5, 5]);
    let seq = Seq::repeat('x', None).slice(100, Some(2));
    assert_eq!(seq.to_vec(), vec!['x', 'x']);
}

#[test]
fn try_variants_report_failing_index() {
    let seq = Seq::of(["1", "2", "x", "4"]);
    let err = seq.try_count_by(|s| s.parse::<i32>().map(|v| v > 1)).unwrap_err();
    assert_eq!(err.op(), Some("count"));
    assert_eq!(err.index(), Some(2));

    let grouped = seq.try_group_by(TryGroupByArg::new(|s: &&str| s.parse::<i32>().map(|v| v % 2)));
    let results: Vec<_> = grouped.to_vec();
    assert_eq!(results.len(), 1);
    assert!(matches!(&results[0], Err(SeqErr::Selector { index: 2, .. })));
}

#[test]
fn single_use_source_is_visible() {
    let seq = Seq::once(vec![1, 2, 3]).pipe(slice(1, None));
    assert!(!seq.is_restartable());
    assert_eq!(seq.to_vec(), vec![2, 3]);
    assert!(seq.to_vec().is_empty());
}
