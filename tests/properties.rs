use futures::executor::block_on;
use proptest::prelude::*;
use seqpipe::{AsyncSeq, Seq, slice};
use std::cell::Cell;
use std::rc::Rc;

/// 越过`limit`个元素后拉取即panic的无限数据源
fn guarded_source(limit: usize, drawn: Rc<Cell<usize>>) -> Seq<usize> {
    Seq::from_fn(move || {
        let drawn = drawn.clone();
        (0..).inspect(move |i| {
            assert!(*i < limit, "pulled element {i} beyond window end {limit}");
            drawn.set(drawn.get() + 1);
        })
    })
}

proptest! {
    #[test]
    fn slice_matches_vec_window(
        values in proptest::collection::vec(any::<i32>(), 0..64),
        begin in 0usize..80,
        take in proptest::option::of(0usize..80),
    ) {
        let end = take.map_or(values.len(), |take| values.len().min(begin.saturating_add(take)));
        let expected = if begin < end { values[begin..end].to_vec() } else { Vec::new() };
        let seq = Seq::from_vec(values.clone()).pipe(slice(begin, take));
        prop_assert_eq!(seq.to_vec(), expected.clone());
        prop_assert_eq!(seq.to_vec(), expected.clone());
        prop_assert_eq!(block_on(AsyncSeq::from_vec(values).slice(begin, take).to_vec()), expected);
    }

    #[test]
    fn slice_never_draws_past_window(begin in 0usize..32, take in 1usize..32) {
        let drawn = Rc::new(Cell::new(0));
        let seq = guarded_source(begin + take, drawn.clone()).slice(begin, Some(take));
        prop_assert_eq!(seq.to_vec(), (begin..begin + take).collect::<Vec<_>>());
        prop_assert_eq!(drawn.get(), begin + take);
    }

    #[test]
    fn count_matches_manual_count(values in proptest::collection::vec(-50i32..50, 0..128)) {
        let seq = Seq::from_vec(values.clone());
        prop_assert_eq!(seq.count(), values.len());
        let manual = values.iter().filter(|v| **v > 0).count();
        prop_assert_eq!(seq.count_by(|v| *v > 0), manual);
        prop_assert_eq!(seq.try_count_by(|v| Ok::<_, String>(*v > 0)), Ok(manual));
    }

    #[test]
    fn group_by_partitions_in_first_occurrence_order(values in proptest::collection::vec(0u8..20, 0..96)) {
        let groups = Seq::from_vec(values.clone()).group_by(|v| v % 7).to_vec();

        let mut first_seen = Vec::new();
        for v in &values {
            if !first_seen.contains(&(v % 7)) {
                first_seen.push(v % 7);
            }
        }
        let keys: Vec<_> = groups.iter().map(|g| *g.key()).collect();
        prop_assert_eq!(keys, first_seen);

        let mut total = 0;
        for group in &groups {
            let members = group.to_vec();
            let expected: Vec<_> = values.iter().copied().filter(|v| v % 7 == *group.key()).collect();
            prop_assert_eq!(&members, &expected);
            prop_assert_eq!(group.to_vec(), members.clone());
            total += members.len();
        }
        prop_assert_eq!(total, values.len());
    }
}
