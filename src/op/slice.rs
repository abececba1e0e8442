use crate::cursor::Cursor;
use crate::pipe::{Operator, Seq};
use crate::stream::{AsyncOperator, AsyncSeq};
use std::ops::{Bound, RangeBounds};
use tracing::trace;

/// 切片参数：先跳过`begin`个元素，再保留至多`take`个元素。
///
/// `take`为`None`时保留剩余全部元素。
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SliceArg {
    pub begin: usize,
    pub take: Option<usize>,
}

impl SliceArg {
    pub fn new(begin: usize, take: Option<usize>) -> SliceArg {
        SliceArg { begin, take }
    }

    /// 按照索引范围`[start, end)`构造，起始值大于结束值时视为空范围。
    pub fn from_range(range: impl RangeBounds<usize>) -> SliceArg {
        let begin = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => Some(end.saturating_add(1)),
            Bound::Excluded(&end) => Some(end),
            Bound::Unbounded => None,
        };
        SliceArg { begin, take: end.map(|end| end.saturating_sub(begin)) }
    }

    /// 最多从上游读取的元素数量。
    pub fn max_drawn(&self) -> Option<usize> {
        self.take.map(|take| self.begin.saturating_add(take))
    }
}

/// 切片游标。
///
/// 跳过阶段逐个丢弃元素；保留阶段在产出第`take`个元素后立即结束，不再读取上游。
#[derive(Debug)]
pub struct SliceCursor<T> {
    source: Cursor<T>,
    skip: usize,
    take: Option<usize>,
    window: SliceArg,
}

impl<T> SliceCursor<T> {
    pub fn new(source: Cursor<T>, arg: SliceArg) -> SliceCursor<T> {
        SliceCursor { source, skip: arg.begin, take: arg.take, window: arg }
    }

    fn finish(&mut self) {
        self.skip = 0;
        self.take = Some(0);
    }
}

impl<T> Iterator for SliceCursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.skip > 0 {
            self.skip -= 1;
            if self.source.next().is_none() {
                self.finish();
                return None;
            }
        }
        match self.take {
            Some(0) => None,
            Some(remaining) => match self.source.next() {
                Some(item) => {
                    self.take = Some(remaining - 1);
                    if remaining == 1 {
                        trace!(max_drawn = ?self.window.max_drawn(), "slice window reached, stop drawing");
                    }
                    Some(item)
                }
                None => {
                    self.finish();
                    None
                }
            },
            None => self.source.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.source.size_hint();
        let lower = lower.saturating_sub(self.skip);
        let upper = upper.map(|upper| upper.saturating_sub(self.skip));
        match self.take {
            Some(take) => (lower.min(take), Some(upper.map_or(take, |upper| upper.min(take)))),
            None => (lower, upper),
        }
    }
}

/// 切片操作，同时适用于同步和异步序列。可重启性继承自上游。
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SliceOp {
    arg: SliceArg,
}

/// 跳过`begin`个元素后保留至多`take`个元素。
///
/// ```
/// use seqpipe::{Seq, slice};
///
/// let seq = Seq::of([1, 2, 3, 4]).pipe(slice(1, Some(2)));
/// assert_eq!(seq.to_vec(), vec![2, 3]);
/// ```
pub fn slice(begin: usize, take: Option<usize>) -> SliceOp {
    SliceOp { arg: SliceArg::new(begin, take) }
}

/// 按索引范围切片：`slice_range(1..3)`产出索引1和2的元素。
pub fn slice_range(range: impl RangeBounds<usize>) -> SliceOp {
    SliceOp { arg: SliceArg::from_range(range) }
}

impl SliceOp {
    pub fn arg(&self) -> SliceArg {
        self.arg
    }
}

impl<T: 'static> Operator<T, T> for SliceOp {
    fn apply(&self, source: Seq<T>) -> Seq<T> {
        let arg = self.arg;
        let restartable = source.is_restartable();
        Seq::new_derived(restartable, move || Cursor::new(SliceCursor::new(source.cursor(), arg)))
    }
}

impl<T: 'static> AsyncOperator<T, T> for SliceOp {
    fn apply(&self, source: AsyncSeq<T>) -> AsyncSeq<T> {
        source.slice_with(self.arg)
    }
}

impl<T: 'static> Seq<T> {
    pub fn slice(self, begin: usize, take: Option<usize>) -> Seq<T> {
        self.pipe(slice(begin, take))
    }

    pub fn slice_range(self, range: impl RangeBounds<usize>) -> Seq<T> {
        self.pipe(slice_range(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// 记录被读取次数的数据源
    fn counted(len: usize, drawn: Rc<Cell<usize>>) -> Seq<usize> {
        Seq::from_fn(move || {
            let drawn = drawn.clone();
            (0..len).inspect(move |_| drawn.set(drawn.get() + 1))
        })
    }

    #[test]
    fn test_slice_at_zero_with_one_item() {
        let mut it = Seq::of([1, 2, 3, 4]).pipe(slice(0, Some(1))).cursor();
        assert_eq!(it.next(), Some(1));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_slice_at_one_with_one_item() {
        let mut it = Seq::of([1, 2, 3, 4]).pipe(slice(1, Some(1))).cursor();
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_slice_at_one_with_multiple_items() {
        assert_eq!(Seq::of([1, 2, 3, 4]).slice(1, Some(2)).to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_slice_without_take() {
        assert_eq!(Seq::of([1, 2, 3, 4]).slice(1, None).to_vec(), vec![2, 3, 4]);
        assert_eq!(Seq::of([1, 2, 3, 4]).slice(0, None).to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_slice_short_source() {
        assert_eq!(Seq::of([1, 2]).slice(5, Some(2)).to_vec(), Vec::<i32>::new());
        assert_eq!(Seq::of([1, 2, 3]).slice(1, Some(10)).to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_zero_take_still_skips() {
        let drawn = Rc::new(Cell::new(0));
        let seq = counted(10, drawn.clone()).slice(3, Some(0));
        assert_eq!(seq.to_vec(), Vec::<usize>::new());
        assert_eq!(drawn.get(), 3);
    }

    #[test]
    fn test_stops_at_window_end() {
        let drawn = Rc::new(Cell::new(0));
        let seq = counted(100, drawn.clone()).slice(2, Some(3));
        let mut it = seq.cursor();
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next(), Some(3));
        assert_eq!(it.next(), Some(4));
        assert_eq!(drawn.get(), 5);
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
        assert_eq!(drawn.get(), 5);
    }

    #[test]
    fn test_cursor_keeps_window() {
        let mut it = SliceCursor::new(Seq::of([1, 2, 3, 4]).cursor(), SliceArg::new(1, Some(2)));
        assert_eq!(it.by_ref().collect::<Vec<_>>(), vec![2, 3]);
        let debug = format!("{it:?}");
        assert!(debug.contains("window: SliceArg { begin: 1, take: Some(2) }"), "{debug}");
        assert_eq!(it.window.max_drawn(), Some(3));
    }

    #[test]
    fn test_infinite_source() {
        let seq = Seq::from_fn(|| 0..).slice(5, Some(3));
        assert_eq!(seq.to_vec(), vec![5, 6, 7]);
    }

    #[test]
    fn test_reiterate_reruns_skip() {
        let drawn = Rc::new(Cell::new(0));
        let seq = counted(6, drawn.clone()).slice(1, Some(2));
        assert_eq!(seq.to_vec(), vec![1, 2]);
        assert_eq!(seq.to_vec(), vec![1, 2]);
        assert_eq!(drawn.get(), 6);
        assert!(seq.is_restartable());
    }

    #[test]
    fn test_single_use_source() {
        let seq = Seq::once(vec![1, 2, 3]).slice(1, None);
        assert!(!seq.is_restartable());
        assert_eq!(seq.to_vec(), vec![2, 3]);
        assert_eq!(seq.to_vec(), Vec::<i32>::new());
    }

    #[test]
    fn test_slice_range() {
        let seq = Seq::of([1, 2, 3, 4, 5]);
        assert_eq!(seq.clone().slice_range(1..3).to_vec(), vec![2, 3]);
        assert_eq!(seq.clone().slice_range(1..=3).to_vec(), vec![2, 3, 4]);
        assert_eq!(seq.clone().slice_range(..2).to_vec(), vec![1, 2]);
        assert_eq!(seq.clone().slice_range(3..).to_vec(), vec![4, 5]);
        assert_eq!(seq.clone().slice_range(2..2).to_vec(), Vec::<i32>::new());
    }

    #[allow(clippy::reversed_empty_ranges)]
    #[test]
    fn test_slice_range_inverted_is_empty() {
        let drawn = Rc::new(Cell::new(0));
        let seq = counted(10, drawn.clone()).slice_range(4..1);
        assert_eq!(seq.to_vec(), Vec::<usize>::new());
        assert_eq!(drawn.get(), 4);
    }

    #[test]
    fn test_slice_arg() {
        assert_eq!(SliceArg::from_range(2..5), SliceArg::new(2, Some(3)));
        assert_eq!(SliceArg::from_range(2..), SliceArg::new(2, None));
        assert_eq!(SliceArg::new(2, Some(3)).max_drawn(), Some(5));
        assert_eq!(SliceArg::new(2, None).max_drawn(), None);
        assert_eq!(slice_range(0..1).arg(), SliceArg::new(0, Some(1)));
    }

    #[test]
    fn test_size_hint() {
        let it = Seq::of([1, 2, 3, 4]).slice(1, Some(2)).cursor();
        assert_eq!(it.size_hint(), (2, Some(2)));
    }
}
