use std::fmt::{Debug, Formatter};
use std::iter::{Fuse, FusedIterator};

/// 游标，一次遍历的可变状态，由创建它的消费者独占。
///
/// 游标一旦返回`None`，后续每次推进都返回`None`。
pub struct Cursor<T> {
    iter: Fuse<Box<dyn Iterator<Item = T>>>,
}

impl<T> Iterator for Cursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<T> FusedIterator for Cursor<T> {}

impl<T> Debug for Cursor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor").finish_non_exhaustive()
    }
}

impl<T: 'static> Cursor<T> {
    pub fn new(iter: impl Iterator<Item = T> + 'static) -> Cursor<T> {
        let iter: Box<dyn Iterator<Item = T>> = Box::new(iter);
        Cursor { iter: iter.fuse() }
    }

    pub fn empty() -> Cursor<T> {
        Cursor::new(std::iter::empty())
    }

    pub(crate) fn op_map<U: 'static>(self, f: impl FnMut(T) -> U + 'static) -> Cursor<U> {
        Cursor::new(self.map(f))
    }

    pub(crate) fn op_filter(self, f: impl FnMut(&T) -> bool + 'static) -> Cursor<T> {
        Cursor::new(self.filter(f))
    }

    pub(crate) fn op_inspect(self, f: impl FnMut(&T) + 'static) -> Cursor<T> {
        Cursor::new(self.inspect(f))
    }
}
