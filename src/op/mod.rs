pub(crate) mod count;
pub(crate) mod group_by;
pub(crate) mod grouping;
pub(crate) mod slice;

use crate::pipe::{Operator, Seq};
use std::rc::Rc;

/// 映射操作
pub struct MapOp<F> {
    f: Rc<F>,
}

/// 过滤操作
pub struct FilterOp<F> {
    f: Rc<F>,
}

/// 访问操作，不改变元素。
pub struct InspectOp<F> {
    f: Rc<F>,
}

pub fn map<F>(f: F) -> MapOp<F> {
    MapOp { f: Rc::new(f) }
}

pub fn filter<F>(f: F) -> FilterOp<F> {
    FilterOp { f: Rc::new(f) }
}

pub fn inspect<F>(f: F) -> InspectOp<F> {
    InspectOp { f: Rc::new(f) }
}

impl<T, U, F> Operator<T, U> for MapOp<F>
where
    T: 'static,
    U: 'static,
    F: Fn(T) -> U + 'static,
{
    fn apply(&self, source: Seq<T>) -> Seq<U> {
        let f = self.f.clone();
        let restartable = source.is_restartable();
        Seq::new_derived(restartable, move || {
            let f = f.clone();
            source.cursor().op_map(move |item| f(item))
        })
    }
}

impl<T, F> Operator<T, T> for FilterOp<F>
where
    T: 'static,
    F: Fn(&T) -> bool + 'static,
{
    fn apply(&self, source: Seq<T>) -> Seq<T> {
        let f = self.f.clone();
        let restartable = source.is_restartable();
        Seq::new_derived(restartable, move || {
            let f = f.clone();
            source.cursor().op_filter(move |item| f(item))
        })
    }
}

impl<T, F> Operator<T, T> for InspectOp<F>
where
    T: 'static,
    F: Fn(&T) + 'static,
{
    fn apply(&self, source: Seq<T>) -> Seq<T> {
        let f = self.f.clone();
        let restartable = source.is_restartable();
        Seq::new_derived(restartable, move || {
            let f = f.clone();
            source.cursor().op_inspect(move |item| f(item))
        })
    }
}

impl<T: 'static> Seq<T> {
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Seq<U> {
        self.pipe(map(f))
    }

    pub fn filter(self, f: impl Fn(&T) -> bool + 'static) -> Seq<T> {
        self.pipe(filter(f))
    }

    pub fn inspect(self, f: impl Fn(&T) + 'static) -> Seq<T> {
        self.pipe(inspect(f))
    }
}
