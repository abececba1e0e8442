use crate::cursor::Cursor;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use tracing::trace;

/// 序列：能够反复产生新游标的能力。
///
/// 对可重启序列，每次调用`cursor`都得到一次独立的遍历；对单次序列（例如[`Seq::once`]），
/// 第二次及之后的遍历不产生任何元素，可通过`is_restartable`区分。
pub trait Sequence {
    type Item;

    fn cursor(&self) -> Cursor<Self::Item>;

    fn is_restartable(&self) -> bool {
        true
    }
}

/// 操作：`Seq<A> -> Seq<B>`的纯变换。
///
/// 应用操作只组装新的序列，不推进任何游标。
pub trait Operator<A, B> {
    fn apply(&self, source: Seq<A>) -> Seq<B>;
}

impl<A, B, F> Operator<A, B> for F
where
    F: Fn(Seq<A>) -> Seq<B>,
{
    fn apply(&self, source: Seq<A>) -> Seq<B> {
        self(source)
    }
}

/// 组合两个操作，先`first`后`second`。
pub fn compose<A, B, C>(first: impl Operator<A, B>, second: impl Operator<B, C>) -> impl Fn(Seq<A>) -> Seq<C> {
    move |source| second.apply(first.apply(source))
}

/// 依次对序列应用零个或多个操作：`pipe!(seq, op1, op2)`等价于`op2(op1(seq))`。
#[macro_export]
macro_rules! pipe {
    ($seq:expr $(,)?) => {
        $seq
    };
    ($seq:expr, $($op:expr),+ $(,)?) => {{
        let seq = $seq;
        $(
            let seq = $crate::Seq::pipe(seq, $op);
        )+
        seq
    }};
}

/// 序列包装器，持有游标工厂，是所有操作的管道目标。
pub struct Seq<T> {
    factory: Rc<dyn Fn() -> Cursor<T>>,
    restartable: bool,
}

impl<T> Clone for Seq<T> {
    fn clone(&self) -> Self {
        Seq { factory: self.factory.clone(), restartable: self.restartable }
    }
}

impl<T> Debug for Seq<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seq").field("restartable", &self.restartable).finish_non_exhaustive()
    }
}

impl<T: 'static> Seq<T> {
    /// 由游标工厂构造可重启序列，每次遍历都会重新调用工厂。
    pub fn from_fn<F, I>(factory: F) -> Seq<T>
    where
        F: Fn() -> I + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Seq { factory: Rc::new(move || Cursor::new(factory().into_iter())), restartable: true }
    }

    /// 包装单次使用的数据源，第二次遍历不产生元素。
    pub fn once<I>(source: I) -> Seq<T>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        let slot = RefCell::new(Some(source.into_iter()));
        Seq {
            factory: Rc::new(move || match slot.borrow_mut().take() {
                Some(iter) => Cursor::new(iter),
                None => Cursor::empty(),
            }),
            restartable: false,
        }
    }

    /// 包装任意实现了[`Sequence`]的值。
    pub fn from_sequence<S>(source: S) -> Seq<T>
    where
        S: Sequence<Item = T> + 'static,
    {
        let restartable = source.is_restartable();
        Seq { factory: Rc::new(move || source.cursor()), restartable }
    }

    pub fn empty() -> Seq<T> {
        Seq::from_fn(std::iter::empty)
    }

    /// 由操作派生的新序列，重启能力继承自上游。
    pub(crate) fn new_derived(restartable: bool, factory: impl Fn() -> Cursor<T> + 'static) -> Seq<T> {
        Seq { factory: Rc::new(factory), restartable }
    }

    pub(crate) fn from_shared(values: Rc<[T]>) -> Seq<T>
    where
        T: Clone,
    {
        Seq::from_fn(move || {
            let values = values.clone();
            (0..values.len()).map(move |i| values[i].clone())
        })
    }

    /// 产生一个新游标，这是唯一会触发上游工作的入口。
    pub fn cursor(&self) -> Cursor<T> {
        trace!(restartable = self.restartable, "new cursor");
        (self.factory)()
    }

    pub fn is_restartable(&self) -> bool {
        self.restartable
    }

    pub fn pipe<U, O>(self, op: O) -> Seq<U>
    where
        O: Operator<T, U>,
    {
        op.apply(self)
    }

    /// 依次应用同类型的操作列表，空列表时原样返回。
    pub fn pipe_all<I>(self, ops: I) -> Seq<T>
    where
        I: IntoIterator<Item = Box<dyn Operator<T, T>>>,
    {
        ops.into_iter().fold(self, |seq, op| op.apply(seq))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.cursor().collect()
    }
}

impl<T: Clone + 'static> Seq<T> {
    /// 包装内建集合，元素在每次遍历时克隆产出。
    pub fn from_vec(values: Vec<T>) -> Seq<T> {
        Seq::from_shared(values.into())
    }

    pub fn of(values: impl IntoIterator<Item = T>) -> Seq<T> {
        Seq::from_vec(values.into_iter().collect())
    }
}

impl<T: 'static> Sequence for Seq<T> {
    type Item = T;

    fn cursor(&self) -> Cursor<T> {
        Seq::cursor(self)
    }

    fn is_restartable(&self) -> bool {
        self.restartable
    }
}

impl<T: 'static> IntoIterator for &Seq<T> {
    type Item = T;
    type IntoIter = Cursor<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.cursor()
    }
}

/// 把已有游标包装为一次性序列，与[`Seq::once`]相同：第二次遍历不产生元素。
impl<T: 'static> From<Cursor<T>> for Seq<T> {
    fn from(cursor: Cursor<T>) -> Self {
        Seq::once(cursor)
    }
}

impl<T: Clone + 'static> From<Vec<T>> for Seq<T> {
    fn from(values: Vec<T>) -> Self {
        Seq::from_vec(values)
    }
}

impl<T: Clone + 'static> FromIterator<T> for Seq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Seq::of(iter)
    }
}
