//! 分组操作。
//!
//! 外层序列是惰性的：直到消费者请求第一个分组时才开始工作。但一旦开始，就会完整耗尽上游，
//! 因为在上游结束之前无法知道一个键的全部成员，所以分组不能被窗口化或提前终止。
//!
//! 每个分组内部的序列由已经物化的值列表支撑，可以重复遍历；外层序列能否重复遍历取决于上游。

use crate::cursor::Cursor;
use crate::err::SeqRes;
use crate::op::grouping::{create_grouping, try_create_grouping};
use crate::pipe::{Operator, Seq, Sequence};
use crate::stream::{AsyncOperator, AsyncSeq};
use itertools::Itertools;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::mem;
use std::rc::Rc;
use tracing::debug;

/// 恒等函数，元素选择器的默认值。
pub fn identity<T>(value: T) -> T {
    value
}

/// 结果选择器的默认值，构造[`GroupedSeq`]。
pub fn default_group_result<K, V>(key: K, values: Seq<V>) -> GroupedSeq<K, V> {
    GroupedSeq::new(key, values)
}

/// 分组后的子序列，持有不可变的键。
#[derive(Clone)]
pub struct GroupedSeq<K, V> {
    key: K,
    seq: Seq<V>,
}

impl<K, V> GroupedSeq<K, V> {
    pub fn new(key: K, seq: Seq<V>) -> GroupedSeq<K, V> {
        GroupedSeq { key, seq }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn seq(&self) -> &Seq<V> {
        &self.seq
    }

    pub fn into_parts(self) -> (K, Seq<V>) {
        (self.key, self.seq)
    }
}

impl<K, V: 'static> GroupedSeq<K, V> {
    pub fn cursor(&self) -> Cursor<V> {
        self.seq.cursor()
    }

    pub fn to_vec(&self) -> Vec<V> {
        self.seq.to_vec()
    }

    pub fn pipe<U, O: Operator<V, U>>(&self, op: O) -> Seq<U> {
        self.seq.clone().pipe(op)
    }
}

impl<K, V: 'static> Sequence for GroupedSeq<K, V> {
    type Item = V;

    fn cursor(&self) -> Cursor<V> {
        self.seq.cursor()
    }

    fn is_restartable(&self) -> bool {
        self.seq.is_restartable()
    }
}

impl<K, V: 'static> IntoIterator for &GroupedSeq<K, V> {
    type Item = V;
    type IntoIter = Cursor<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.seq.cursor()
    }
}

impl<K, V: 'static> From<GroupedSeq<K, V>> for Seq<V> {
    fn from(group: GroupedSeq<K, V>) -> Self {
        group.seq
    }
}

impl<K: Debug, V: Debug + 'static> Debug for GroupedSeq<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.seq.is_restartable() {
            write!(f, "{:?} => [{}]", self.key, self.seq.cursor().map(|v| format!("{v:?}")).join(", "))
        } else {
            write!(f, "{:?} => [..]", self.key)
        }
    }
}

/// 分组参数：键选择器、元素选择器、结果选择器。
///
/// 未指定的选择器取[`identity`]和[`default_group_result`]。
pub struct GroupByArg<T, K, V, R> {
    pub(crate) key: Rc<dyn Fn(&T) -> K>,
    pub(crate) element: Rc<dyn Fn(T) -> V>,
    pub(crate) result: Rc<dyn Fn(K, Seq<V>) -> R>,
}

impl<T, K, V, R> Clone for GroupByArg<T, K, V, R> {
    fn clone(&self) -> Self {
        GroupByArg { key: self.key.clone(), element: self.element.clone(), result: self.result.clone() }
    }
}

impl<T: 'static, K: 'static> GroupByArg<T, K, T, GroupedSeq<K, T>> {
    pub fn new(key: impl Fn(&T) -> K + 'static) -> Self {
        GroupByArg { key: Rc::new(key), element: Rc::new(identity::<T>), result: Rc::new(default_group_result::<K, T>) }
    }
}

impl<T: 'static, K: 'static, V> GroupByArg<T, K, V, GroupedSeq<K, V>> {
    /// 指定元素选择器，需要在结果选择器之前指定。
    pub fn element<U: 'static>(self, element: impl Fn(T) -> U + 'static) -> GroupByArg<T, K, U, GroupedSeq<K, U>> {
        GroupByArg { key: self.key, element: Rc::new(element), result: Rc::new(default_group_result::<K, U>) }
    }
}

impl<T, K, V, R> GroupByArg<T, K, V, R> {
    pub fn result<U>(self, result: impl Fn(K, Seq<V>) -> U + 'static) -> GroupByArg<T, K, V, U> {
        GroupByArg { key: self.key, element: self.element, result: Rc::new(result) }
    }
}

enum GroupByState<T, K, V> {
    Pending(Cursor<T>),
    Yielding(std::vec::IntoIter<(K, Vec<V>)>),
    Done,
}

/// 分组游标，首次推进时完整构建分组表，之后按键的首次出现顺序逐个产出结果。
pub struct GroupByCursor<T, K, V, R> {
    state: GroupByState<T, K, V>,
    arg: GroupByArg<T, K, V, R>,
}

impl<T, K, V, R> GroupByCursor<T, K, V, R> {
    pub fn new(source: Cursor<T>, arg: GroupByArg<T, K, V, R>) -> Self {
        GroupByCursor { state: GroupByState::Pending(source), arg }
    }
}

impl<T, K, V, R> Iterator for GroupByCursor<T, K, V, R>
where
    K: Eq + Hash + Clone,
    V: Clone + 'static,
{
    type Item = R;

    fn next(&mut self) -> Option<Self::Item> {
        // 先置为Done，选择器panic后游标不会再从半消费的上游继续
        if matches!(self.state, GroupByState::Pending(_)) {
            if let GroupByState::Pending(source) = mem::replace(&mut self.state, GroupByState::Done) {
                let (key, element) = (&self.arg.key, &self.arg.element);
                let grouping = create_grouping(source, |item| key(item), |item| element(item));
                debug!(groups = grouping.len(), values = grouping.value_count(), "group_by grouping built");
                self.state = GroupByState::Yielding(grouping.into_iter());
            }
        }
        match &mut self.state {
            GroupByState::Yielding(groups) => match groups.next() {
                Some((key, values)) => Some((self.arg.result)(key, Seq::from_shared(values.into()))),
                None => {
                    self.state = GroupByState::Done;
                    None
                }
            },
            _ => None,
        }
    }
}

impl<T, K, V, R> Debug for GroupByCursor<T, K, V, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            GroupByState::Pending(_) => "pending",
            GroupByState::Yielding(_) => "yielding",
            GroupByState::Done => "done",
        };
        f.debug_struct("GroupByCursor").field("state", &state).finish_non_exhaustive()
    }
}

/// 分组操作，同时适用于同步和异步序列。
pub struct GroupByOp<T, K, V, R> {
    arg: GroupByArg<T, K, V, R>,
}

impl<T, K, V, R> Clone for GroupByOp<T, K, V, R> {
    fn clone(&self) -> Self {
        GroupByOp { arg: self.arg.clone() }
    }
}

/// 按照参数分组。
///
/// ```
/// use seqpipe::{GroupByArg, Seq, group_by};
///
/// let groups = Seq::of([1, 2, 3, 4]).pipe(group_by(GroupByArg::new(|x: &i32| x % 2).element(|x| x * 10)));
/// let groups: Vec<_> = groups.cursor().map(|g| (*g.key(), g.to_vec())).collect();
/// assert_eq!(groups, vec![(1, vec![10, 30]), (0, vec![20, 40])]);
/// ```
pub fn group_by<T, K, V, R>(arg: GroupByArg<T, K, V, R>) -> GroupByOp<T, K, V, R> {
    GroupByOp { arg }
}

/// 只指定键选择器的分组，产出[`GroupedSeq`]。
pub fn group_by_key<T: 'static, K: 'static>(key: impl Fn(&T) -> K + 'static) -> GroupByOp<T, K, T, GroupedSeq<K, T>> {
    group_by(GroupByArg::new(key))
}

impl<T, K, V, R> Operator<T, R> for GroupByOp<T, K, V, R>
where
    T: 'static,
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
    R: 'static,
{
    fn apply(&self, source: Seq<T>) -> Seq<R> {
        let arg = self.arg.clone();
        let restartable = source.is_restartable();
        Seq::new_derived(restartable, move || Cursor::new(GroupByCursor::new(source.cursor(), arg.clone())))
    }
}

impl<T, K, V, R> AsyncOperator<T, R> for GroupByOp<T, K, V, R>
where
    T: 'static,
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
    R: 'static,
{
    fn apply(&self, source: AsyncSeq<T>) -> AsyncSeq<R> {
        source.group_by_with(self.arg.clone())
    }
}

/// 可失败的分组参数，选择器返回`Result`。
pub struct TryGroupByArg<T, K, V, R> {
    key: Rc<dyn Fn(&T) -> Result<K, String>>,
    element: Rc<dyn Fn(T) -> Result<V, String>>,
    result: Rc<dyn Fn(K, Seq<V>) -> R>,
}

impl<T, K, V, R> Clone for TryGroupByArg<T, K, V, R> {
    fn clone(&self) -> Self {
        TryGroupByArg { key: self.key.clone(), element: self.element.clone(), result: self.result.clone() }
    }
}

impl<T: 'static, K: 'static> TryGroupByArg<T, K, T, GroupedSeq<K, T>> {
    pub fn new<E: ToString>(key: impl Fn(&T) -> Result<K, E> + 'static) -> Self {
        TryGroupByArg {
            key: Rc::new(move |item: &T| key(item).map_err(|err| err.to_string())),
            element: Rc::new(Ok::<T, String>),
            result: Rc::new(default_group_result::<K, T>),
        }
    }
}

impl<T: 'static, K: 'static, V> TryGroupByArg<T, K, V, GroupedSeq<K, V>> {
    pub fn element<U: 'static, E: ToString>(
        self, element: impl Fn(T) -> Result<U, E> + 'static,
    ) -> TryGroupByArg<T, K, U, GroupedSeq<K, U>> {
        TryGroupByArg {
            key: self.key,
            element: Rc::new(move |item: T| element(item).map_err(|err| err.to_string())),
            result: Rc::new(default_group_result::<K, U>),
        }
    }
}

impl<T, K, V, R> TryGroupByArg<T, K, V, R> {
    pub fn result<U>(self, result: impl Fn(K, Seq<V>) -> U + 'static) -> TryGroupByArg<T, K, V, U> {
        TryGroupByArg { key: self.key, element: self.element, result: Rc::new(result) }
    }
}

/// 可失败分组游标：构建分组表时出错，则只产出一次错误后结束，不产出任何分组。
pub struct TryGroupByCursor<T, K, V, R> {
    state: GroupByState<T, K, V>,
    arg: TryGroupByArg<T, K, V, R>,
}

impl<T, K, V, R> Iterator for TryGroupByCursor<T, K, V, R>
where
    K: Eq + Hash + Clone,
    V: Clone + 'static,
{
    type Item = SeqRes<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, GroupByState::Pending(_)) {
            if let GroupByState::Pending(source) = mem::replace(&mut self.state, GroupByState::Done) {
                let (key, element) = (&self.arg.key, &self.arg.element);
                match try_create_grouping(source, |item| key(item), |item| element(item)) {
                    Ok(grouping) => {
                        debug!(groups = grouping.len(), values = grouping.value_count(), "try_group_by grouping built");
                        self.state = GroupByState::Yielding(grouping.into_iter());
                    }
                    Err(err) => return Some(Err(err)),
                }
            }
        }
        match &mut self.state {
            GroupByState::Yielding(groups) => match groups.next() {
                Some((key, values)) => Some(Ok((self.arg.result)(key, Seq::from_shared(values.into())))),
                None => {
                    self.state = GroupByState::Done;
                    None
                }
            },
            _ => None,
        }
    }
}

pub struct TryGroupByOp<T, K, V, R> {
    arg: TryGroupByArg<T, K, V, R>,
}

pub fn try_group_by<T, K, V, R>(arg: TryGroupByArg<T, K, V, R>) -> TryGroupByOp<T, K, V, R> {
    TryGroupByOp { arg }
}

impl<T, K, V, R> Operator<T, SeqRes<R>> for TryGroupByOp<T, K, V, R>
where
    T: 'static,
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
    R: 'static,
{
    fn apply(&self, source: Seq<T>) -> Seq<SeqRes<R>> {
        let arg = self.arg.clone();
        let restartable = source.is_restartable();
        Seq::new_derived(restartable, move || {
            Cursor::new(TryGroupByCursor { state: GroupByState::Pending(source.cursor()), arg: arg.clone() })
        })
    }
}

impl<T: 'static> Seq<T> {
    /// 按键分组，产出[`GroupedSeq`]。
    pub fn group_by<K>(self, key: impl Fn(&T) -> K + 'static) -> Seq<GroupedSeq<K, T>>
    where
        K: Eq + Hash + Clone + 'static,
        T: Clone,
    {
        self.pipe(group_by_key(key))
    }

    pub fn group_by_with<K, V, R>(self, arg: GroupByArg<T, K, V, R>) -> Seq<R>
    where
        K: Eq + Hash + Clone + 'static,
        V: Clone + 'static,
        R: 'static,
    {
        self.pipe(group_by(arg))
    }

    pub fn try_group_by<K, V, R>(self, arg: TryGroupByArg<T, K, V, R>) -> Seq<SeqRes<R>>
    where
        K: Eq + Hash + Clone + 'static,
        V: Clone + 'static,
        R: 'static,
    {
        self.pipe(try_group_by(arg))
    }
}
