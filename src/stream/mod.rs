//! 异步序列。
//!
//! 与同步序列遵循同一契约：每次推进返回一个可等待的值，消费者等待其完成后才会再次推进，
//! 任何操作都不会对同一上游发起并发推进。消费者推进得慢，生产者就随之变慢，
//! 除操作自身算法需要的缓冲外（切片无缓冲，分组为O(n)）不做额外缓冲。

use crate::op::group_by::{GroupByArg, GroupedSeq};
use crate::op::grouping::Grouping;
use crate::op::slice::SliceArg;
use crate::pipe::Seq;
use futures::future;
use futures::ready;
use futures::stream::{self, LocalBoxStream, Stream, StreamExt};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::ops::RangeBounds;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use tracing::{debug, trace};

/// 异步操作：`AsyncSeq<A> -> AsyncSeq<B>`的纯变换。
pub trait AsyncOperator<A, B> {
    fn apply(&self, source: AsyncSeq<A>) -> AsyncSeq<B>;
}

impl<A, B, F> AsyncOperator<A, B> for F
where
    F: Fn(AsyncSeq<A>) -> AsyncSeq<B>,
{
    fn apply(&self, source: AsyncSeq<A>) -> AsyncSeq<B> {
        self(source)
    }
}

/// 异步序列包装器，持有流工厂。
pub struct AsyncSeq<T> {
    factory: Rc<dyn Fn() -> LocalBoxStream<'static, T>>,
    restartable: bool,
}

impl<T> Clone for AsyncSeq<T> {
    fn clone(&self) -> Self {
        AsyncSeq { factory: self.factory.clone(), restartable: self.restartable }
    }
}

impl<T> Debug for AsyncSeq<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSeq").field("restartable", &self.restartable).finish_non_exhaustive()
    }
}

impl<T: 'static> AsyncSeq<T> {
    pub fn from_fn<F, S>(factory: F) -> AsyncSeq<T>
    where
        F: Fn() -> S + 'static,
        S: Stream<Item = T> + 'static,
    {
        AsyncSeq { factory: Rc::new(move || factory().fuse().boxed_local()), restartable: true }
    }

    /// 包装单次使用的流，第二次遍历不产生元素。
    pub fn from_stream<S>(source: S) -> AsyncSeq<T>
    where
        S: Stream<Item = T> + 'static,
    {
        let slot = RefCell::new(Some(source));
        AsyncSeq {
            factory: Rc::new(move || match slot.borrow_mut().take() {
                Some(source) => source.fuse().boxed_local(),
                None => stream::empty().boxed_local(),
            }),
            restartable: false,
        }
    }

    /// 由可克隆的迭代器构造，每次遍历克隆一份。
    pub fn from_iter<I>(source: I) -> AsyncSeq<T>
    where
        I: IntoIterator<Item = T> + Clone + 'static,
    {
        AsyncSeq::from_fn(move || stream::iter(source.clone()))
    }

    /// 由同步序列构造，每次遍历使用同步序列的新游标。
    pub fn from_seq(seq: Seq<T>) -> AsyncSeq<T> {
        let restartable = seq.is_restartable();
        AsyncSeq::new_derived(restartable, move || stream::iter(seq.cursor()).boxed_local())
    }

    pub(crate) fn new_derived(
        restartable: bool, factory: impl Fn() -> LocalBoxStream<'static, T> + 'static,
    ) -> AsyncSeq<T> {
        AsyncSeq { factory: Rc::new(factory), restartable }
    }

    /// 产生一个新的流，是唯一会触发上游工作的入口。
    pub fn stream(&self) -> LocalBoxStream<'static, T> {
        trace!(restartable = self.restartable, "new async cursor");
        (self.factory)()
    }

    pub fn is_restartable(&self) -> bool {
        self.restartable
    }

    pub fn pipe<U, O>(self, op: O) -> AsyncSeq<U>
    where
        O: AsyncOperator<T, U>,
    {
        op.apply(self)
    }

    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> AsyncSeq<U> {
        let f = Rc::new(f);
        let restartable = self.restartable;
        AsyncSeq::new_derived(restartable, move || {
            let f = f.clone();
            self.stream().map(move |item| f(item)).boxed_local()
        })
    }

    pub fn filter(self, f: impl Fn(&T) -> bool + 'static) -> AsyncSeq<T> {
        let f = Rc::new(f);
        let restartable = self.restartable;
        AsyncSeq::new_derived(restartable, move || {
            let f = f.clone();
            self.stream().filter(move |item| future::ready(f(item))).boxed_local()
        })
    }

    pub fn slice(self, begin: usize, take: Option<usize>) -> AsyncSeq<T> {
        self.slice_with(SliceArg::new(begin, take))
    }

    pub fn slice_range(self, range: impl RangeBounds<usize>) -> AsyncSeq<T> {
        self.slice_with(SliceArg::from_range(range))
    }

    pub(crate) fn slice_with(self, arg: SliceArg) -> AsyncSeq<T> {
        let restartable = self.restartable;
        AsyncSeq::new_derived(restartable, move || SliceStream::new(self.stream(), arg).boxed_local())
    }

    /// 按键分组，产出[`GroupedSeq`]。首次拉取时完整耗尽上游。
    pub fn group_by<K>(self, key: impl Fn(&T) -> K + 'static) -> AsyncSeq<GroupedSeq<K, T>>
    where
        K: Eq + Hash + Clone + 'static,
        T: Clone,
    {
        self.group_by_with(GroupByArg::new(key))
    }

    pub fn group_by_with<K, V, R>(self, arg: GroupByArg<T, K, V, R>) -> AsyncSeq<R>
    where
        K: Eq + Hash + Clone + 'static,
        V: Clone + 'static,
        R: 'static,
    {
        let restartable = self.restartable;
        AsyncSeq::new_derived(restartable, move || {
            let arg = arg.clone();
            let mut source = self.stream();
            stream::once(async move {
                let mut grouping = Grouping::new();
                while let Some(item) = source.next().await {
                    let key = (arg.key)(&item);
                    let value = (arg.element)(item);
                    grouping.push(key, value);
                }
                debug!(groups = grouping.len(), values = grouping.value_count(), "async group_by grouping built");
                (grouping, arg.result)
            })
            .flat_map(|(grouping, result)| {
                stream::iter(grouping.into_iter().map(move |(key, values)| result(key, Seq::from_shared(values.into()))))
            })
            .boxed_local()
        })
    }

    /// 统计元素数量，耗尽一个新流。
    pub async fn count(&self) -> usize {
        let total = self.stream().fold(0usize, |total, _| future::ready(total + 1)).await;
        debug!(total, "async count finished");
        total
    }

    /// 统计满足谓词的元素数量，谓词对每个元素按顺序恰好调用一次。
    pub async fn count_by(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let mut source = self.stream();
        let mut total = 0;
        while let Some(item) = source.next().await {
            if predicate(&item) {
                total += 1;
            }
        }
        debug!(total, "async count_by finished");
        total
    }

    pub async fn to_vec(&self) -> Vec<T> {
        self.stream().collect().await
    }
}

impl<T: Clone + 'static> AsyncSeq<T> {
    pub fn from_vec(values: Vec<T>) -> AsyncSeq<T> {
        AsyncSeq::from_seq(Seq::from_vec(values))
    }
}

impl<T: 'static> From<Seq<T>> for AsyncSeq<T> {
    fn from(seq: Seq<T>) -> Self {
        AsyncSeq::from_seq(seq)
    }
}

/// 异步切片，状态在每次`Pending`之间保留。
pub struct SliceStream<T> {
    source: LocalBoxStream<'static, T>,
    skip: usize,
    take: Option<usize>,
    window: SliceArg,
}

impl<T> SliceStream<T> {
    pub fn new(source: LocalBoxStream<'static, T>, arg: SliceArg) -> SliceStream<T> {
        SliceStream { source, skip: arg.begin, take: arg.take, window: arg }
    }

    fn finish(&mut self) {
        self.skip = 0;
        self.take = Some(0);
    }
}

impl<T> Stream for SliceStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        while this.skip > 0 {
            match ready!(this.source.poll_next_unpin(cx)) {
                Some(_) => this.skip -= 1,
                None => {
                    this.finish();
                    return Poll::Ready(None);
                }
            }
        }
        match this.take {
            Some(0) => Poll::Ready(None),
            Some(remaining) => match ready!(this.source.poll_next_unpin(cx)) {
                Some(item) => {
                    this.take = Some(remaining - 1);
                    if remaining == 1 {
                        trace!(max_drawn = ?this.window.max_drawn(), "async slice window reached, stop polling");
                    }
                    Poll::Ready(Some(item))
                }
                None => {
                    this.finish();
                    Poll::Ready(None)
                }
            },
            None => this.source.poll_next_unpin(cx),
        }
    }
}
