//! 惰性、可组合的序列管道。
//!
//! 序列由游标工厂描述，只有被拉取时才会驱动上游。操作是`Seq<A> -> Seq<B>`的纯变换，
//! 可以通过[`Seq::pipe`]或[`pipe!`]按顺序组合。
//!
//! ```
//! use seqpipe::{Seq, slice};
//!
//! let seq = seqpipe::pipe!(Seq::range(0, 100, 1), slice(10, Some(3)));
//! assert_eq!(seq.to_vec(), vec![10, 11, 12]);
//! assert_eq!(seq.count(), 3);
//! ```

mod cursor;
mod err;
mod input;
mod op;
mod pipe;
mod stream;

/// 整数类型
pub type Integer = i64;

pub use cursor::Cursor;
pub use err::{SeqErr, SeqRes};
pub use op::count::{count, count_by, try_count_by};
pub use op::group_by::{
    GroupByArg, GroupByCursor, GroupByOp, GroupedSeq, TryGroupByArg, TryGroupByOp, default_group_result, group_by,
    group_by_key, identity, try_group_by,
};
pub use op::grouping::{Grouping, create_grouping, try_create_grouping};
pub use op::slice::{SliceArg, SliceCursor, SliceOp, slice, slice_range};
pub use op::{FilterOp, InspectOp, MapOp, filter, inspect, map};
pub use pipe::{Operator, Seq, Sequence, compose};
pub use stream::{AsyncOperator, AsyncSeq, SliceStream};
