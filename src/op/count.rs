use crate::err::{SeqErr, SeqRes};
use crate::pipe::{Seq, Sequence};
use tracing::{debug, warn};

/// 统计元素数量，会立即耗尽一个新游标。
pub fn count<S: Sequence>(source: &S) -> usize {
    let total = source.cursor().count();
    debug!(total, "count finished");
    total
}

/// 统计满足谓词的元素数量，谓词对每个元素按顺序恰好调用一次。
pub fn count_by<S, P>(source: &S, mut predicate: P) -> usize
where
    S: Sequence,
    P: FnMut(&S::Item) -> bool,
{
    let total = source.cursor().filter(|item| predicate(item)).count();
    debug!(total, "count_by finished");
    total
}

/// 使用可失败谓词统计，任一元素出错时整体失败，不返回部分结果。
pub fn try_count_by<S, P, E>(source: &S, mut predicate: P) -> SeqRes<usize>
where
    S: Sequence,
    P: FnMut(&S::Item) -> Result<bool, E>,
    E: ToString,
{
    let mut total = 0;
    for (index, item) in source.cursor().enumerate() {
        match predicate(&item) {
            Ok(true) => total += 1,
            Ok(false) => {}
            Err(err) => {
                let err = SeqErr::predicate("count", index, err);
                warn!(%err, "count aborted");
                return Err(err);
            }
        }
    }
    debug!(total, "try_count_by finished");
    Ok(total)
}

impl<T: 'static> Seq<T> {
    pub fn count(&self) -> usize {
        count(self)
    }

    pub fn count_by(&self, predicate: impl FnMut(&T) -> bool) -> usize {
        count_by(self, predicate)
    }

    pub fn try_count_by<E: ToString>(&self, predicate: impl FnMut(&T) -> Result<bool, E>) -> SeqRes<usize> {
        try_count_by(self, predicate)
    }
}
