use thiserror::Error;

/// 序列操作的统一结果类型
pub type SeqRes<T> = Result<T, SeqErr>;

#[derive(Error, Debug, Eq, PartialEq, Clone)]
pub enum SeqErr {
    #[error("[Predicate] Predicate of op `{op}` failed at element `{index}`, error: {err}")]
    Predicate { op: &'static str, index: usize, err: String },

    #[error("[Selector] Selector `{selector}` of op `{op}` failed at element `{index}`, error: {err}")]
    Selector { op: &'static str, selector: &'static str, index: usize, err: String },

    #[error("[Input] Open input file `{file}` error: {err}")]
    OpenFileErr { file: String, err: String },

    #[error("[Input] Read line `{line_no}` of input file `{file}` error: {err}")]
    ReadFromFileErr { file: String, line_no: usize, err: String },

    #[error("[Resource] Acquire resource error: {err}")]
    Resource { err: String },
}

impl SeqErr {
    pub(crate) fn predicate(op: &'static str, index: usize, err: impl ToString) -> SeqErr {
        SeqErr::Predicate { op, index, err: err.to_string() }
    }

    pub(crate) fn selector(op: &'static str, selector: &'static str, index: usize, err: impl ToString) -> SeqErr {
        SeqErr::Selector { op, selector, index, err: err.to_string() }
    }

    /// 出错的元素索引，读取文件出错时为行号。
    pub fn index(&self) -> Option<usize> {
        match self {
            SeqErr::Predicate { index, .. } | SeqErr::Selector { index, .. } => Some(*index),
            SeqErr::ReadFromFileErr { line_no, .. } => Some(*line_no),
            SeqErr::OpenFileErr { .. } | SeqErr::Resource { .. } => None,
        }
    }

    /// 出错的操作名。
    pub fn op(&self) -> Option<&'static str> {
        match self {
            SeqErr::Predicate { op, .. } | SeqErr::Selector { op, .. } => Some(op),
            _ => None,
        }
    }
}
