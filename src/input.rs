use crate::Integer;
use crate::cursor::Cursor;
use crate::err::{SeqErr, SeqRes};
use crate::pipe::Seq;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{trace, warn};

impl Seq<Integer> {
    /// 生成指定范围内的整数，起止值均包含。
    ///
    /// 步长为正值时正序生成，为负值时逆序生成；范围为空（起始值大于结束值）时无数据生成。
    pub fn range(start: Integer, end: Integer, step: Integer) -> Seq<Integer> {
        Seq::from_fn(move || range_to_iter(start, end, step))
    }
}

impl<T: Clone + 'static> Seq<T> {
    /// 重复给定值，`count`未指定时无限重复。
    pub fn repeat(value: T, count: Option<usize>) -> Seq<T> {
        match count {
            Some(count) => Seq::from_fn(move || std::iter::repeat_n(value.clone(), count)),
            None => Seq::from_fn(move || std::iter::repeat(value.clone())),
        }
    }
}

impl Seq<String> {
    /// 按行拆分文本，末尾换行符之后视为一个空行。
    pub fn text_lines(text: impl Into<String>) -> Seq<String> {
        let text: String = text.into();
        let text: Rc<str> = Rc::from(text);
        Seq::from_fn(move || TextLines::new(text.clone()))
    }
}

impl Seq<SeqRes<String>> {
    /// 按行读取文件，每次遍历重新打开文件，游标释放时关闭文件。
    ///
    /// 打开失败或读取失败时产出一个错误后结束。
    pub fn lines(path: impl AsRef<Path>) -> Seq<SeqRes<String>> {
        let path: PathBuf = path.as_ref().to_path_buf();
        Seq::try_using(
            move || {
                File::open(&path)
                    .map(|file| (BufReader::new(file), path.display().to_string()))
                    .map_err(|err| SeqErr::OpenFileErr { file: path.display().to_string(), err: err.to_string() })
            },
            |(reader, file)| {
                reader.lines().enumerate().scan(false, move |failed, (line_no, line)| {
                    if *failed {
                        return None;
                    }
                    Some(line.map_err(|err| {
                        *failed = true;
                        SeqErr::ReadFromFileErr { file: file.clone(), line_no: line_no + 1, err: err.to_string() }
                    }))
                })
            },
        )
    }
}

impl<T: 'static> Seq<T> {
    /// 作用域资源：每个游标创建时获取资源，遍历结束、游标被丢弃或展开时释放。
    ///
    /// `body`消费资源得到迭代器，资源的所有权随迭代器一起保存在游标中。
    pub fn using<R, A, B, I>(acquire: A, body: B) -> Seq<T>
    where
        A: Fn() -> R + 'static,
        B: Fn(R) -> I + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Seq::from_fn(move || UsingIter { iter: Some(body(acquire()).into_iter()) })
    }
}

impl<T: 'static> Seq<SeqRes<T>> {
    /// 可失败的作用域资源，获取失败时产出一个错误后结束。
    pub fn try_using<R, A, B, I>(acquire: A, body: B) -> Seq<SeqRes<T>>
    where
        A: Fn() -> SeqRes<R> + 'static,
        B: Fn(R) -> I + 'static,
        I: IntoIterator<Item = SeqRes<T>>,
        I::IntoIter: 'static,
    {
        Seq::new_derived(true, move || match acquire() {
            Ok(resource) => {
                trace!("resource acquired");
                Cursor::new(UsingIter { iter: Some(body(resource).into_iter()) })
            }
            Err(err) => {
                warn!(%err, "acquire resource failed");
                Cursor::new(std::iter::once(Err(err)))
            }
        })
    }
}

/// 耗尽时立即释放内部迭代器（及其持有的资源），不必等待游标被丢弃。
struct UsingIter<I> {
    iter: Option<I>,
}

impl<I: Iterator> Iterator for UsingIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.as_mut()?.next();
        if item.is_none() {
            self.iter = None;
            trace!("resource released");
        }
        item
    }
}

fn range_to_iter(start: Integer, end: Integer, step: Integer) -> Box<dyn DoubleEndedIterator<Item = Integer>> {
    let iter = RangeIter { start, end, step: Integer::abs(step), next: start, next_back: end, done: false };
    if step < 0 { Box::new(iter.rev()) } else { Box::new(iter) }
}

#[derive(Debug, Eq, PartialEq)]
struct RangeIter {
    start: Integer,
    end: Integer,
    step: Integer,
    next: Integer,
    next_back: Integer,
    /// 越过整数边界后结束
    done: bool,
}

impl Iterator for RangeIter {
    type Item = Integer;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.done && self.next >= self.start && self.next <= self.end && self.next <= self.next_back {
            let res = self.next;
            match self.next.checked_add(self.step) {
                Some(next) => self.next = next,
                None => self.done = true,
            }
            Some(res)
        } else {
            None
        }
    }
}

impl DoubleEndedIterator for RangeIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        if !self.done && self.next_back >= self.start && self.next_back <= self.end && self.next_back >= self.next {
            let res = self.next_back;
            match self.next_back.checked_sub(self.step) {
                Some(next_back) => self.next_back = next_back,
                None => self.done = true,
            }
            Some(res)
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct TextLines {
    text: Rc<str>,
    pos: usize,
}

impl TextLines {
    fn new(text: Rc<str>) -> Self {
        Self { text, pos: 0 }
    }
}

impl Iterator for TextLines {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos > self.text.len() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let newline_pos = rest.find('\n');
        match newline_pos {
            Some(idx) => {
                let line = rest[..idx].to_string();
                self.pos += idx + 1;
                Some(line)
            }
            None if self.pos < self.text.len() => {
                let line = rest.to_string();
                self.pos = self.text.len() + 1;
                Some(line)
            }
            None if self.pos == self.text.len() => {
                self.pos += 1;
                Some(String::new())
            }
            None => None,
        }
    }
}
