use crate::err::{SeqErr, SeqRes};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use tracing::warn;

/// 分组表：键到值列表的映射，按照键首次出现的顺序迭代。
#[derive(Debug, Clone)]
pub struct Grouping<K, V> {
    groups: Vec<(K, Vec<V>)>,
    index: FxHashMap<K, usize>,
}

impl<K, V> Default for Grouping<K, V> {
    fn default() -> Self {
        Grouping { groups: Vec::new(), index: FxHashMap::default() }
    }
}

impl<K: Eq + Hash + Clone, V> Grouping<K, V> {
    pub fn new() -> Grouping<K, V> {
        Grouping::default()
    }

    /// 追加值，新键插入到末尾。
    pub fn push(&mut self, key: K, value: V) {
        match self.index.entry(key) {
            Entry::Occupied(entry) => self.groups[*entry.get()].1.push(value),
            Entry::Vacant(entry) => {
                let key = entry.key().clone();
                entry.insert(self.groups.len());
                self.groups.push((key, vec![value]));
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.index.get(key).map(|&i| self.groups[i].1.as_slice())
    }
}

impl<K, V> Grouping<K, V> {
    /// 不同键的数量
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 所有值的数量
    pub fn value_count(&self) -> usize {
        self.groups.iter().map(|(_, values)| values.len()).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.groups.iter().map(|(key, values)| (key, values.as_slice()))
    }
}

impl<K, V> IntoIterator for Grouping<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::vec::IntoIter<(K, Vec<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// 完整遍历数据源构建分组表。
///
/// 对每个元素先调用`key_fn`再调用`element_fn`，各恰好一次。
pub fn create_grouping<T, K, V>(
    source: impl IntoIterator<Item = T>, mut key_fn: impl FnMut(&T) -> K, mut element_fn: impl FnMut(T) -> V,
) -> Grouping<K, V>
where
    K: Eq + Hash + Clone,
{
    let mut grouping = Grouping::new();
    for item in source {
        let key = key_fn(&item);
        let value = element_fn(item);
        grouping.push(key, value);
    }
    grouping
}

/// 可失败版本，任一选择器出错时丢弃已构建的分组表并返回错误。
pub fn try_create_grouping<T, K, V, EK, EV>(
    source: impl IntoIterator<Item = T>, mut key_fn: impl FnMut(&T) -> Result<K, EK>,
    mut element_fn: impl FnMut(T) -> Result<V, EV>,
) -> SeqRes<Grouping<K, V>>
where
    K: Eq + Hash + Clone,
    EK: ToString,
    EV: ToString,
{
    let mut grouping = Grouping::new();
    for (index, item) in source.into_iter().enumerate() {
        let key = key_fn(&item).map_err(|err| SeqErr::selector("group_by", "key", index, err));
        let value = key.and_then(|key| {
            element_fn(item).map(|value| (key, value)).map_err(|err| SeqErr::selector("group_by", "element", index, err))
        });
        match value {
            Ok((key, value)) => grouping.push(key, value),
            Err(err) => {
                warn!(%err, groups = grouping.len(), "grouping aborted");
                return Err(err);
            }
        }
    }
    Ok(grouping)
}
