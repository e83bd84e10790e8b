use std::collections::HashMap;

use log::debug;

use crate::{
    error::ExecutionError,
    extractor::{Entry, ValueExtractor},
    filter::{Comparison, Filter},
    language::QueryLanguage,
    value::Value,
};

/// An in-memory named cache: entries in insertion order plus the extractors
/// indexed on it.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    entries: Vec<Entry>,
    indexes: Vec<ValueExtractor>,
}

impl Cache {
    pub fn new() -> Self {
        Cache::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| Comparison::Equal.test(&e.key, key))
            .map(|e| &e.value)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn put(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|e| Comparison::Equal.test(&e.key, &key)) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                self.entries.push(Entry { key, value });
                None
            }
        }
    }

    /// Entries matching `filter`, in insertion order.
    pub fn query<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |e| filter.evaluate(e))
    }

    /// Removes entries matching `filter`; returns how many were removed.
    pub fn remove_matching(&mut self, filter: &Filter) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !filter.evaluate(e));
        before - self.entries.len()
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.entries.iter_mut()
    }

    /// Empties the cache; indexes stay.
    pub fn truncate(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Returns `false` if the index already exists.
    pub fn add_index(&mut self, extractor: ValueExtractor) -> bool {
        if self.indexes.contains(&extractor) {
            return false;
        }
        self.indexes.push(extractor);
        true
    }

    /// Returns `false` if there was no such index.
    pub fn remove_index(&mut self, extractor: &ValueExtractor) -> bool {
        let before = self.indexes.len();
        self.indexes.retain(|i| i != extractor);
        before != self.indexes.len()
    }

    pub fn indexes(&self) -> &[ValueExtractor] {
        &self.indexes
    }
}

/// Named caches that statements read and write.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    caches: HashMap<String, Cache>,
}

impl CacheStore {
    pub fn new() -> Self {
        CacheStore::default()
    }

    /// Creates `name` unless it exists; returns whether it was created.
    pub fn ensure_cache(&mut self, name: &str) -> bool {
        if self.caches.contains_key(name) {
            return false;
        }
        debug!("creating cache '{}'", name);
        self.caches.insert(name.to_string(), Cache::new());
        true
    }

    pub fn drop_cache(&mut self, name: &str) -> Result<Cache, ExecutionError> {
        self.caches
            .remove(name)
            .ok_or_else(|| ExecutionError::NoSuchCache(name.to_string()))
    }

    pub fn cache(&self, name: &str) -> Result<&Cache, ExecutionError> {
        self.caches
            .get(name)
            .ok_or_else(|| ExecutionError::NoSuchCache(name.to_string()))
    }

    pub fn cache_mut(&mut self, name: &str) -> Result<&mut Cache, ExecutionError> {
        self.caches
            .get_mut(name)
            .ok_or_else(|| ExecutionError::NoSuchCache(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.caches.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

/// Everything a statement needs at run time.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    language: QueryLanguage,
    store: CacheStore,
    stop_on_error: bool,
}

impl ExecutionContext {
    pub fn new(language: QueryLanguage) -> Self {
        ExecutionContext {
            language,
            store: CacheStore::new(),
            stop_on_error: true,
        }
    }

    /// Whether a failing statement in a sourced script aborts the script.
    pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }

    pub fn language(&self) -> &QueryLanguage {
        &self.language
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.store
    }

    pub fn stop_on_error(&self) -> bool {
        self.stop_on_error
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        ExecutionContext::new(QueryLanguage::default())
    }
}
