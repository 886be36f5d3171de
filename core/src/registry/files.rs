use std::collections::BTreeMap;

use crate::model::FileRecord;

/// File records grouped by category id, plus the active-category pointer.
///
/// Within one list, paths are unique. The same path may appear under several
/// categories.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    lists: BTreeMap<String, Vec<FileRecord>>,
    active: String,
}

impl FileRegistry {
    pub fn new(active: impl Into<String>) -> Self {
        let active = active.into();
        let mut lists = BTreeMap::new();
        lists.insert(active.clone(), Vec::new());
        FileRegistry { lists, active }
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    /// Points at another category, creating its list if needed.
    pub fn switch_active(&mut self, category: &str) {
        self.ensure_list(category);
        self.active = category.to_string();
    }

    pub fn ensure_list(&mut self, category: &str) {
        if !self.lists.contains_key(category) {
            self.lists.insert(category.to_string(), Vec::new());
        }
    }

    pub fn files(&self, category: &str) -> &[FileRecord] {
        self.lists.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn active_files(&self) -> &[FileRecord] {
        self.files(&self.active)
    }

    pub fn lists(&self) -> &BTreeMap<String, Vec<FileRecord>> {
        &self.lists
    }

    pub fn contains_path(&self, category: &str, path: &str) -> bool {
        self.files(category).iter().any(|f| f.path == path)
    }

    pub fn get(&self, category: &str, id: &str) -> Option<&FileRecord> {
        self.files(category).iter().find(|f| f.id == id)
    }

    pub fn get_mut(&mut self, category: &str, id: &str) -> Option<&mut FileRecord> {
        self.lists.get_mut(category)?.iter_mut().find(|f| f.id == id)
    }

    /// Appends `record` to the list named by its `category` field.
    /// Returns `false`, leaving the list untouched, when the path is already there.
    pub fn insert(&mut self, record: FileRecord) -> bool {
        let list = self.lists.entry(record.category.clone()).or_default();
        if list.iter().any(|f| f.path == record.path) {
            return false;
        }
        list.push(record);
        true
    }

    pub fn remove(&mut self, category: &str, id: &str) -> Option<FileRecord> {
        let list = self.lists.get_mut(category)?;
        let index = list.iter().position(|f| f.id == id)?;
        Some(list.remove(index))
    }

    /// Increments the open counter. Returns the new count.
    pub fn record_open(&mut self, category: &str, id: &str) -> Option<u64> {
        let record = self.get_mut(category, id)?;
        record.open_count += 1;
        Some(record.open_count)
    }

    /// Discards a category's whole list.
    pub fn drop_category(&mut self, category: &str) -> Vec<FileRecord> {
        self.lists.remove(category).unwrap_or_default()
    }

    /// Replaces every list. The active pointer is left alone.
    pub fn replace_all(&mut self, lists: BTreeMap<String, Vec<FileRecord>>) {
        self.lists = lists;
        let active = self.active.clone();
        self.ensure_list(&active);
    }
}
