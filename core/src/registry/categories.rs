use tracing::warn;

use crate::model::{new_category_id, Category};

/// Result of removing a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed(Category),
    /// The category is the only one left and was kept.
    LastCategory,
    Unknown,
}

/// Ordered category metadata. Never empty.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    /// A registry holding only the bootstrap category.
    pub fn bootstrap(default_id: &str) -> Self {
        CategoryRegistry { categories: vec![Category::new(default_id, default_id, 0)] }
    }

    /// Builds a registry from loaded categories, ordered by `sort_order` and
    /// renumbered densely. Returns `None` when `loaded` is empty.
    pub fn from_loaded(mut loaded: Vec<Category>) -> Option<Self> {
        if loaded.is_empty() {
            return None;
        }
        loaded.sort_by_key(|c| c.sort_order);
        let mut seen = std::collections::HashSet::new();
        loaded.retain(|c| {
            let fresh = seen.insert(c.id.clone());
            if !fresh {
                warn!("Dropping duplicate category id {}", c.id);
            }
            fresh
        });
        let mut registry = CategoryRegistry { categories: loaded };
        registry.renumber();
        Some(registry)
    }

    pub fn list(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn first(&self) -> Option<&Category> {
        self.categories.first()
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Looks a category up by id, then by exact name.
    pub fn resolve(&self, id_or_name: &str) -> Option<&Category> {
        self.get(id_or_name)
            .or_else(|| self.categories.iter().find(|c| c.name == id_or_name))
    }

    /// Appends a new category. Returns `None` when the name is blank or already taken.
    /// Names are compared exactly, surrounding whitespace included.
    pub fn add(&mut self, name: &str) -> Option<&Category> {
        if name.trim().is_empty() || self.name_taken(name, None) {
            return None;
        }
        let category = Category::new(new_category_id(), name, self.categories.len() as i32);
        self.categories.push(category);
        self.categories.last()
    }

    /// Renames in place. Returns the previous name, `None` when the id is unknown.
    /// Blank names and names used by another category leave things unchanged and
    /// return the current name.
    pub fn rename(&mut self, id: &str, new_name: &str) -> Option<String> {
        let taken = new_name.trim().is_empty() || self.name_taken(new_name, Some(id));
        let category = self.categories.iter_mut().find(|c| c.id == id)?;
        if taken {
            return Some(category.name.clone());
        }
        Some(std::mem::replace(&mut category.name, new_name.to_string()))
    }

    pub fn remove(&mut self, id: &str) -> Removal {
        let Some(index) = self.categories.iter().position(|c| c.id == id) else {
            return Removal::Unknown;
        };
        if self.categories.len() == 1 {
            return Removal::LastCategory;
        }
        let removed = self.categories.remove(index);
        self.renumber();
        Removal::Removed(removed)
    }

    /// Puts the listed ids first, in the given order, followed by any category not
    /// listed in its current order. Unknown ids are ignored.
    pub fn reorder(&mut self, ids: &[String]) {
        let mut ordered = Vec::with_capacity(self.categories.len());
        for id in ids {
            if let Some(index) = self.categories.iter().position(|c| &c.id == id) {
                ordered.push(self.categories.remove(index));
            }
        }
        ordered.append(&mut self.categories);
        self.categories = ordered;
        self.renumber();
    }

    fn name_taken(&self, name: &str, except_id: Option<&str>) -> bool {
        self.categories
            .iter()
            .any(|c| c.name == name && Some(c.id.as_str()) != except_id)
    }

    fn renumber(&mut self) {
        for (order, category) in self.categories.iter_mut().enumerate() {
            category.sort_order = order as i32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(registry: &CategoryRegistry) -> Vec<&str> {
        registry.list().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_add_appends_with_next_sort_order() {
        let mut registry = CategoryRegistry::bootstrap("main");
        let work = registry.add("Work").unwrap().clone();
        assert_eq!(work.sort_order, 1);
        assert!(work.id.starts_with("cat-"));
        assert_eq!(names(&registry), vec!["main", "Work"]);
    }

    #[test]
    fn test_add_duplicate_name_is_noop() {
        let mut registry = CategoryRegistry::bootstrap("main");
        registry.add("Work");
        assert!(registry.add("Work").is_none());
        // Exact, case-sensitive match
        assert!(registry.add("work").is_some());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_names_keep_surrounding_whitespace() {
        let mut registry = CategoryRegistry::bootstrap("main");
        registry.add("Work");
        let padded = registry.add(" Work").expect("padded name is a different name").clone();
        assert_eq!(padded.name, " Work");
        assert!(registry.add(" Work").is_none());
        assert!(registry.add("   ").is_none());
    }

    #[test]
    fn test_rename_keeps_id() {
        let mut registry = CategoryRegistry::bootstrap("main");
        let id = registry.add("Work").unwrap().id.clone();
        assert_eq!(registry.rename(&id, "Office").as_deref(), Some("Work"));
        assert_eq!(registry.get(&id).unwrap().name, "Office");
        assert_eq!(registry.rename("missing", "x"), None);
    }

    #[test]
    fn test_rename_to_taken_name_is_ignored() {
        let mut registry = CategoryRegistry::bootstrap("main");
        let id = registry.add("Work").unwrap().id.clone();
        registry.rename(&id, "main");
        assert_eq!(registry.get(&id).unwrap().name, "Work");
    }

    #[test]
    fn test_remove_last_category_is_rejected() {
        let mut registry = CategoryRegistry::bootstrap("main");
        assert_eq!(registry.remove("main"), Removal::LastCategory);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remove("nope"), Removal::Unknown);
    }

    #[test]
    fn test_remove_renumbers() {
        let mut registry = CategoryRegistry::bootstrap("main");
        registry.add("A");
        let b = registry.add("B").unwrap().id.clone();
        assert!(matches!(registry.remove("main"), Removal::Removed(_)));
        assert_eq!(registry.get(&b).unwrap().sort_order, 1);
        assert_eq!(registry.first().unwrap().name, "A");
    }

    #[test]
    fn test_reorder_assigns_dense_orders() {
        let mut registry = CategoryRegistry::bootstrap("main");
        let a = registry.add("A").unwrap().id.clone();
        let b = registry.add("B").unwrap().id.clone();
        registry.reorder(&[b.clone(), "ghost".to_string(), a.clone()]);
        assert_eq!(names(&registry), vec!["B", "A", "main"]);
        let orders: Vec<i32> = registry.list().iter().map(|c| c.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_from_loaded_sorts_and_dedups() {
        let loaded = vec![
            Category::new("b", "B", 5),
            Category::new("a", "A", 2),
            Category::new("a", "A again", 9),
        ];
        let registry = CategoryRegistry::from_loaded(loaded).unwrap();
        assert_eq!(names(&registry), vec!["A", "B"]);
        assert_eq!(registry.get("b").unwrap().sort_order, 1);
        assert!(CategoryRegistry::from_loaded(Vec::new()).is_none());
    }

    #[test]
    fn test_resolve_by_id_then_name() {
        let mut registry = CategoryRegistry::bootstrap("main");
        let id = registry.add("Work").unwrap().id.clone();
        assert_eq!(registry.resolve("Work").unwrap().id, id);
        assert_eq!(registry.resolve(&id).unwrap().name, "Work");
        assert!(registry.resolve("Play").is_none());
    }
}
