//! Annotation items: the payload attached to every edge.
//!
//! An item is a (category, display text, attribute-value map) triple.
//! Attribute *names* are interned by the [`AnnotationItemManager`], which is
//! owned by the pipeline and shared by reference across all lattices; items
//! themselves are plain values with structural equality, which is what edge
//! deduplication keys on.

use std::collections::HashMap;
use std::sync::Mutex;

/// Interned attribute name handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrKey(u32);

/// What an edge denotes: a category, a display text, and attribute-value
/// pairs in insertion order.
///
/// Two items are equal when category, text, and the ordered attribute
/// pairs all match; that identity drives edge deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationItem {
    category: String,
    text: String,
    values: Vec<(AttrKey, String)>,
}

impl AnnotationItem {
    /// An item with a category and no display text.
    pub fn new(category: impl Into<String>) -> Self {
        AnnotationItem {
            category: category.into(),
            text: String::new(),
            values: Vec::new(),
        }
    }

    /// An item with a category and display text.
    pub fn with_text(category: impl Into<String>, text: impl Into<String>) -> Self {
        AnnotationItem {
            category: category.into(),
            text: text.into(),
            values: Vec::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Default)]
struct AttrNames {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl AttrNames {
    fn intern(&mut self, name: &str) -> AttrKey {
        if let Some(&id) = self.index.get(name) {
            return AttrKey(id);
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        AttrKey(id)
    }
}

/// Interns attribute names and reads/writes item attribute values.
///
/// One manager serves a whole pipeline; lattices hold it by reference. The
/// interner is behind a mutex so the pipeline's one-writer-at-a-time access
/// pattern is safe without further coordination.
#[derive(Debug, Default)]
pub struct AnnotationItemManager {
    attrs: Mutex<AttrNames>,
}

impl AnnotationItemManager {
    pub fn new() -> Self {
        AnnotationItemManager::default()
    }

    /// Interns an attribute name.
    pub fn attr_key(&self, name: &str) -> AttrKey {
        self.lock().intern(name)
    }

    /// The name behind an interned key.
    pub fn attr_name(&self, key: AttrKey) -> Option<String> {
        self.lock().names.get(key.0 as usize).cloned()
    }

    /// Sets an attribute on an item, replacing an existing value for the
    /// same name in place.
    pub fn set_value(&self, item: &mut AnnotationItem, name: &str, value: impl Into<String>) {
        let key = self.attr_key(name);
        let value = value.into();
        if let Some(pair) = item.values.iter_mut().find(|(k, _)| *k == key) {
            pair.1 = value;
        } else {
            item.values.push((key, value));
        }
    }

    /// Reads one attribute value, if present.
    pub fn value<'i>(&self, item: &'i AnnotationItem, name: &str) -> Option<&'i str> {
        let key = AttrKey(*self.lock().index.get(name)?);
        item.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All attribute pairs of an item, names resolved, in insertion order.
    pub fn values(&self, item: &AnnotationItem) -> Vec<(String, String)> {
        let names = self.lock();
        item.values
            .iter()
            .map(|(key, value)| {
                let name = names
                    .names
                    .get(key.0 as usize)
                    .cloned()
                    .unwrap_or_default();
                (name, value.clone())
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AttrNames> {
        self.attrs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_insertion_order() {
        let manager = AnnotationItemManager::new();
        let mut item = AnnotationItem::new("ananas");
        manager.set_value(&mut item, "base", "ananas");
        manager.set_value(&mut item, "morphology", "subst:sg:m");
        manager.set_value(&mut item, "discard", "0");

        assert_eq!(
            manager.values(&item),
            vec![
                ("base".to_string(), "ananas".to_string()),
                ("morphology".to_string(), "subst:sg:m".to_string()),
                ("discard".to_string(), "0".to_string()),
            ]
        );
        assert_eq!(manager.value(&item, "morphology"), Some("subst:sg:m"));
        assert_eq!(manager.value(&item, "missing"), None);
    }

    #[test]
    fn set_value_overwrites_in_place() {
        let manager = AnnotationItemManager::new();
        let mut item = AnnotationItem::new("word");
        manager.set_value(&mut item, "base", "old");
        manager.set_value(&mut item, "case", "nom");
        manager.set_value(&mut item, "base", "new");

        assert_eq!(
            manager.values(&item),
            vec![
                ("base".to_string(), "new".to_string()),
                ("case".to_string(), "nom".to_string()),
            ]
        );
    }

    #[test]
    fn structural_equality_covers_attributes() {
        let manager = AnnotationItemManager::new();
        let mut sg = AnnotationItem::new("ananas");
        let mut pl = AnnotationItem::new("ananas");
        manager.set_value(&mut sg, "morphology", "subst:sg:m");
        manager.set_value(&mut pl, "morphology", "subst:pl:m");
        assert_ne!(sg, pl);

        let mut sg_again = AnnotationItem::new("ananas");
        manager.set_value(&mut sg_again, "morphology", "subst:sg:m");
        assert_eq!(sg, sg_again);
    }

    #[test]
    fn category_and_text_accessors() {
        let item = AnnotationItem::with_text("word", "szybki");
        assert_eq!(item.category(), "word");
        assert_eq!(item.text(), "szybki");
        assert_eq!(AnnotationItem::new("word").text(), "");
    }
}
