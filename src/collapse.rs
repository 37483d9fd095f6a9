use std::collections::HashSet;

/// Submodels whose variants are hidden from the table.
///
/// Keeps insertion order so the persisted sequence is stable across saves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollapsedSubmodels {
    order: Vec<String>,
    lookup: HashSet<String>,
}

impl CollapsedSubmodels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collapsed = Self::new();
        for id in ids {
            collapsed.insert(id.into());
        }
        collapsed
    }

    fn insert(&mut self, id: String) {
        if self.lookup.insert(id.clone()) {
            self.order.push(id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains(id)
    }

    /// Collapse `id` if expanded, expand it if collapsed.
    pub fn toggle(&mut self, id: &str) {
        if self.lookup.remove(id) {
            self.order.retain(|existing| existing != id);
        } else {
            self.insert(id.to_string());
        }
    }

    pub fn expand_all(&mut self) {
        self.order.clear();
        self.lookup.clear();
    }

    /// Replace the set with exactly `ids`.
    pub fn collapse_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self = Self::from_ids(ids);
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut collapsed = CollapsedSubmodels::new();
        collapsed.toggle("sub1");
        assert!(collapsed.contains("sub1"));
        collapsed.toggle("sub1");
        assert!(!collapsed.contains("sub1"));
        assert!(collapsed.is_empty());
    }

    #[test]
    fn test_toggle_preserves_order_of_others() {
        let mut collapsed = CollapsedSubmodels::from_ids(["a", "b", "c"]);
        collapsed.toggle("b");
        assert_eq!(collapsed.ids(), ["a".to_string(), "c".to_string()]);
        collapsed.toggle("b");
        assert_eq!(
            collapsed.ids(),
            ["a".to_string(), "c".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_collapse_all_replaces_and_expand_all_clears() {
        let mut collapsed = CollapsedSubmodels::from_ids(["stale"]);
        collapsed.collapse_all(["sub1", "sub2", "sub1"]);
        assert_eq!(collapsed.ids(), ["sub1".to_string(), "sub2".to_string()]);
        assert!(!collapsed.contains("stale"));

        collapsed.expand_all();
        assert!(collapsed.is_empty());
        assert!(!collapsed.contains("sub1"));
    }
}
