//! Navigation History
//!
//! Back/forward stack of visited tree paths.

use crate::path::CodePath;

/// Linear history of unique paths with a cursor.
///
/// Revisiting a path moves it to the end instead of duplicating it, and
/// visiting a new path after going back drops everything past the cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationStack {
    entries: Vec<CodePath>,
    index: Option<usize>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit
    pub fn push(&mut self, path: CodePath) {
        if self.current() == Some(&path) {
            return;
        }
        if let Some(index) = self.index {
            self.entries.truncate(index + 1);
        }
        self.entries.retain(|p| p != &path);
        self.entries.push(path);
        self.index = Some(self.entries.len() - 1);
    }

    /// Step back; the returned path is activated without being pushed again
    pub fn backward(&mut self) -> Option<CodePath> {
        let target = self.peek_backward()?.clone();
        self.index = self.index.map(|i| i - 1);
        Some(target)
    }

    pub fn forward(&mut self) -> Option<CodePath> {
        let target = self.peek_forward()?.clone();
        self.index = self.index.map(|i| i + 1);
        Some(target)
    }

    pub fn peek_backward(&self) -> Option<&CodePath> {
        let index = self.index?;
        if index == 0 {
            return None;
        }
        self.entries.get(index - 1)
    }

    pub fn peek_forward(&self) -> Option<&CodePath> {
        self.entries.get(self.index? + 1)
    }

    pub fn can_go_back(&self) -> bool {
        self.peek_backward().is_some()
    }

    pub fn can_go_forward(&self) -> bool {
        self.peek_forward().is_some()
    }

    pub fn current(&self) -> Option<&CodePath> {
        self.entries.get(self.index?)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CodePath] {
        &self.entries
    }

    /// Forget a path, e.g. after its entity was deleted
    pub fn remove(&mut self, path: &CodePath) {
        let Some(position) = self.entries.iter().position(|p| p == path) else { return };
        self.entries.remove(position);
        self.index = match self.index {
            _ if self.entries.is_empty() => None,
            Some(i) if i > position || i >= self.entries.len() => Some(i.saturating_sub(1)),
            other => other,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::TreeRoot;

    fn p(id: &str) -> CodePath {
        CodePath::new(TreeRoot::Custom).with_type(id).unwrap()
    }

    #[test]
    fn test_pushes_then_walk_back_to_start() {
        let mut nav = NavigationStack::new();
        let paths: Vec<_> = (1..=5).map(|i| p(&format!("t{}", i))).collect();
        for path in &paths {
            nav.push(path.clone());
        }
        assert_eq!(nav.current_index(), Some(4));

        let mut last = None;
        for _ in 0..4 {
            last = nav.backward();
        }
        assert_eq!(last, Some(paths[0].clone()));
        assert_eq!(nav.current_index(), Some(0));
    }

    #[test]
    fn test_revisit_bubbles_to_end() {
        let mut nav = NavigationStack::new();
        nav.push(p("a"));
        nav.push(p("b"));
        nav.push(p("c"));
        nav.push(p("a"));

        assert_eq!(nav.len(), 3);
        assert_eq!(nav.entries(), &[p("b"), p("c"), p("a")]);
        assert_eq!(nav.current(), Some(&p("a")));
    }

    #[test]
    fn test_new_visit_after_back_truncates_branch() {
        let mut nav = NavigationStack::new();
        nav.push(p("a"));
        nav.push(p("b"));
        nav.push(p("c"));
        nav.backward();
        nav.backward();
        nav.push(p("d"));

        assert_eq!(nav.entries(), &[p("a"), p("d")]);
        assert!(!nav.can_go_forward());
        assert_eq!(nav.current_index(), Some(1));
    }

    #[test]
    fn test_moving_past_either_end_is_noop() {
        let mut nav = NavigationStack::new();
        assert_eq!(nav.backward(), None);
        assert_eq!(nav.forward(), None);

        nav.push(p("a"));
        nav.push(p("b"));
        assert_eq!(nav.forward(), None);
        assert_eq!(nav.current_index(), Some(1));

        assert_eq!(nav.backward(), Some(p("a")));
        assert_eq!(nav.backward(), None);
        assert_eq!(nav.current_index(), Some(0));
        assert_eq!(nav.forward(), Some(p("b")));
    }

    #[test]
    fn test_replay_does_not_grow_stack() {
        let mut nav = NavigationStack::new();
        nav.push(p("a"));
        nav.push(p("b"));
        nav.backward();
        nav.forward();
        nav.push(p("b"));
        assert_eq!(nav.len(), 2);
    }

    #[test]
    fn test_remove_keeps_cursor_on_same_entry() {
        let mut nav = NavigationStack::new();
        nav.push(p("a"));
        nav.push(p("b"));
        nav.push(p("c"));
        nav.remove(&p("a"));
        assert_eq!(nav.current(), Some(&p("c")));

        nav.remove(&p("c"));
        assert_eq!(nav.current(), Some(&p("b")));

        nav.remove(&p("b"));
        assert!(nav.is_empty());
        assert_eq!(nav.current_index(), None);
    }
}
