//! Detail Panel Lifecycle
//!
//! `Idle -> Loading -> Loaded <-> Dirty -> (Saved | Reverted) -> Loaded`.
//! Every navigation starts a new generation; async completions started
//! under an older generation are dropped instead of touching the panel.

use crate::path::CodePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Generation(u64);

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelState {
    #[default]
    Idle,
    Loading { path: CodePath, generation: Generation },
    Loaded { path: CodePath, generation: Generation },
    Dirty { path: CodePath, generation: Generation },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Proceed(Generation),
    /// User kept the unsaved changes; selection stays where it is
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelLifecycle {
    state: PanelState,
    generation: Generation,
}

impl PanelLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.state, PanelState::Dirty { .. })
    }

    pub fn path(&self) -> Option<&CodePath> {
        match &self.state {
            PanelState::Idle => None,
            PanelState::Loading { path, .. } | PanelState::Loaded { path, .. } | PanelState::Dirty { path, .. } => {
                Some(path)
            }
        }
    }

    /// Whether leaving the panel is allowed; asks only when there are unsaved changes
    pub fn may_leave(&self, confirm_discard: impl FnOnce() -> bool) -> bool {
        !self.is_dirty() || confirm_discard()
    }

    pub fn begin_navigation(&mut self, path: CodePath, confirm_discard: impl FnOnce() -> bool) -> NavigationDecision {
        if !self.may_leave(confirm_discard) {
            return NavigationDecision::Cancelled;
        }
        self.generation = Generation(self.generation.0 + 1);
        self.state = PanelState::Loading { path, generation: self.generation };
        NavigationDecision::Proceed(self.generation)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    /// Returns false for a stale completion, which must then be discarded
    pub fn finish_loading(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            tracing::debug!(?generation, current = ?self.generation, "dropping stale load");
            return false;
        }
        if let PanelState::Loading { path, generation } = &self.state {
            self.state = PanelState::Loaded { path: path.clone(), generation: *generation };
        }
        true
    }

    /// Reflect the dirty tracker; only moves between Loaded and Dirty
    pub fn mark_dirty(&mut self, dirty: bool) {
        self.state = match std::mem::take(&mut self.state) {
            PanelState::Loaded { path, generation } if dirty => PanelState::Dirty { path, generation },
            PanelState::Dirty { path, generation } if !dirty => PanelState::Loaded { path, generation },
            other => other,
        };
    }

    pub fn saved(&mut self) {
        self.mark_dirty(false);
    }

    pub fn reverted(&mut self) {
        self.mark_dirty(false);
    }

    /// Back to Idle, e.g. after the session ended
    pub fn close(&mut self) {
        self.generation = Generation(self.generation.0 + 1);
        self.state = PanelState::Idle;
    }

    /// The entity at `path` was deleted by a request started under `generation`.
    /// Closes only if the panel still shows it; a panel that moved on is left alone.
    pub fn close_deleted(&mut self, path: &CodePath, generation: Generation) -> bool {
        let still_shown = self.is_current(generation) || (self.path() == Some(path) && !self.is_dirty());
        if still_shown {
            self.close();
        } else {
            tracing::debug!(%path, "deleted entity no longer shown, keeping panel");
        }
        still_shown
    }
}

/// Ticket counter for requests where only the newest answer counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatestOnly {
    issued: u64,
}

impl LatestOnly {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        ticket == self.issued
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
    fn test_full_cycle() {
        let mut panel = PanelLifecycle::new();
        let NavigationDecision::Proceed(generation) = panel.begin_navigation(p("a"), || unreachable!()) else {
            panic!("clean panel must not ask")
        };
        assert!(matches!(panel.state(), PanelState::Loading { .. }));

        assert!(panel.finish_loading(generation));
        assert!(matches!(panel.state(), PanelState::Loaded { .. }));

        panel.mark_dirty(true);
        assert!(panel.is_dirty());
        panel.saved();
        assert!(matches!(panel.state(), PanelState::Loaded { .. }));

        panel.mark_dirty(true);
        panel.reverted();
        assert!(!panel.is_dirty());
    }

    #[test]
    fn test_declined_confirmation_keeps_selection() {
        let mut panel = PanelLifecycle::new();
        let NavigationDecision::Proceed(g) = panel.begin_navigation(p("a"), || true) else { panic!() };
        panel.finish_loading(g);
        panel.mark_dirty(true);

        assert_eq!(panel.begin_navigation(p("b"), || false), NavigationDecision::Cancelled);
        assert_eq!(panel.path(), Some(&p("a")));
        assert!(panel.is_dirty());

        assert!(matches!(panel.begin_navigation(p("b"), || true), NavigationDecision::Proceed(_)));
        assert_eq!(panel.path(), Some(&p("b")));
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut panel = PanelLifecycle::new();
        let NavigationDecision::Proceed(first) = panel.begin_navigation(p("a"), || true) else { panic!() };
        let NavigationDecision::Proceed(second) = panel.begin_navigation(p("b"), || true) else { panic!() };

        assert!(!panel.finish_loading(first));
        assert!(matches!(panel.state(), PanelState::Loading { .. }));
        assert!(panel.finish_loading(second));
        assert_eq!(panel.path(), Some(&p("b")));
    }

    #[test]
    fn test_mark_dirty_ignored_while_loading() {
        let mut panel = PanelLifecycle::new();
        panel.begin_navigation(p("a"), || true);
        panel.mark_dirty(true);
        assert!(!panel.is_dirty());
    }

    #[test]
    fn test_close_invalidates_pending_loads() {
        let mut panel = PanelLifecycle::new();
        let NavigationDecision::Proceed(g) = panel.begin_navigation(p("a"), || true) else { panic!() };
        panel.close();
        assert!(!panel.finish_loading(g));
        assert_eq!(panel.state(), &PanelState::Idle);
    }

    #[test]
    fn test_delete_of_shown_entity_closes_panel() {
        let mut panel = PanelLifecycle::new();
        let NavigationDecision::Proceed(g) = panel.begin_navigation(p("a"), || true) else { panic!() };
        panel.finish_loading(g);

        assert!(panel.close_deleted(&p("a"), g));
        assert_eq!(panel.state(), &PanelState::Idle);
    }

    #[test]
    fn test_delete_finishing_after_move_keeps_unsaved_changes() {
        let mut panel = PanelLifecycle::new();
        let NavigationDecision::Proceed(a) = panel.begin_navigation(p("a"), || true) else { panic!() };
        panel.finish_loading(a);

        // Delete of A is in flight while the user opens B and edits it
        let NavigationDecision::Proceed(b) = panel.begin_navigation(p("b"), || true) else { panic!() };
        panel.finish_loading(b);
        panel.mark_dirty(true);

        assert!(!panel.close_deleted(&p("a"), a));
        assert_eq!(panel.path(), Some(&p("b")));
        assert!(panel.is_current(b));
        assert!(panel.is_dirty());

        let mut asked = false;
        assert!(!panel.may_leave(|| {
            asked = true;
            false
        }));
        assert!(asked);
    }

    #[test]
    fn test_delete_of_reopened_clean_entity_closes_panel() {
        let mut panel = PanelLifecycle::new();
        let NavigationDecision::Proceed(old) = panel.begin_navigation(p("a"), || true) else { panic!() };
        panel.begin_navigation(p("b"), || true);
        let NavigationDecision::Proceed(g) = panel.begin_navigation(p("a"), || true) else { panic!() };
        panel.finish_loading(g);

        assert!(panel.close_deleted(&p("a"), old));
        assert_eq!(panel.path(), None);
    }

    #[test]
    fn test_only_latest_ticket_counts() {
        let mut requests = LatestOnly::default();
        let first = requests.issue();
        let second = requests.issue();
        assert!(!requests.is_latest(first));
        assert!(requests.is_latest(second));

        // A cancel issues a ticket nobody waits for
        requests.issue();
        assert!(!requests.is_latest(second));
    }
}
