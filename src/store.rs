//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::RecentlyUsedEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl MessageLevel {
    pub fn class(self) -> &'static str {
        match self {
            MessageLevel::Info => "message info",
            MessageLevel::Success => "message success",
            MessageLevel::Warning => "message warning",
            MessageLevel::Error => "message error",
        }
    }

    /// Errors and warnings stay until dismissed
    pub fn auto_dismiss(self) -> bool {
        matches!(self, MessageLevel::Info | MessageLevel::Success)
    }
}

/// Dismissable toast
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: u32,
    pub level: MessageLevel,
    pub text: String,
}

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Recently used bar, most recent first
    pub recent: Vec<RecentlyUsedEntry>,
    pub messages: Vec<Message>,
    pub next_message_id: u32,
    /// Term of the last search; empty when no search is active
    pub search_term: String,
    pub searching: bool,
    pub log_open: bool,
}

pub type AppStore = Store<AppState>;

pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

pub fn store_push_message(store: &AppStore, level: MessageLevel, text: impl Into<String>) -> u32 {
    let id = {
        let field = store.next_message_id();
        let mut next = field.write();
        *next += 1;
        *next
    };
    store.messages().write().push(Message { id, level, text: text.into() });
    id
}

pub fn store_dismiss_message(store: &AppStore, id: u32) {
    store.messages().write().retain(|m| m.id != id);
}

pub fn store_set_recent(store: &AppStore, entries: &[RecentlyUsedEntry]) {
    store.recent().set(entries.to_vec());
}
