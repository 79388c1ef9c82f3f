//! Application Context
//!
//! Shared state provided via Leptos Context API. Created once in `App`;
//! every component reaches the REST client, tree source and client
//! storage through it.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use tracing::{debug, info, warn};

use crate::api::{ApiError, RestClient};
use crate::config::UiConfig;
use crate::lifecycle::{Generation, LatestOnly, NavigationDecision, PanelLifecycle};
use crate::models::{EntityKind, SchemaEntity};
use crate::navigation::NavigationStack;
use crate::path::CodePath;
use crate::recent::RecentlyUsedRegistry;
use crate::search::federated_search;
use crate::storage::{AnyStorage, KeyValueStorage, StorageKeys};
use crate::store::{store_push_message, store_set_recent, AppStateStoreFields, AppStore, MessageLevel};
use crate::tree_source::TreeDataSource;

const DISCARD_PROMPT: &str = "There are unsaved changes. Discard them and continue?";

/// Non-reactive services shared by the whole UI
pub struct Services {
    pub config: UiConfig,
    pub store: Rc<RestClient>,
    pub tree: TreeDataSource<RestClient>,
    pub storage: AnyStorage,
    pub keys: StorageKeys,
    pub recent: RefCell<RecentlyUsedRegistry<AnyStorage>>,
}

impl Services {
    pub fn new(config: UiConfig) -> Self {
        let store = Rc::new(RestClient::new(&config.server_base));
        let storage = AnyStorage::detect();
        let keys = StorageKeys::new(config.port.clone());
        let mut recent = RecentlyUsedRegistry::with_capacity(storage.clone(), &keys, config.recent_capacity);
        recent.load_all();

        Self {
            tree: TreeDataSource::new(store.clone(), config.page_size),
            store,
            storage,
            keys,
            recent: RefCell::new(recent),
            config,
        }
    }
}

/// App-wide signals provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    services: StoredValue<Rc<Services>, LocalStorage>,
    pub app_store: AppStore,
    pub navigation: RwSignal<NavigationStack>,
    pub lifecycle: RwSignal<PanelLifecycle>,
    /// Path of the selected tree node
    pub selected: RwSignal<Option<CodePath>>,
    /// Entity shown in the detail panel
    pub entity: RwSignal<Option<SchemaEntity>>,
    /// Bumped to make expanded tree nodes reload their children
    pub tree_version: RwSignal<u32>,
    pub session_expired: RwSignal<bool>,
    /// Only the newest search may fill the search root
    search_requests: StoredValue<LatestOnly>,
}

impl AppContext {
    pub fn new(app_store: AppStore, services: Services) -> Self {
        store_set_recent(&app_store, services.recent.borrow().entries());
        Self {
            services: StoredValue::new_local(Rc::new(services)),
            app_store,
            navigation: RwSignal::new(NavigationStack::new()),
            lifecycle: RwSignal::new(PanelLifecycle::new()),
            selected: RwSignal::new(None),
            entity: RwSignal::new(None),
            tree_version: RwSignal::new(0),
            session_expired: RwSignal::new(false),
            search_requests: StoredValue::new(LatestOnly::default()),
        }
    }

    pub fn services(&self) -> Rc<Services> {
        self.services.get_value()
    }

    /// Select a path from the tree, the recently used bar or a search hit
    pub fn navigate(&self, path: CodePath) {
        if self.selected.get_untracked().as_ref() == Some(&path) {
            return;
        }
        if !self.may_leave() {
            debug!(%path, "navigation cancelled, unsaved changes kept");
            return;
        }
        self.navigation.update(|n| n.push(path.clone()));
        self.activate(path);
    }

    pub fn go_back(&self) {
        if !self.navigation.with_untracked(NavigationStack::can_go_back) || !self.may_leave() {
            return;
        }
        if let Some(path) = self.navigation.try_update(|n| n.backward()).flatten() {
            self.activate(path);
        }
    }

    pub fn go_forward(&self) {
        if !self.navigation.with_untracked(NavigationStack::can_go_forward) || !self.may_leave() {
            return;
        }
        if let Some(path) = self.navigation.try_update(|n| n.forward()).flatten() {
            self.activate(path);
        }
    }

    fn may_leave(&self) -> bool {
        self.lifecycle.with_untracked(|l| l.may_leave(confirm_discard))
    }

    /// Show `path` in the detail panel without touching the history
    fn activate(&self, path: CodePath) {
        let decision = self.lifecycle.try_update(|l| l.begin_navigation(path.clone(), || true));
        let Some(NavigationDecision::Proceed(generation)) = decision else {
            return;
        };

        info!(%path, "navigate");
        self.selected.set(Some(path.clone()));
        self.entity.set(None);

        let services = self.services();
        if let Err(e) = services.storage.set(&services.keys.selected_object(), &path.to_string()) {
            warn!(error = %e, "could not remember selection");
        }

        let ctx = *self;
        spawn_local(async move {
            let result = services.tree.load_entity(&path).await;
            if !ctx.lifecycle.try_update(|l| l.finish_loading(generation)).unwrap_or(false) {
                return;
            }
            match result {
                Ok(Some(entity)) => {
                    ctx.record_recent(&entity, &path);
                    ctx.entity.set(Some(entity));
                }
                Ok(None) => {}
                Err(e) => ctx.report(&e),
            }
        });
    }

    /// Reopen the selection of the previous visit
    pub fn restore_selection(&self) {
        let services = self.services();
        let stored = services
            .storage
            .get(&services.keys.selected_object())
            .or_else(|| services.storage.get(&services.keys.last_open_method()));
        let Some(raw) = stored else { return };

        match CodePath::parse(&raw) {
            Ok(path) => self.navigate(path),
            Err(e) => warn!(%raw, error = %e, "ignoring stored selection"),
        }
    }

    fn record_recent(&self, entity: &SchemaEntity, path: &CodePath) {
        let services = self.services();
        let path_string = path.to_string();
        let evicted = services
            .recent
            .borrow_mut()
            .add(entity.id(), &entity.name(), entity.kind().icon_class(), &path_string);
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "recently used entries evicted");
        }
        store_set_recent(&self.app_store, services.recent.borrow().entries());
        remember_method(&services.storage, &services.keys, entity.kind(), &path_string);
    }

    pub fn remove_recent(&self, id: &str) {
        let services = self.services();
        if services.recent.borrow_mut().remove(id) {
            store_set_recent(&self.app_store, services.recent.borrow().entries());
        }
    }

    /// The entity at `path` was deleted by a request started under `generation`:
    /// drop it everywhere, and select its parent if the panel still shows it
    pub fn forget(&self, path: &CodePath, id: &str, generation: Generation) {
        self.navigation.update(|n| n.remove(path));
        self.remove_recent(id);
        self.reload_tree();

        let closed = self.lifecycle.try_update(|l| l.close_deleted(path, generation)).unwrap_or(false);
        if !closed {
            return;
        }
        self.entity.set(None);
        match path.parent() {
            Some(parent) => self.navigate(parent),
            None => self.selected.set(None),
        }
    }

    /// Select what a creation started under `generation` produced, unless the user moved on
    pub fn open_created(&self, path: CodePath, generation: Generation) {
        self.reload_tree();
        if self.lifecycle.with_untracked(|l| l.is_current(generation)) {
            self.navigate(path);
        } else {
            debug!(%path, "created entity not opened, selection changed meanwhile");
        }
    }

    pub fn reload_tree(&self) {
        self.tree_version.update(|v| *v += 1);
    }

    pub fn notify(&self, level: MessageLevel, text: impl Into<String>) {
        store_push_message(&self.app_store, level, text);
    }

    /// Surface a failed request; an invalid session ends the session
    pub fn report(&self, error: &ApiError) {
        if error.is_fatal() {
            self.expire_session();
            return;
        }
        warn!(error = %error, "request failed");
        let level = match error {
            ApiError::Validation { .. } => MessageLevel::Error,
            _ => MessageLevel::Warning,
        };
        self.notify(level, error.to_string());
    }

    fn expire_session(&self) {
        if self.session_expired.get_untracked() {
            return;
        }
        warn!("session invalidated by server");
        self.session_expired.set(true);
        self.lifecycle.update(PanelLifecycle::close);
        self.entity.set(None);
        self.selected.set(None);

        let services = self.services();
        services.storage.remove(&services.keys.selected_object());
        self.notify(MessageLevel::Error, "Your session has expired. Please log in again.");
    }

    pub fn search(&self, term: String) {
        let term = term.trim().to_string();
        if term.is_empty() {
            self.clear_search();
            return;
        }

        let ctx = *self;
        let services = self.services();
        let ticket = self.search_requests.try_update_value(LatestOnly::issue).unwrap_or_default();
        self.app_store.searching().set(true);
        spawn_local(async move {
            let timeout = services.config.request_timeout_ms;
            let outcome = federated_search(&*services.store, &term, services.config.page_size, || {
                TimeoutFuture::new(timeout)
            })
            .await;
            if !ctx.search_requests.with_value(|r| r.is_latest(ticket)) {
                debug!(%term, "dropping superseded search");
                return;
            }
            ctx.app_store.searching().set(false);

            if outcome.is_partial() {
                ctx.notify(
                    MessageLevel::Warning,
                    format!(
                        "Search results may be incomplete: {} queries failed, {} timed out",
                        outcome.failed.len(),
                        outcome.timed_out.len()
                    ),
                );
            }
            if outcome.hits.is_empty() {
                ctx.notify(MessageLevel::Info, format!("No results for \"{}\"", term));
            }

            services.tree.set_search_results(Some(outcome.entities()));
            ctx.app_store.search_term().set(term);
            ctx.reload_tree();
        });
    }

    pub fn clear_search(&self) {
        self.search_requests.update_value(|r| {
            r.issue();
        });
        self.app_store.searching().set(false);
        self.services().tree.set_search_results(None);
        self.app_store.search_term().set(String::new());
        self.reload_tree();
    }
}

/// Methods are reopened on the next visit when no selection was stored
fn remember_method(storage: &impl KeyValueStorage, keys: &StorageKeys, kind: EntityKind, path: &str) {
    if kind != EntityKind::SchemaMethod {
        return;
    }
    if let Err(e) = storage.set(&keys.last_open_method(), path) {
        warn!(error = %e, "could not remember last open method");
    }
}

fn confirm_discard() -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(DISCARD_PROMPT).ok())
        .unwrap_or(true)
}

pub fn use_app_context() -> AppContext {
    expect_context::<AppContext>()
}
