//! Schema Code Frontend App
//!
//! Two-pane layout: code tree on the left, detail panel on the right,
//! with the navigation bar, search and recently used bar on top.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::components::{
    use_pane_width, CodeTree, DetailPanel, LogDrawer, MessageToasts, NavButtons, RecentlyUsedBar, Resizer, SearchBox,
};
use crate::config::UiConfig;
use crate::context::{AppContext, Services};
use crate::store::AppState;

const TREE_PANE: &str = "code";

#[component]
pub fn App(config: UiConfig) -> impl IntoView {
    let store = Store::new(AppState::default());
    provide_context(store);

    let ctx = AppContext::new(store, Services::new(config));
    provide_context(ctx);
    ctx.restore_selection();

    let tree_width = use_pane_width(TREE_PANE);

    view! {
        <div class="code-layout">
            <header class="code-header">
                <NavButtons />
                <SearchBox />
                <RecentlyUsedBar />
            </header>
            <div class="code-main">
                <aside class="code-tree-pane" style=move || format!("width: {}px;", tree_width.get())>
                    <CodeTree />
                </aside>
                <Resizer pane=TREE_PANE width=tree_width />
                <main class="code-detail-pane">
                    <DetailPanel />
                </main>
            </div>
            <MessageToasts />
            <LogDrawer />
        </div>
    }
}
