//! Code Tree Component
//!
//! Lazily expanded tree over the schema. Each row loads its children from
//! the tree data source the first time it opens and again whenever the
//! tree is invalidated.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::context::use_app_context;
use crate::lifecycle::LatestOnly;
use crate::models::TreeNode;
use crate::tree_source::LoadTarget;

#[component]
pub fn CodeTree() -> impl IntoView {
    let ctx = use_app_context();
    let (roots, set_roots) = signal(Vec::<TreeNode>::new());
    let loads = StoredValue::new(LatestOnly::default());

    Effect::new(move |_| {
        let _ = ctx.tree_version.get();
        let services = ctx.services();
        let ticket = loads.try_update_value(LatestOnly::issue).unwrap_or_default();
        spawn_local(async move {
            let result = services.tree.load(&LoadTarget::RootSentinel).await;
            if !loads.try_with_value(|l| l.is_latest(ticket)).unwrap_or(false) {
                return;
            }
            match result {
                Ok(nodes) => set_roots.set(nodes),
                Err(e) => ctx.report(&e),
            }
        });
    });

    view! {
        <div class="code-tree">
            <For
                each=move || roots.get()
                key=|node| node.id.to_string()
                children=move |node| view! { <TreeNodeRow node=node depth=0 /> }
            />
        </div>
    }
}

#[component]
fn TreeNodeRow(node: TreeNode, depth: usize) -> impl IntoView {
    let ctx = use_app_context();
    let path = node.id.clone();
    let has_children = node.has_children();

    let starts_open = ctx.selected.with_untracked(|s| s.as_ref().is_some_and(|sel| path.is_ancestor_of(sel)));
    let (expanded, set_expanded) = signal(starts_open);
    let (children, set_children) = signal(Vec::<TreeNode>::new());
    let (loading, set_loading) = signal(false);
    // An older load finishing late must not replace newer children
    let loads = StoredValue::new(LatestOnly::default());

    // Open ancestors of whatever gets selected (history, recently used, search)
    let path_for_reveal = path.clone();
    Effect::new(move |_| {
        let reveal = ctx.selected.with(|s| s.as_ref().is_some_and(|sel| path_for_reveal.is_ancestor_of(sel)));
        if reveal && !expanded.get_untracked() {
            set_expanded.set(true);
        }
    });

    let path_for_load = path.clone();
    Effect::new(move |_| {
        let _ = ctx.tree_version.get();
        if !has_children || !expanded.get() {
            return;
        }
        let services = ctx.services();
        let target = LoadTarget::Path(path_for_load.clone());
        let ticket = loads.try_update_value(LatestOnly::issue).unwrap_or_default();
        set_loading.set(true);
        spawn_local(async move {
            let result = services.tree.load(&target).await;
            if !loads.try_with_value(|l| l.is_latest(ticket)).unwrap_or(false) {
                tracing::debug!(?target, "dropping superseded tree load");
                return;
            }
            match result {
                Ok(nodes) => set_children.set(nodes),
                Err(e) => ctx.report(&e),
            }
            set_loading.set(false);
        });
    });

    let path_for_select = path.clone();
    let path_for_class = path.clone();
    let is_selected = move || ctx.selected.with(|s| s.as_ref() == Some(&path_for_class));
    let indent = depth * 16;

    view! {
        <div class="tree-node">
            <div
                class="tree-row"
                class:selected=is_selected
                style=format!("padding-left: {}px;", indent)
                on:click=move |_| ctx.navigate(path_for_select.clone())
            >
                {if has_children {
                    view! {
                        <span
                            class="tree-toggle"
                            on:click=move |ev| {
                                ev.stop_propagation();
                                set_expanded.update(|e| *e = !*e);
                            }
                        >
                            {move || if expanded.get() { "▼" } else { "▶" }}
                        </span>
                    }.into_any()
                } else {
                    view! { <span class="tree-toggle-placeholder"></span> }.into_any()
                }}
                <i class=format!("tree-icon {}", node.icon)></i>
                <span class="tree-label" title=path.to_string()>{node.label.clone()}</span>
            </div>
            <Show when=move || expanded.get() && has_children>
                <Show when=move || !loading.get() || !children.with(Vec::is_empty) fallback=|| view! { <div class="loading small">"Loading..."</div> }>
                    {move || tree_children(children.get(), depth + 1)}
                </Show>
            </Show>
        </div>
    }
}

/// Boxed so the row can render itself recursively
fn tree_children(nodes: Vec<TreeNode>, depth: usize) -> AnyView {
    view! {
        <div class="tree-children">
            <For
                each=move || nodes.clone()
                key=|node| node.id.to_string()
                children=move |node| view! { <TreeNodeRow node=node depth=depth /> }
            />
        </div>
    }
    .into_any()
}
