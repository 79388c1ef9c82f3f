//! Detail Panel
//!
//! Edits the entity selected in the tree. Inputs are bound to attributes
//! through the field tables; the dirty tracker compares them with the
//! snapshot the entity was loaded with and drives Save/Cancel.

use std::collections::BTreeSet;

use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::{Map, Value};

use crate::api::schema::{delete_entity, fetch_entity, fetch_schema_info, run_global_method, save_parameters, update_entity};
use crate::components::field_specs::{bound_keys, fields_for, tabs_for, FieldInput, FieldSpec, PanelTab};
use crate::components::{DeleteConfirmButton, FolderPanel, ParameterEditor};
use crate::context::{use_app_context, AppContext};
use crate::dirty::{changes_to_json, collect, parameters_changed, parse_list, DirtyStateTracker, FieldValue, FormState};
use crate::lifecycle::{PanelLifecycle, PanelState};
use crate::method_docs::{highlight_source, render_method_docs};
use crate::models::{EntityKind, SchemaEntity, SchemaMethod};
use crate::path::CodePath;
use crate::storage::KeyValueStorage;
use crate::store::MessageLevel;

/// Attributes whose change alters tree labels
const LABEL_KEYS: &[&str] = &["name", "relationshipType", "sourceJsonName", "targetJsonName"];

#[component]
pub fn DetailPanel() -> impl IntoView {
    let ctx = use_app_context();
    let loading = Memo::new(move |_| ctx.lifecycle.with(|l| matches!(l.state(), PanelState::Loading { .. })));

    view! {
        <section class="detail-panel">
            {move || {
                if ctx.session_expired.get() {
                    return view! { <div class="session-expired">"Your session has expired. Please log in again."</div> }.into_any();
                }
                let Some(path) = ctx.selected.get() else {
                    return view! { <div class="detail-empty">"Select an element in the tree."</div> }.into_any();
                };
                match ctx.entity.get() {
                    Some(entity) => view! { <EntityEditor path=path entity=entity /> }.into_any(),
                    None if loading.get() => view! { <div class="loading">"Loading..."</div> }.into_any(),
                    None if path.target().is_some() => view! { <div class="detail-empty">"This element no longer exists."</div> }.into_any(),
                    None => view! { <FolderPanel path=path /> }.into_any(),
                }
            }}
        </section>
    }
}

#[component]
fn EntityEditor(path: CodePath, entity: SchemaEntity) -> impl IntoView {
    let ctx = use_app_context();
    let kind = entity.kind();
    let title = entity.name();
    let entity_id = StoredValue::new(entity.id().to_string());
    let path = StoredValue::new(path);
    let snapshot = StoredValue::new(entity.snapshot());
    let method = StoredValue::new(match &entity {
        SchemaEntity::Method(m) => Some(m.clone()),
        _ => None,
    });

    let form = RwSignal::new(snapshot.with_value(|s| FormState::from_snapshot(bound_keys(kind), s)));
    let tracker = StoredValue::new(DirtyStateTracker::new());
    let changed = RwSignal::new(BTreeSet::<String>::new());
    let invalid = RwSignal::new(BTreeSet::<String>::new());
    let dirty = RwSignal::new(false);
    let saving = RwSignal::new(false);

    // Method parameters are a sub-form with their own dirty check
    let baseline = StoredValue::new(method.with_value(|m| m.as_ref().map(|m| m.parameters.clone()).unwrap_or_default()));
    let params = RwSignal::new(baseline.get_value());
    if kind == EntityKind::SchemaMethod {
        tracker.update_value(|t| {
            t.add_check(move || baseline.with_value(|b| params.with_untracked(|p| parameters_changed(b, p))))
        });
    }

    let recompute = move || {
        let (now_changed, now_dirty) = tracker
            .try_update_value(|t| {
                form.with_untracked(|f| snapshot.with_value(|s| {
                    t.update(f, s);
                }));
                (t.changed().clone(), t.is_dirty())
            })
            .unwrap_or_default();
        changed.set(now_changed);
        dirty.set(now_dirty);
        ctx.lifecycle.update(|l| l.mark_dirty(now_dirty));
    };

    let on_input = move |key: &'static str, value: FieldValue| {
        form.update(|f| f.set(key, value));
        invalid.update(|i| {
            i.remove(key);
        });
        recompute();
    };

    let save = move || {
        if saving.get_untracked() || !dirty.get_untracked() {
            return;
        }
        let changes = form.with_untracked(|f| snapshot.with_value(|s| collect(f, s)));
        let relabel = LABEL_KEYS.iter().any(|k| changes.contains_key(*k));
        let body = changes_to_json(&changes);
        let new_params = params.get_untracked();
        let params_dirty = kind == EntityKind::SchemaMethod && baseline.with_value(|b| parameters_changed(b, &new_params));

        let generation = ctx.lifecycle.with_untracked(PanelLifecycle::generation);
        let services = ctx.services();
        let id = entity_id.get_value();
        saving.set(true);
        spawn_local(async move {
            let store = &*services.store;
            let result = async {
                update_entity(store, kind, &id, body).await?;
                if params_dirty {
                    save_parameters(store, &id, &new_params).await?;
                }
                fetch_entity(store, kind, &id).await
            }
            .await;

            if !ctx.lifecycle.with_untracked(|l| l.is_current(generation)) {
                tracing::debug!(%id, "panel changed while saving, result not shown");
                return;
            }
            saving.set(false);
            match result {
                Ok(Some(refreshed)) => {
                    ctx.lifecycle.update(PanelLifecycle::saved);
                    ctx.notify(MessageLevel::Success, "Saved.");
                    if relabel {
                        ctx.reload_tree();
                    }
                    ctx.entity.set(Some(refreshed));
                }
                Ok(None) => ctx.forget(&path.get_value(), &id, generation),
                Err(e) => {
                    // Keep the local form; mark what the server rejected
                    invalid.set(e.invalid_properties().iter().cloned().collect());
                    ctx.report(&e);
                }
            }
        });
    };

    let revert = move || {
        if let Some(restored) = tracker.try_update_value(|t| form.with_untracked(|f| snapshot.with_value(|s| t.revert(f, s)))) {
            form.set(restored);
        }
        params.set(baseline.get_value());
        invalid.set(BTreeSet::new());
        recompute();
        ctx.lifecycle.update(PanelLifecycle::reverted);
    };

    let delete = move || {
        let generation = ctx.lifecycle.with_untracked(PanelLifecycle::generation);
        let services = ctx.services();
        let id = entity_id.get_value();
        let target = path.get_value();
        spawn_local(async move {
            match delete_entity(&*services.store, kind, &id).await {
                Ok(()) => {
                    ctx.notify(MessageLevel::Success, "Deleted.");
                    ctx.forget(&target, &id, generation);
                }
                Err(e) => ctx.report(&e),
            }
        });
    };

    // Ctrl+S saves
    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        if (ev.ctrl_key() || ev.meta_key()) && ev.key() == "s" {
            ev.prevent_default();
            save();
        }
    };

    let active_tab = RwSignal::new(stored_tab(ctx, kind, &entity_id.get_value()));
    let select_tab = move |tab: PanelTab| {
        active_tab.set(tab);
        let services = ctx.services();
        if let Err(e) = services.storage.set(&services.keys.active_tab(&entity_id.get_value()), tab.as_str()) {
            tracing::warn!("could not remember tab: {}", e);
        }
    };

    let is_global_method = method.with_value(|m| m.as_ref().is_some_and(SchemaMethod::is_global));
    let endpoints = match &entity {
        SchemaEntity::Relationship(r) => Some(format!(
            "{} → {}",
            r.source.name.clone().unwrap_or_else(|| r.source.id.clone()),
            r.target.name.clone().unwrap_or_else(|| r.target.id.clone())
        )),
        _ => None,
    };
    let owner = match &entity {
        SchemaEntity::Relationship(_) => None,
        member => member.owner().map(|t| t.name.clone().unwrap_or_else(|| t.id.clone())),
    };
    let type_name = match &entity {
        SchemaEntity::Node(t) => Some(t.name.clone()),
        _ => None,
    };

    let tab_content = move |tab: PanelTab| -> AnyView {
        match tab {
            PanelTab::Parameters => {
                view! { <ParameterEditor parameters=params on_change=move |_: ()| recompute() /> }.into_any()
            }
            PanelTab::Docs => {
                let html = method.with_value(|m| m.as_ref().map(render_method_docs).unwrap_or_default());
                view! { <div class="method-docs" inner_html=html></div> }.into_any()
            }
            PanelTab::Schema => match type_name.clone() {
                Some(name) => view! { <RuntimeSchema type_name=name /> }.into_any(),
                None => ().into_any(),
            },
            other => {
                let fields: Vec<FieldSpec> = fields_for(kind).iter().copied().filter(|f| f.tab == other).collect();
                let preview = (other == PanelTab::Source).then(|| {
                    view! {
                        <details class="source-preview">
                            <summary>"Highlighted preview"</summary>
                            <div inner_html=move || {
                                let source = form.with(|f| f.get("source").map(FieldValue::as_text).unwrap_or_default());
                                method.with_value(|m| {
                                    let code_type = m.as_ref().and_then(|m| m.code_type.clone());
                                    highlight_source(&SchemaMethod { source: Some(source), code_type, ..SchemaMethod::default() })
                                })
                            }></div>
                        </details>
                    }
                });
                view! {
                    <div class="fields">
                        {fields.into_iter().map(|spec| field_view(spec, form, changed, invalid, on_input)).collect_view()}
                    </div>
                    {preview}
                }
                .into_any()
            }
        }
    };

    view! {
        <div class="entity-editor" on:keydown=on_keydown>
            <header class="detail-header">
                <i class=kind.icon_class()></i>
                <h2>{title.clone()}</h2>
                <span class="detail-path">{path.get_value().to_string()}</span>
                {endpoints.map(|e| view! { <span class="relationship-endpoints">{e}</span> })}
                {owner.map(|o| view! { <span class="detail-owner">{o}</span> })}
                <div class="detail-actions">
                    <button class="save-btn" disabled=move || !dirty.get() || saving.get() on:click=move |_| save()>
                        {move || if saving.get() { "Saving..." } else { "Save" }}
                    </button>
                    <button class="cancel-btn" disabled=move || !dirty.get() || saving.get() on:click=move |_| revert()>
                        "Revert"
                    </button>
                    {is_global_method.then(|| view! { <RunMethodButton name=title.clone() /> })}
                    <DeleteConfirmButton what=title.clone() on_confirm=move |_: ()| delete() />
                </div>
            </header>
            <nav class="detail-tabs">
                {tabs_for(kind)
                    .iter()
                    .copied()
                    .map(|tab| {
                        view! {
                            <button
                                class="tab"
                                class:active=move || active_tab.get() == tab
                                on:click=move |_| select_tab(tab)
                            >
                                {tab.label()}
                            </button>
                        }
                    })
                    .collect_view()}
            </nav>
            <div class="tab-content">{move || tab_content(active_tab.get())}</div>
        </div>
    }
}

fn stored_tab(ctx: AppContext, kind: EntityKind, entity_id: &str) -> PanelTab {
    let tabs = tabs_for(kind);
    let services = ctx.services();
    services
        .storage
        .get(&services.keys.active_tab(entity_id))
        .and_then(|name| PanelTab::parse(&name))
        .filter(|tab| tabs.contains(tab))
        .unwrap_or(tabs[0])
}

fn field_view(
    spec: FieldSpec,
    form: RwSignal<FormState>,
    changed: RwSignal<BTreeSet<String>>,
    invalid: RwSignal<BTreeSet<String>>,
    on_input: impl Fn(&'static str, FieldValue) + Copy + 'static,
) -> AnyView {
    let key = spec.key;
    let text = move || form.with(|f| f.get(key).map(FieldValue::as_text).unwrap_or_default());

    let input = match spec.input {
        FieldInput::Text => view! {
            <input type="text" data-property=key prop:value=text on:input=move |ev| on_input(key, FieldValue::text(event_target_value(&ev))) />
        }
        .into_any(),
        FieldInput::TextArea => view! {
            <textarea data-property=key prop:value=text on:input=move |ev| on_input(key, FieldValue::text(event_target_value(&ev)))></textarea>
        }
        .into_any(),
        FieldInput::Code => view! {
            <textarea
                class="code-editor"
                spellcheck="false"
                data-property=key
                prop:value=text
                on:input=move |ev| on_input(key, FieldValue::text(event_target_value(&ev)))
            ></textarea>
        }
        .into_any(),
        FieldInput::Checkbox => view! {
            <input
                type="checkbox"
                data-property=key
                prop:checked=move || form.with(|f| f.get(key).is_some_and(FieldValue::as_bool))
                on:change=move |ev| on_input(key, FieldValue::Bool(event_target_checked(&ev)))
            />
        }
        .into_any(),
        FieldInput::Select(options) => view! {
            <select data-property=key prop:value=text on:change=move |ev| on_input(key, FieldValue::text(event_target_value(&ev)))>
                <option value="">""</option>
                {options.iter().map(|o| view! { <option value=*o>{*o}</option> }).collect_view()}
            </select>
        }
        .into_any(),
        FieldInput::Tags => view! {
            <input type="text" class="tags-input" data-property=key prop:value=text on:input=move |ev| on_input(key, parse_list(&event_target_value(&ev))) />
        }
        .into_any(),
    };

    view! {
        <div
            class="field"
            class:has-changes=move || changed.with(|c| c.contains(key))
            class:has-error=move || invalid.with(|i| i.contains(key))
        >
            <label>{spec.label}</label>
            {input}
        </div>
    }
    .into_any()
}

/// Property descriptors the server compiled for a type
#[component]
fn RuntimeSchema(type_name: String) -> impl IntoView {
    let ctx = use_app_context();
    let (rows, set_rows) = signal(Option::<Vec<Map<String, Value>>>::None);

    let services = ctx.services();
    spawn_local(async move {
        match fetch_schema_info(&*services.store, &type_name).await {
            Ok(info) => set_rows.set(Some(
                info.into_iter()
                    .filter_map(|v| match v {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect(),
            )),
            Err(e) => {
                set_rows.set(Some(Vec::new()));
                ctx.report(&e);
            }
        }
    });

    let cell = |row: &Map<String, Value>, key: &str| row.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

    view! {
        {move || match rows.get() {
            None => view! { <div class="loading small">"Loading..."</div> }.into_any(),
            Some(rows) => view! {
                <table class="runtime-schema">
                    <thead>
                        <tr><th>"JSON Name"</th><th>"Type"</th><th>"Declared by"</th></tr>
                    </thead>
                    <tbody>
                        {rows
                            .iter()
                            .map(|row| view! {
                                <tr>
                                    <td>{cell(row, "jsonName")}</td>
                                    <td>{cell(row, "type")}</td>
                                    <td>{cell(row, "declaringClass")}</td>
                                </tr>
                            })
                            .collect_view()}
                    </tbody>
                </table>
            }
            .into_any(),
        }}
    }
}

#[component]
fn RunMethodButton(name: String) -> impl IntoView {
    let ctx = use_app_context();
    let running = RwSignal::new(false);
    let name = StoredValue::new(name);

    let run = move |_| {
        running.set(true);
        let services = ctx.services();
        let name = name.get_value();
        spawn_local(async move {
            let result = run_global_method(&*services.store, &name, Value::Object(Map::new())).await;
            running.set(false);
            match result {
                Ok(value) => ctx.notify(MessageLevel::Info, format!("{} returned {}", name, value)),
                Err(e) if e.is_fatal() => ctx.report(&e),
                Err(e) => ctx.notify(MessageLevel::Error, format!("{} failed: {}", name, e)),
            }
        });
    };

    view! {
        <button class="run-btn" disabled=move || running.get() on:click=run>
            {move || if running.get() { "Running..." } else { "Run" }}
        </button>
    }
}
