//! Folder Panel
//!
//! Shown when a folder node is selected. Offers the creation form that
//! matches the folder: new types under Custom Types, global methods,
//! and members inside a type's collections.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::schema::{add_method, add_property, add_view, create_relationship, create_type, list, NewProperty, NewRelationship};
use crate::api::{ApiResult, Query};
use crate::components::field_specs::{MULTIPLICITIES, PROPERTY_TYPES};
use crate::context::{use_app_context, AppContext};
use crate::lifecycle::{Generation, PanelLifecycle};
use crate::models::{EntityKind, SchemaEntity};
use crate::path::{CodePath, MemberCollection, TreeRoot};

fn current_generation(ctx: AppContext) -> Generation {
    ctx.lifecycle.with_untracked(PanelLifecycle::generation)
}

/// Refresh the tree around a created entity and select it if the user stayed put
fn open_created(
    ctx: AppContext,
    generation: Generation,
    result: ApiResult<String>,
    path_of: impl FnOnce(String) -> Option<CodePath>,
) {
    match result {
        Ok(id) => match path_of(id) {
            Some(path) => ctx.open_created(path, generation),
            None => ctx.reload_tree(),
        },
        Err(e) => ctx.report(&e),
    }
}

#[component]
pub fn FolderPanel(path: CodePath) -> impl IntoView {
    let ctx = use_app_context();
    let title = match (path.member_collection(), path.working_set_id()) {
        (Some(collection), _) => collection.label().to_string(),
        (None, Some(_)) => "Working Set".to_string(),
        (None, None) => path.root().label().to_string(),
    };

    let body = match (path.root(), path.type_id(), path.member_collection()) {
        (TreeRoot::Custom, None, _) => view! {
            <NameForm
                placeholder="Type name"
                action="Create type"
                on_submit=move |name: String| {
                    let generation = current_generation(ctx);
                    let services = ctx.services();
                    spawn_local(async move {
                        let result = create_type(&*services.store, &name).await;
                        open_created(ctx, generation, result, |id| CodePath::new(TreeRoot::Custom).with_type(id));
                    });
                }
            />
        }
        .into_any(),
        (TreeRoot::Globals, None, _) => view! {
            <NameForm
                placeholder="Method name"
                action="Create global method"
                on_submit=move |name: String| {
                    let generation = current_generation(ctx);
                    let services = ctx.services();
                    spawn_local(async move {
                        let result = add_method(&*services.store, None, &name).await;
                        open_created(ctx, generation, result, |id| Some(CodePath::global_method(id)));
                    });
                }
            />
        }
        .into_any(),
        (_, Some(type_id), Some(collection)) => collection_form(ctx, path.clone(), type_id.to_string(), collection),
        _ => view! { <p class="folder-hint">"Select an element to edit it."</p> }.into_any(),
    };

    view! {
        <div class="folder-panel">
            <h2>{title}</h2>
            {body}
        </div>
    }
}

fn collection_form(ctx: AppContext, path: CodePath, type_id: String, collection: MemberCollection) -> AnyView {
    let path = StoredValue::new(path);
    let type_id = StoredValue::new(type_id);
    let under = move |id: String| path.with_value(|p| p.with_member(id));

    match collection {
        MemberCollection::Properties => view! { <NewPropertyForm path=path.get_value() type_id=type_id.get_value() /> }.into_any(),
        MemberCollection::RemoteProperties => {
            view! { <NewRelationshipForm path=path.get_value() type_id=type_id.get_value() /> }.into_any()
        }
        MemberCollection::Views => view! {
            <NameForm
                placeholder="View name"
                action="Add view"
                on_submit=move |name: String| {
                    let generation = current_generation(ctx);
                    let services = ctx.services();
                    spawn_local(async move {
                        let result = add_view(&*services.store, &type_id.get_value(), &name).await;
                        open_created(ctx, generation, result, under);
                    });
                }
            />
        }
        .into_any(),
        MemberCollection::Methods => view! {
            <NameForm
                placeholder="Method name"
                action="Add method"
                on_submit=move |name: String| {
                    let generation = current_generation(ctx);
                    let services = ctx.services();
                    spawn_local(async move {
                        let result = add_method(&*services.store, Some(&type_id.get_value()), &name).await;
                        open_created(ctx, generation, result, under);
                    });
                }
            />
        }
        .into_any(),
        MemberCollection::InheritedProperties => {
            view! { <p class="folder-hint">"Inherited attributes are edited on the type that declares them."</p> }.into_any()
        }
    }
}

/// Single-input creation form
#[component]
fn NameForm(
    #[prop(into)] placeholder: String,
    #[prop(into)] action: String,
    #[prop(into)] on_submit: Callback<String>,
) -> impl IntoView {
    let (name, set_name) = signal(String::new());

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let value = name.get_untracked().trim().to_string();
        if value.is_empty() {
            return;
        }
        set_name.set(String::new());
        on_submit.run(value);
    };

    view! {
        <form class="create-form" on:submit=submit>
            <input
                type="text"
                placeholder=placeholder
                prop:value=move || name.get()
                on:input=move |ev| set_name.set(event_target_value(&ev))
            />
            <button type="submit">{action}</button>
        </form>
    }
}

#[component]
fn NewPropertyForm(path: CodePath, type_id: String) -> impl IntoView {
    let ctx = use_app_context();
    let path = StoredValue::new(path);
    let type_id = StoredValue::new(type_id);
    let (name, set_name) = signal(String::new());
    let (property_type, set_property_type) = signal(PROPERTY_TYPES[0].to_string());
    let (unique, set_unique) = signal(false);

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let property = NewProperty {
            name: name.get_untracked().trim().to_string(),
            property_type: property_type.get_untracked(),
            unique: unique.get_untracked(),
        };
        if property.name.is_empty() {
            return;
        }
        set_name.set(String::new());
        let generation = current_generation(ctx);
        let services = ctx.services();
        spawn_local(async move {
            let result = add_property(&*services.store, &type_id.get_value(), &property).await;
            open_created(ctx, generation, result, |id| path.with_value(|p| p.with_member(id)));
        });
    };

    view! {
        <form class="create-form" on:submit=submit>
            <input
                type="text"
                placeholder="Attribute name"
                prop:value=move || name.get()
                on:input=move |ev| set_name.set(event_target_value(&ev))
            />
            <select prop:value=move || property_type.get() on:change=move |ev| set_property_type.set(event_target_value(&ev))>
                {PROPERTY_TYPES.iter().map(|t| view! { <option value=*t>{*t}</option> }).collect_view()}
            </select>
            <label class="inline">
                <input type="checkbox" prop:checked=move || unique.get() on:change=move |ev| set_unique.set(event_target_checked(&ev)) />
                "Unique"
            </label>
            <button type="submit">"Add attribute"</button>
        </form>
    }
}

#[component]
fn NewRelationshipForm(path: CodePath, type_id: String) -> impl IntoView {
    let ctx = use_app_context();
    let path = StoredValue::new(path);
    let source_id = StoredValue::new(type_id);
    let (targets, set_targets) = signal(Vec::<(String, String)>::new());
    let (target_id, set_target_id) = signal(String::new());
    let (relationship_type, set_relationship_type) = signal(String::new());
    let (source_multiplicity, set_source_multiplicity) = signal("1".to_string());
    let (target_multiplicity, set_target_multiplicity) = signal("*".to_string());
    let (source_json_name, set_source_json_name) = signal(String::new());
    let (target_json_name, set_target_json_name) = signal(String::new());

    let services = ctx.services();
    spawn_local(async move {
        let query = Query::new(EntityKind::SchemaNode).sort("name").page_size(services.config.page_size);
        match list(&*services.store, &query).await {
            Ok(types) => {
                let options: Vec<(String, String)> = types
                    .into_iter()
                    .filter_map(|t| match t {
                        SchemaEntity::Node(t) => Some((t.id, t.name)),
                        _ => None,
                    })
                    .collect();
                if let Some((first, _)) = options.first() {
                    set_target_id.set(first.clone());
                }
                set_targets.set(options);
            }
            Err(e) => ctx.report(&e),
        }
    });

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let relationship = NewRelationship {
            source_id: source_id.get_value(),
            target_id: target_id.get_untracked(),
            relationship_type: relationship_type.get_untracked().trim().to_string(),
            source_multiplicity: source_multiplicity.get_untracked(),
            target_multiplicity: target_multiplicity.get_untracked(),
            source_json_name: source_json_name.get_untracked().trim().to_string(),
            target_json_name: target_json_name.get_untracked().trim().to_string(),
        };
        if relationship.relationship_type.is_empty() || relationship.target_id.is_empty() {
            return;
        }
        set_relationship_type.set(String::new());
        let generation = current_generation(ctx);
        let services = ctx.services();
        spawn_local(async move {
            let result = create_relationship(&*services.store, &relationship).await;
            open_created(ctx, generation, result, |id| path.with_value(|p| p.with_member(id)));
        });
    };

    let multiplicity = move |value: ReadSignal<String>, set: WriteSignal<String>| {
        view! {
            <select prop:value=move || value.get() on:change=move |ev| set.set(event_target_value(&ev))>
                {MULTIPLICITIES.iter().map(|m| view! { <option value=*m>{*m}</option> }).collect_view()}
            </select>
        }
    };

    let text = move |placeholder: &'static str, value: ReadSignal<String>, set: WriteSignal<String>| {
        view! {
            <input
                type="text"
                placeholder=placeholder
                prop:value=move || value.get()
                on:input=move |ev| set.set(event_target_value(&ev))
            />
        }
    };

    view! {
        <form class="create-form relationship-form" on:submit=submit>
            {text("Relationship type", relationship_type, set_relationship_type)}
            <select prop:value=move || target_id.get() on:change=move |ev| set_target_id.set(event_target_value(&ev))>
                <For
                    each=move || targets.get()
                    key=|(id, _)| id.clone()
                    children=|(id, name)| view! { <option value=id>{name}</option> }
                />
            </select>
            {multiplicity(source_multiplicity, set_source_multiplicity)}
            {multiplicity(target_multiplicity, set_target_multiplicity)}
            {text("Source JSON name", source_json_name, set_source_json_name)}
            {text("Target JSON name", target_json_name, set_target_json_name)}
            <button type="submit">"Add relationship"</button>
        </form>
    }
}
