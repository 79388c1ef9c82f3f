//! Recently Used Bar
//!
//! One button per recently visited entity, most recent first.

use leptos::prelude::*;

use crate::context::use_app_context;
use crate::path::CodePath;
use crate::store::AppStateStoreFields;

#[component]
pub fn RecentlyUsedBar() -> impl IntoView {
    let ctx = use_app_context();
    let recent = ctx.app_store.recent();

    view! {
        <div class="recently-used">
            <For
                each=move || recent.get()
                key=|entry| entry.id.clone()
                children=move |entry| {
                    let id = entry.id.clone();
                    let raw_path = entry.path.clone();
                    let open = move |_| match CodePath::parse(&raw_path) {
                        Ok(path) => ctx.navigate(path),
                        Err(e) => {
                            tracing::warn!(path = %raw_path, error = %e, "dropping unreadable recent entry");
                            ctx.remove_recent(&id);
                        }
                    };
                    let id_for_remove = entry.id.clone();
                    view! {
                        <div class="recently-used-entry" title=entry.path.clone()>
                            <button class="recently-used-open" on:click=open>
                                <i class=entry.icon_class.clone()></i>
                                <span>{entry.name.clone()}</span>
                            </button>
                            <button
                                class="recently-used-remove"
                                on:click=move |ev| {
                                    ev.stop_propagation();
                                    ctx.remove_recent(&id_for_remove);
                                }
                            >
                                "×"
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}
