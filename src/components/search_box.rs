//! Search Box
//!
//! Enter runs the federated search; Escape or the clear button ends it.

use leptos::prelude::*;

use crate::context::use_app_context;
use crate::store::AppStateStoreFields;

#[component]
pub fn SearchBox() -> impl IntoView {
    let ctx = use_app_context();
    let (input, set_input) = signal(String::new());
    let searching = ctx.app_store.searching();
    let active_term = ctx.app_store.search_term();

    let clear = move || {
        set_input.set(String::new());
        ctx.clear_search();
    };

    view! {
        <div class="search-box" class:searching=move || searching.get()>
            <input
                type="search"
                placeholder="Search types, properties, methods..."
                prop:value=move || input.get()
                on:input=move |ev| set_input.set(event_target_value(&ev))
                on:keyup=move |ev: web_sys::KeyboardEvent| match ev.key().as_str() {
                    "Enter" => ctx.search(input.get_untracked()),
                    "Escape" => clear(),
                    _ => {}
                }
            />
            <Show when=move || !active_term.get().is_empty()>
                <button class="search-clear" title="Clear search" on:click=move |_| clear()>"×"</button>
            </Show>
            <Show when=move || searching.get()>
                <span class="loading small">"Searching..."</span>
            </Show>
        </div>
    }
}
