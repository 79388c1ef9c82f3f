//! Back / forward buttons over the navigation history

use leptos::prelude::*;

use crate::context::use_app_context;
use crate::navigation::NavigationStack;

#[component]
pub fn NavButtons() -> impl IntoView {
    let ctx = use_app_context();
    let can_back = move || ctx.navigation.with(NavigationStack::can_go_back);
    let can_forward = move || ctx.navigation.with(NavigationStack::can_go_forward);
    let back_title = move || ctx.navigation.with(|n| n.peek_backward().map(|p| p.to_string()).unwrap_or_default());
    let forward_title = move || ctx.navigation.with(|n| n.peek_forward().map(|p| p.to_string()).unwrap_or_default());

    view! {
        <div class="nav-buttons">
            <button
                class="nav-back"
                disabled=move || !can_back()
                title=back_title
                on:click=move |_| ctx.go_back()
            >
                "◀"
            </button>
            <button
                class="nav-forward"
                disabled=move || !can_forward()
                title=forward_title
                on:click=move |_| ctx.go_forward()
            >
                "▶"
            </button>
        </div>
    }
}
