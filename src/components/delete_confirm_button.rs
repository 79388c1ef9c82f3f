//! Delete Confirm Button Component
//!
//! Inline confirmation for destructive schema actions.

use leptos::prelude::*;

/// Shows a delete button; a click asks "Delete {what}?" with confirm/cancel.
/// Cancelling has no side effect.
#[component]
pub fn DeleteConfirmButton(
    #[prop(into)] what: String,
    #[prop(into)] on_confirm: Callback<()>,
) -> impl IntoView {
    let (confirm_delete, set_confirm_delete) = signal(false);
    let question = format!("Delete {}?", what);

    view! {
        <Show when=move || !confirm_delete.get()>
            <button
                class="delete-btn"
                on:click=move |ev| {
                    ev.stop_propagation();
                    set_confirm_delete.set(true);
                }
            >
                "Delete"
            </button>
        </Show>
        <Show when=move || confirm_delete.get()>
            <span class="delete-confirm">
                <span class="delete-confirm-text">{question.clone()}</span>
                <button
                    class="confirm-btn"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        set_confirm_delete.set(false);
                        on_confirm.run(());
                    }
                >
                    "Yes, delete"
                </button>
                <button
                    class="cancel-btn"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        set_confirm_delete.set(false);
                    }
                >
                    "Cancel"
                </button>
            </span>
        </Show>
    }
}
