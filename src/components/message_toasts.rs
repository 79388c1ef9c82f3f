//! Toast messages
//!
//! Info and success toasts fade after a few seconds; warnings and errors
//! stay until dismissed.

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::store::{store_dismiss_message, use_app_store, AppStateStoreFields};

const AUTO_DISMISS_MS: u32 = 4_000;

#[component]
pub fn MessageToasts() -> impl IntoView {
    let store = use_app_store();

    view! {
        <div class="messages">
            <For
                each=move || store.messages().get()
                key=|message| message.id
                children=move |message| {
                    let id = message.id;
                    if message.level.auto_dismiss() {
                        spawn_local(async move {
                            TimeoutFuture::new(AUTO_DISMISS_MS).await;
                            store_dismiss_message(&store, id);
                        });
                    }
                    view! {
                        <div class=message.level.class()>
                            <span class="message-text">{message.text.clone()}</span>
                            <button class="message-dismiss" on:click=move |_| store_dismiss_message(&store, id)>
                                "×"
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}
