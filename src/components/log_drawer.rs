//! Log drawer showing the in-memory log buffer

use leptos::prelude::*;
use rolling_logger::LogLine;

use crate::store::{use_app_store, AppStateStoreFields};

fn snapshot() -> Vec<LogLine> {
    rolling_logger::buffer().map(|b| b.snapshot()).unwrap_or_default()
}

#[component]
pub fn LogDrawer() -> impl IntoView {
    let store = use_app_store();
    let open = store.log_open();
    let (lines, set_lines) = signal(Vec::<LogLine>::new());

    Effect::new(move |_| {
        if open.get() {
            set_lines.set(snapshot());
        }
    });

    view! {
        <div class="log-drawer" class:open=move || open.get()>
            <div class="log-drawer-header">
                <button class="log-toggle" on:click=move |_| open.update(|o| *o = !*o)>
                    {move || if open.get() { "Hide log" } else { "Show log" }}
                </button>
                <Show when=move || open.get()>
                    <button class="log-refresh" on:click=move |_| set_lines.set(snapshot())>"Refresh"</button>
                    <button
                        class="log-clear"
                        on:click=move |_| {
                            if let Some(buffer) = rolling_logger::buffer() {
                                buffer.clear();
                            }
                            set_lines.set(Vec::new());
                        }
                    >
                        "Clear"
                    </button>
                </Show>
            </div>
            <Show when=move || open.get()>
                <pre class="log-lines">
                    {move || {
                        lines
                            .get()
                            .into_iter()
                            .map(|line| {
                                let class = format!("log-line level-{}", line.level.as_str().to_lowercase());
                                view! { <div class=class>{line.to_string()}</div> }
                            })
                            .collect_view()
                    }}
                </pre>
            </Show>
        </div>
    }
}
