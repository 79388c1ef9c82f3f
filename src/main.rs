//! Schema Code Frontend Entry Point

mod api;
mod app;
mod components;
mod config;
mod context;
mod dirty;
mod lifecycle;
mod method_docs;
mod models;
mod navigation;
mod path;
mod recent;
#[cfg(test)]
mod scenarios;
mod search;
mod storage;
mod store;
mod tree_source;

use app::App;
use config::UiConfig;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();

    let (config, rejected) = UiConfig::from_environment();
    rolling_logger::init(config.level_filter(), config.log_capacity);
    if let Some(e) = rejected {
        tracing::warn!(error = %e, "ignoring malformed UI configuration");
    }
    tracing::info!(server = %config.server_base, port = %config.port, "starting code area");

    mount_to_body(move || view! { <App config=config.clone() /> });
}
