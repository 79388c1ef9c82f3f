//! UI Components
//!
//! Leptos components of the code area.

mod code_tree;
mod delete_confirm_button;
mod detail_panel;
pub mod field_specs;
mod folder_panel;
mod log_drawer;
mod message_toasts;
mod nav_buttons;
mod parameter_editor;
mod recently_used_bar;
mod resizer;
mod search_box;

pub use code_tree::CodeTree;
pub use delete_confirm_button::DeleteConfirmButton;
pub use detail_panel::DetailPanel;
pub use folder_panel::FolderPanel;
pub use log_drawer::LogDrawer;
pub use message_toasts::MessageToasts;
pub use nav_buttons::NavButtons;
pub use parameter_editor::ParameterEditor;
pub use recently_used_bar::RecentlyUsedBar;
pub use resizer::{use_pane_width, Resizer};
pub use search_box::SearchBox;
