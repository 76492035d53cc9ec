//! Ratatui front-end: one list screen plus modal dialogs for every user
//! intent. The submodules keep presentation state separate from the
//! persistence layer, which only ever hands plain records across.

mod app;
mod detail;
mod forms;
mod helpers;
mod picker;
mod terminal;

pub use app::App;
pub use detail::DetailOutcome;
pub use terminal::run_app;
