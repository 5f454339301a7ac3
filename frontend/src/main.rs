//! SchemView entry point

use std::sync::OnceLock;
use zoon::*;

/// Stores the main application task handle to prevent it from being dropped.
static MAIN_TASK: OnceLock<TaskHandle> = OnceLock::new();

mod app;
mod config;
mod controls;
mod dataflow;
mod dom;
mod logging;
mod panels;
mod schematic_view;
mod simulator_api;
mod theme;
mod widgets;

pub fn main() {
    logging::init();

    let handle = Task::start_droppable(async {
        let app = app::SchemViewApp::new();
        let root_element = app.root();
        start_app("app", move || root_element);
    });
    let _ = MAIN_TASK.set(handle);
}
