// Application state module
// Everything a connection task needs, built once at startup and shared read-only

use super::types::Settings;
use crate::handler::Dispatcher;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub const fn new(settings: Settings, dispatcher: Dispatcher) -> Self {
        Self {
            settings,
            dispatcher,
        }
    }
}
