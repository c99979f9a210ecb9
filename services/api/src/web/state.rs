//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use cinema_core::ports::DatabaseService;
use minijinja::Environment;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub templates: Arc<Environment<'static>>,
}
