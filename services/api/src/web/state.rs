//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use meridian_core::ports::{DatabaseService, RealtimeService, StorageService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub storage: Arc<dyn StorageService>,
    pub realtime: Arc<dyn RealtimeService>,
    pub config: Arc<Config>,
}
