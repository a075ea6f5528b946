//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use vidya_core::ports::{BoardStore, Notifier};
use vidya_core::{QuestionBoard, SessionRegistry};

/// The shared application state, created once at startup and passed to all handlers.
///
/// The notifier is constructed explicitly and injected here rather than
/// living in a module-level global, so a test can build an `AppState`
/// with whatever store/notifier pair it wants.
#[derive(Clone)]
pub struct AppState {
    pub registry: SessionRegistry,
    pub board: QuestionBoard,
    pub store: Arc<dyn BoardStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn BoardStore>,
        notifier: Arc<dyn Notifier>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(store.clone(), notifier.clone()),
            board: QuestionBoard::new(store.clone(), notifier.clone()),
            store,
            notifier,
            config,
        }
    }
}
