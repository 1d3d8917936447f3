use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::{
    controllers::{EditorController, GeneratorController, MockupController},
    gemini::ImageGateway,
    models::View,
};

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub id: View,
    pub label: &'static str,
    pub description: &'static str,
    pub active: bool,
}

/// Owns the three screens and remembers which one is showing. Leaving a
/// screen keeps its state.
pub struct Shell {
    active: RwLock<View>,
    pub mockup: MockupController,
    pub editor: EditorController,
    pub generator: GeneratorController,
}

impl Shell {
    pub fn new(gateway: Arc<dyn ImageGateway>) -> Self {
        Self {
            active: RwLock::new(View::default()),
            mockup: MockupController::new(gateway.clone()),
            editor: EditorController::new(gateway.clone()),
            generator: GeneratorController::new(gateway),
        }
    }

    pub fn active(&self) -> View {
        *self.active.read()
    }

    /// Returns the view that was showing before.
    pub fn navigate(&self, view: View) -> View {
        let previous = std::mem::replace(&mut *self.active.write(), view);
        if previous != view {
            info!(from = %previous, to = %view, "navigated");
        }
        previous
    }

    pub fn nav_items(&self) -> Vec<NavItem> {
        let active = self.active();
        View::ALL
            .into_iter()
            .map(|id| NavItem { id, label: id.label(), description: id.description(), active: id == active })
            .collect()
    }
}
