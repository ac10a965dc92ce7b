use crate::domain::display::Display;
use crate::domain::ports::{View, WindowOpener, WindowSpec};
use crate::domain::session::WindowId;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A view that keeps every rendered display in memory.
///
/// Clones share the same history, so a clone handed to the controller can be
/// inspected from the outside.
#[derive(Default, Clone)]
pub struct InMemoryView {
    renders: Arc<RwLock<Vec<Display>>>,
}

impl InMemoryView {
    /// Creates a view with an empty render history.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn renders(&self) -> Vec<Display> {
        self.renders.read().await.clone()
    }

    pub async fn last(&self) -> Option<Display> {
        self.renders.read().await.last().cloned()
    }
}

#[async_trait]
impl View for InMemoryView {
    async fn render(&self, display: &Display) {
        let mut renders = self.renders.write().await;
        renders.push(display.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedWindow {
    pub id: WindowId,
    pub url: String,
    pub name: String,
    pub features: String,
}

#[derive(Default)]
struct WindowTable {
    next_id: u64,
    opened: Vec<OpenedWindow>,
    open: Vec<WindowId>,
    close_calls: HashMap<WindowId, usize>,
}

/// A window facility that only records what was opened and closed.
///
/// Closing an unknown or already closed window is a no-op apart from being
/// counted.
#[derive(Default, Clone)]
pub struct InMemoryWindowOpener {
    table: Arc<RwLock<WindowTable>>,
}

impl InMemoryWindowOpener {
    /// Creates an opener with no windows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every window ever opened, in order.
    pub async fn opened(&self) -> Vec<OpenedWindow> {
        self.table.read().await.opened.clone()
    }

    /// Windows opened and not closed yet.
    pub async fn open_windows(&self) -> Vec<WindowId> {
        self.table.read().await.open.clone()
    }

    /// How many times `close` was called for `window`.
    pub async fn close_calls(&self, window: WindowId) -> usize {
        let table = self.table.read().await;
        table.close_calls.get(&window).copied().unwrap_or(0)
    }
}

#[async_trait]
impl WindowOpener for InMemoryWindowOpener {
    async fn open(&self, url: &str, spec: &WindowSpec) -> Result<WindowId> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let id = WindowId(table.next_id);
        table.opened.push(OpenedWindow {
            id,
            url: url.to_string(),
            name: spec.name.clone(),
            features: spec.features(),
        });
        table.open.push(id);
        Ok(id)
    }

    async fn close(&self, window: WindowId) {
        let mut table = self.table.write().await;
        *table.close_calls.entry(window).or_default() += 1;
        table.open.retain(|id| *id != window);
    }
}
