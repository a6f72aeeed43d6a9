//! Application context handed to every widget.

use crate::registry::ServiceRegistry;

/// One per running application. Widgets reach shared services through it.
#[derive(Debug, Default)]
pub struct AppContext {
    blocs: ServiceRegistry,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(blocs: ServiceRegistry) -> Self {
        Self { blocs }
    }

    /// The service registry.
    pub fn blocs(&self) -> &ServiceRegistry {
        &self.blocs
    }
}
