//! Service registry ("bloc repository").
//!
//! # Responsibilities
//! - Hold one shared instance per type
//! - Construct instances eagerly on registration when asked to
//! - Hand out `Arc` clones to widgets and matchers
//!
//! # Design Decisions
//! - Keyed by `TypeId`, so two distinct types never collide even if they
//!   share a name
//! - Re-registration replaces the previous instance, nothing is merged
//! - Lookups never construct; a missing type is an error

pub mod context;

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

pub use context::AppContext;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no instance of {type_name} registered")]
    NotRegistered { type_name: &'static str },
}

struct Entry {
    type_name: &'static str,
    // always an `Arc<T>` for the `T` the entry is keyed by
    instance: Box<dyn Any + Send + Sync>,
}

/// Type-keyed singleton store.
#[derive(Default)]
pub struct ServiceRegistry {
    services: DashMap<TypeId, Entry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `instance` as the singleton for `T` and return a shared handle.
    pub fn register<T>(&self, instance: T) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        let shared = Arc::new(instance);
        self.register_shared(shared.clone());
        shared
    }

    /// Store an already shared instance. `T` may be unsized, so a
    /// `dyn Trait` can be used as the key.
    pub fn register_shared<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let name = type_name::<T>();
        let previous = self.services.insert(
            TypeId::of::<T>(),
            Entry {
                type_name: name,
                instance: Box::new(instance),
            },
        );
        if previous.is_some() {
            tracing::debug!(service = name, "replaced registered instance");
        } else {
            tracing::trace!(service = name, "registered instance");
        }
    }

    /// Construct `T` through its `Default` impl and register it.
    pub fn register_default<T>(&self) -> Arc<T>
    where
        T: Default + Send + Sync + 'static,
    {
        self.register(T::default())
    }

    /// Construct `T` with `factory` right away and register it.
    pub fn register_with<T, F>(&self, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.register(factory())
    }

    /// The registered instance for `T`.
    pub fn of<T>(&self) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.instance.downcast_ref::<Arc<T>>().cloned())
            .ok_or(RegistryError::NotRegistered {
                type_name: type_name::<T>(),
            })
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.services.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Names of the registered types, for diagnostics.
    pub fn registered(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.services.iter().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.registered())
            .finish()
    }
}
