//! # Shared cells filled by the injection engine.
//!
//! A service declares what it wants by embedding cells in its fields and
//! enumerating them from
//! [`Service::injection_points`](crate::Service::injection_points):
//!
//! - [`Dep<S>`] — a dependency slot, filled with the deployed `Arc<S>`
//!   (`Dep<dyn Capability>` works the same way for capability-shaped
//!   identities bound via [`Kernel::register_api`](crate::Kernel::register_api));
//! - [`Flag<T>`] — a command-line flag slot, bound when flags are parsed;
//! - [`Section<C>`] — a config-section slot, sharing one typed instance
//!   with every other registrant of the same section name.
//!
//! Cells are cloneable handles over a shared interior, so the engine can
//! fill the cell through the descriptor a service handed out while the
//! service keeps reading through its own field — no access to private
//! state is ever needed.
//!
//! Accessors panic when read before the kernel resolved them; that is a
//! contract violation (reading a dependency before `launch`), not a
//! recoverable condition. `try_get` variants exist for probing.

use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Dependency slot, filled with the deployed service instance.
pub struct Dep<S: ?Sized>(Arc<OnceLock<Arc<S>>>);

impl<S: ?Sized> Clone for Dep<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S: ?Sized> Default for Dep<S> {
    fn default() -> Self {
        Self(Arc::new(OnceLock::new()))
    }
}

impl<S: ?Sized> Dep<S> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved instance.
    ///
    /// Valid once the owning service has been deployed; panics before that.
    pub fn get(&self) -> &Arc<S> {
        self.0
            .get()
            .expect("dependency slot read before injection resolved it")
    }

    /// The resolved instance, or `None` before injection.
    pub fn try_get(&self) -> Option<&Arc<S>> {
        self.0.get()
    }

    pub(crate) fn fill(&self, value: Arc<S>) {
        let _ = self.0.set(value);
    }
}

impl<S: ?Sized> std::fmt::Debug for Dep<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("resolved", &self.0.get().is_some())
            .finish()
    }
}

/// Command-line flag slot, bound to the parsed value.
pub struct Flag<T>(Arc<OnceLock<T>>);

impl<T> Clone for Flag<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Flag<T> {
    fn default() -> Self {
        Self(Arc::new(OnceLock::new()))
    }
}

impl<T> Flag<T> {
    /// Creates an unbound slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The parsed flag value.
    ///
    /// Valid once `launch` has parsed the command line; panics before that.
    pub fn get(&self) -> &T {
        self.0
            .get()
            .expect("flag slot read before command-line parsing")
    }

    /// The parsed value, or `None` before parsing.
    pub fn try_get(&self) -> Option<&T> {
        self.0.get()
    }

    pub(crate) fn bind(&self, value: T) {
        let _ = self.0.set(value);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Flag<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flag").field("value", &self.0.get()).finish()
    }
}

/// Config-section slot; all registrants of one section name share the
/// instance behind it.
pub struct Section<C>(Arc<OnceLock<Arc<RwLock<C>>>>);

impl<C> Clone for Section<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C> Default for Section<C> {
    fn default() -> Self {
        Self(Arc::new(OnceLock::new()))
    }
}

impl<C> Section<C> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared section instance.
    ///
    /// Valid once the owning service has been deployed; panics before that.
    pub fn handle(&self) -> &Arc<RwLock<C>> {
        self.0
            .get()
            .expect("config section slot read before injection resolved it")
    }

    /// The shared instance, or `None` before injection.
    pub fn try_handle(&self) -> Option<&Arc<RwLock<C>>> {
        self.0.get()
    }

    /// Read access to the shared section data.
    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.handle().read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the shared section data.
    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.handle()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn fill(&self, shared: Arc<RwLock<C>>) {
        let _ = self.0.set(shared);
    }
}

impl<C> std::fmt::Debug for Section<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Section")
            .field("resolved", &self.0.get().is_some())
            .finish()
    }
}
