//! # Service identity.
//!
//! Every deployed service is keyed by a [`ServiceId`]: either an explicit
//! name the service declares, or the structural identity of its concrete
//! type. The identity is what makes singleton deduplication work — two
//! unrelated services requesting the same identity observe the same
//! deployed instance.
//!
//! Capability registrations use the same identity type over the capability
//! trait object (`ServiceId::of::<dyn Store>()`).

use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use crate::kernel::Service;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum IdKey {
    Named(Cow<'static, str>),
    Typed(TypeId),
}

/// Unique key of a deployed service or a registered capability.
#[derive(Clone, Debug)]
pub struct ServiceId {
    key: IdKey,
    label: Cow<'static, str>,
}

impl ServiceId {
    /// Identity from an explicit name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        Self {
            key: IdKey::Named(name.clone()),
            label: name,
        }
    }

    /// Structural identity of a type — collision-resistant and stable for
    /// the life of the process. Works for trait objects too.
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            key: IdKey::Typed(TypeId::of::<S>()),
            label: Cow::Borrowed(type_name::<S>()),
        }
    }

    /// Derives the identity for a service instance: its explicit name when
    /// declared, its type identity otherwise.
    pub(crate) fn for_service<S: Service>(service: &S) -> Self {
        match service.service_name() {
            Some(name) => Self::named(name.to_owned()),
            None => Self::of::<S>(),
        }
    }
}

impl PartialEq for ServiceId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ServiceId {}

impl Hash for ServiceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}
