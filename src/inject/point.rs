//! # Injection points: declared requests the kernel resolves per service.
//!
//! An [`InjectionPoint`] pairs a field name with a directive and the typed
//! cell the resolved value lands in. Services enumerate their points from
//! [`Service::injection_points`](crate::Service::injection_points); the
//! kernel resolves every point right after constructing the instance and
//! before its Init hook runs.
//!
//! Points are usually built with the typed constructors:
//!
//! ```
//! use microkern::{Daemon, Dep, Flag, InjectionPoint, Section, Service};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct StoreSettings {
//!     root: String,
//! }
//!
//! #[derive(Default)]
//! struct Store {
//!     daemon: Dep<Daemon>,
//!     verbose: Flag<bool>,
//!     settings: Section<StoreSettings>,
//! }
//!
//! impl Service for Store {
//!     fn injection_points(&self) -> Vec<InjectionPoint> {
//!         vec![
//!             InjectionPoint::dependency("daemon", &self.daemon),
//!             InjectionPoint::flag("verbose", &self.verbose)
//!                 .described("Enable verbose output"),
//!             InjectionPoint::config("settings", &self.settings).in_section("store"),
//!         ]
//!     }
//! }
//! ```
//!
//! [`InjectionPoint::from_tag`] accepts the textual grammar instead, for
//! components that carry their wiring as data (see
//! [`Directive`](crate::Directive)).

use std::borrow::Cow;

use serde::de::DeserializeOwned;

use crate::config::DynamicConfig;
use crate::error::KernelError;
use crate::inject::directive::Directive;
use crate::inject::flags::{CellBind, FlagBind, FlagValue};
use crate::inject::{Dep, Flag, Section};
use crate::kernel::{BoxFuture, Kernel, Service, ServiceId};
use crate::worker::Worker;

/// Type-erased resolver that deploys or looks up a service and fills the
/// requesting cell.
pub(crate) trait Deploy: Send {
    fn deploy<'a>(
        self: Box<Self>,
        kernel: &'a mut Kernel,
    ) -> BoxFuture<'a, Result<(), KernelError>>;
}

struct DeployService<S: Service + Default> {
    slot: Dep<S>,
}

impl<S: Service + Default> Deploy for DeployService<S> {
    fn deploy<'a>(
        self: Box<Self>,
        kernel: &'a mut Kernel,
    ) -> BoxFuture<'a, Result<(), KernelError>> {
        Box::pin(async move {
            let service = kernel.add_service(S::default()).await?;
            self.slot.fill(service);
            Ok(())
        })
    }
}

struct BindCapability<A: ?Sized + Send + Sync + 'static> {
    slot: Dep<A>,
}

impl<A: ?Sized + Send + Sync + 'static> Deploy for BindCapability<A> {
    fn deploy<'a>(
        self: Box<Self>,
        kernel: &'a mut Kernel,
    ) -> BoxFuture<'a, Result<(), KernelError>> {
        Box::pin(async move {
            match kernel.api::<A>() {
                Some(instance) => {
                    self.slot.fill(instance);
                    Ok(())
                }
                None => Err(KernelError::UnknownCapability(ServiceId::of::<A>())),
            }
        })
    }
}

/// Type-erased registration of a config-section cell with the loader.
pub(crate) trait SectionBind: Send {
    fn register(
        self: Box<Self>,
        loader: &DynamicConfig,
        section: &str,
    ) -> Result<(), KernelError>;
}

struct BindSection<C> {
    slot: Section<C>,
}

impl<C> SectionBind for BindSection<C>
where
    C: DeserializeOwned + Default + Send + Sync + 'static,
{
    fn register(
        self: Box<Self>,
        loader: &DynamicConfig,
        section: &str,
    ) -> Result<(), KernelError> {
        loader.register_slot(section, self.slot)
    }
}

/// Resolved routing of one injection point.
pub(crate) enum Action {
    /// Deploy-or-resolve through the service index.
    Deploy(Box<dyn Deploy>),
    /// Look up a capability binding.
    Capability(Box<dyn Deploy>),
    /// Declare a command-line flag.
    Flag {
        name: Option<String>,
        description: Option<String>,
        default: Option<String>,
        bind: Box<dyn FlagBind>,
    },
    /// Join a named configuration section.
    Config {
        section: Option<String>,
        bind: Box<dyn SectionBind>,
    },
}

/// A declared request, on a service, for a value the container supplies.
pub struct InjectionPoint {
    field: Cow<'static, str>,
    action: Action,
}

impl InjectionPoint {
    /// Requests the service `S`, deploying it on first use.
    pub fn dependency<S: Service + Default>(
        field: impl Into<Cow<'static, str>>,
        slot: &Dep<S>,
    ) -> Self {
        Self {
            field: field.into(),
            action: Action::Deploy(Box::new(DeployService { slot: slot.clone() })),
        }
    }

    /// Requests the instance bound to the capability identity `A`.
    ///
    /// Capabilities are bound via
    /// [`Kernel::register_api`](crate::Kernel::register_api); an unbound
    /// capability fails resolution.
    pub fn capability<A: ?Sized + Send + Sync + 'static>(
        field: impl Into<Cow<'static, str>>,
        slot: &Dep<A>,
    ) -> Self {
        Self {
            field: field.into(),
            action: Action::Capability(Box::new(BindCapability { slot: slot.clone() })),
        }
    }

    /// Declares a command-line flag bound to `slot`.
    ///
    /// Name, description, and default fall back to the field name, the flag
    /// name, and the type's zero literal; override them with
    /// [`named`](Self::named), [`described`](Self::described), and
    /// [`with_default`](Self::with_default).
    pub fn flag<T: FlagValue>(field: impl Into<Cow<'static, str>>, slot: &Flag<T>) -> Self {
        Self {
            field: field.into(),
            action: Action::Flag {
                name: None,
                description: None,
                default: None,
                bind: Box::new(CellBind::new(slot)),
            },
        }
    }

    /// Joins the configuration section named after the field (override with
    /// [`in_section`](Self::in_section)), sharing one typed instance with
    /// every other registrant of that section.
    pub fn config<C>(field: impl Into<Cow<'static, str>>, slot: &Section<C>) -> Self
    where
        C: DeserializeOwned + Default + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            action: Action::Config {
                section: None,
                bind: Box::new(BindSection { slot: slot.clone() }),
            },
        }
    }

    /// Requests the shared [`Worker`], deploying it on first use.
    pub fn worker(field: impl Into<Cow<'static, str>>, slot: &Dep<Worker>) -> Self {
        Self {
            field: field.into(),
            action: Action::Deploy(Box::new(DeployService { slot: slot.clone() })),
        }
    }

    /// Builds a point from a textual directive tag (see
    /// [`Directive`]); the tag keyword must match the target cell kind.
    pub fn from_tag(
        field: impl Into<Cow<'static, str>>,
        tag: &str,
        target: Target,
    ) -> Result<Self, KernelError> {
        let field = field.into();
        let directive = Directive::parse(&field, tag)?;
        let action = match (directive, target.kind) {
            (Directive::Dependency, TargetKind::Service(deploy)) => Action::Deploy(deploy),
            (Directive::Dependency, TargetKind::Capability(deploy)) => Action::Capability(deploy),
            (Directive::Worker, TargetKind::Worker(deploy)) => Action::Deploy(deploy),
            (
                Directive::Flag {
                    name,
                    description,
                    default,
                },
                TargetKind::Flag(bind),
            ) => Action::Flag {
                name,
                description,
                default,
                bind,
            },
            (Directive::Config { section }, TargetKind::Config(bind)) => {
                Action::Config { section, bind }
            }
            (directive, _) => {
                return Err(KernelError::DirectiveMismatch {
                    field: field.to_string(),
                    directive: directive.keyword().to_string(),
                })
            }
        };
        Ok(Self { field, action })
    }

    /// Overrides the flag name (flag points only).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Action::Flag {
            name: ref mut slot, ..
        } = self.action
        {
            *slot = Some(name.into());
        }
        self
    }

    /// Sets the flag description (flag points only).
    pub fn described(mut self, text: impl Into<String>) -> Self {
        if let Action::Flag {
            ref mut description,
            ..
        } = self.action
        {
            *description = Some(text.into());
        }
        self
    }

    /// Sets the flag's default literal (flag points only); a literal the
    /// flag's type cannot parse fails the declaring service's deployment.
    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        if let Action::Flag {
            ref mut default, ..
        } = self.action
        {
            *default = Some(literal.into());
        }
        self
    }

    /// Overrides the section name (config points only).
    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        if let Action::Config {
            section: ref mut slot,
            ..
        } = self.action
        {
            *slot = Some(section.into());
        }
        self
    }

    /// The field this point is attached to.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub(crate) fn into_parts(self) -> (Cow<'static, str>, Action) {
        (self.field, self.action)
    }
}

impl std::fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let directive = match &self.action {
            Action::Deploy(_) => "dependency",
            Action::Capability(_) => "dependency",
            Action::Flag { .. } => "flag",
            Action::Config { .. } => "config",
        };
        f.debug_struct("InjectionPoint")
            .field("field", &self.field)
            .field("directive", &directive)
            .finish()
    }
}

/// Typed cell wrapper handed to [`InjectionPoint::from_tag`].
pub struct Target {
    kind: TargetKind,
}

enum TargetKind {
    Service(Box<dyn Deploy>),
    Capability(Box<dyn Deploy>),
    Flag(Box<dyn FlagBind>),
    Config(Box<dyn SectionBind>),
    Worker(Box<dyn Deploy>),
}

impl Target {
    /// A concrete-service dependency cell.
    pub fn dependency<S: Service + Default>(slot: &Dep<S>) -> Self {
        Self {
            kind: TargetKind::Service(Box::new(DeployService { slot: slot.clone() })),
        }
    }

    /// A capability-shaped dependency cell.
    pub fn capability<A: ?Sized + Send + Sync + 'static>(slot: &Dep<A>) -> Self {
        Self {
            kind: TargetKind::Capability(Box::new(BindCapability { slot: slot.clone() })),
        }
    }

    /// A flag cell.
    pub fn flag<T: FlagValue>(slot: &Flag<T>) -> Self {
        Self {
            kind: TargetKind::Flag(Box::new(CellBind::new(slot))),
        }
    }

    /// A config-section cell.
    pub fn config<C>(slot: &Section<C>) -> Self
    where
        C: DeserializeOwned + Default + Send + Sync + 'static,
    {
        Self {
            kind: TargetKind::Config(Box::new(BindSection { slot: slot.clone() })),
        }
    }

    /// The worker cell.
    pub fn worker(slot: &Dep<Worker>) -> Self {
        Self {
            kind: TargetKind::Worker(Box::new(DeployService::<Worker> { slot: slot.clone() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_routes_flag_params() {
        let cell: Flag<i64> = Flag::new();
        let point =
            InjectionPoint::from_tag("port", "flag,port,Listen port,8080", Target::flag(&cell))
                .expect("parse");
        assert_eq!(point.field(), "port");
        match point.into_parts().1 {
            Action::Flag { name, default, .. } => {
                assert_eq!(name.as_deref(), Some("port"));
                assert_eq!(default.as_deref(), Some("8080"));
            }
            _ => panic!("expected a flag action"),
        }
    }

    #[test]
    fn test_from_tag_rejects_unknown_keyword() {
        let cell: Flag<bool> = Flag::new();
        let err = InjectionPoint::from_tag("x", "autowire", Target::flag(&cell)).unwrap_err();
        assert_eq!(err.as_label(), "inject_unsupported_directive");
    }

    #[test]
    fn test_from_tag_rejects_keyword_target_mismatch() {
        let cell: Flag<bool> = Flag::new();
        let err = InjectionPoint::from_tag("x", "worker", Target::flag(&cell)).unwrap_err();
        assert_eq!(err.as_label(), "inject_directive_mismatch");
    }

    #[test]
    fn test_builders_shape_flag_and_config_points() {
        let flag: Flag<bool> = Flag::new();
        let point = InjectionPoint::flag("verbose", &flag)
            .named("v")
            .described("Verbose output")
            .with_default("true");
        match point.into_parts().1 {
            Action::Flag {
                name,
                description,
                default,
                ..
            } => {
                assert_eq!(name.as_deref(), Some("v"));
                assert_eq!(description.as_deref(), Some("Verbose output"));
                assert_eq!(default.as_deref(), Some("true"));
            }
            _ => panic!("expected a flag action"),
        }

        let section: Section<Vec<String>> = Section::new();
        let point = InjectionPoint::config("db", &section).in_section("database");
        match point.into_parts().1 {
            Action::Config { section, .. } => assert_eq!(section.as_deref(), Some("database")),
            _ => panic!("expected a config action"),
        }
    }
}
