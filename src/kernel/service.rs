//! # Service contract and lifecycle capabilities.
//!
//! A [`Service`] is an opaque unit of application logic. It opts into the
//! lifecycle by implementing any subset of the capability traits and
//! surfacing them through the matching `as_*` accessor — the kernel checks
//! the accessors per deployed service instead of downcasting:
//!
//! | Capability | Hook | When |
//! |------------|------|------|
//! | [`Initializable`] | `init(&mut Kernel)` | at registration; may add dependencies |
//! | [`PostInitializable`] | `post_init()` | after all services deployed and flags parsed |
//! | [`Startable`] | `start()` | before the run phase; failure unwinds via stop |
//! | [`Stoppable`] | `stop()` | reverse start order, best effort |
//! | [`Runnable`] | `run()` | the program's main work |
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use microkern::{BoxError, Runnable, Service};
//!
//! #[derive(Default)]
//! struct Hello;
//!
//! impl Service for Hello {
//!     fn as_runnable(&self) -> Option<&dyn Runnable> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl Runnable for Hello {
//!     async fn run(&self) -> Result<(), BoxError> {
//!         println!("hello");
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::inject::InjectionPoint;
use crate::kernel::Kernel;

/// Shared handle to a deployed service.
pub type ServiceRef = Arc<dyn Service>;

/// A deployable unit of application logic.
///
/// Every method has a default, so the minimal service is an empty `impl`.
pub trait Service: Send + Sync + 'static {
    /// Explicit identity override; by default the concrete type identity
    /// is used.
    fn service_name(&self) -> Option<&str> {
        None
    }

    /// The injection requests the kernel resolves before `init` runs.
    fn injection_points(&self) -> Vec<InjectionPoint> {
        Vec::new()
    }

    /// Surfaces the Init capability.
    fn as_initializable(&self) -> Option<&dyn Initializable> {
        None
    }

    /// Surfaces the PostInit capability.
    fn as_post_initializable(&self) -> Option<&dyn PostInitializable> {
        None
    }

    /// Surfaces the Start capability.
    fn as_startable(&self) -> Option<&dyn Startable> {
        None
    }

    /// Surfaces the Stop capability.
    fn as_stoppable(&self) -> Option<&dyn Stoppable> {
        None
    }

    /// Surfaces the Run capability.
    fn as_runnable(&self) -> Option<&dyn Runnable> {
        None
    }
}

/// Registration-time initialisation; the service may register further
/// dependencies through the kernel it receives.
#[async_trait]
pub trait Initializable: Send + Sync {
    /// Called once, while the service is being deployed.
    async fn init(&self, kernel: &mut Kernel) -> Result<(), BoxError>;
}

/// Runs after every service is deployed and flags are parsed.
#[async_trait]
pub trait PostInitializable: Send + Sync {
    /// Called once per launch, in registration order.
    async fn post_init(&self) -> Result<(), BoxError>;
}

/// Brings a service up before the run phase.
#[async_trait]
pub trait Startable: Send + Sync {
    /// Called once per launch, in registration order.
    async fn start(&self) -> Result<(), BoxError>;
}

/// Cleans a service up during shutdown.
#[async_trait]
pub trait Stoppable: Send + Sync {
    /// Called once, in reverse start order. Best effort: failures cannot be
    /// reported and stops are not retried.
    async fn stop(&self);
}

/// Performs the program's main work.
#[async_trait]
pub trait Runnable: Send + Sync {
    /// Called once per launch, in registration order.
    async fn run(&self) -> Result<(), BoxError>;
}
