//! Service container: identity, lifecycle capabilities, and launch.

mod builder;
mod container;
mod identity;
mod service;
mod signals;

pub use builder::KernelBuilder;
pub use container::Kernel;
pub use identity::ServiceId;
pub use service::{
    Initializable, PostInitializable, Runnable, Service, ServiceRef, Startable, Stoppable,
};

pub(crate) type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;
