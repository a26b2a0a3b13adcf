//! # Deferred-registration builder.
//!
//! [`KernelBuilder`] is the convenience entry point for the common case of
//! launching a handful of root services:
//!
//! ```no_run
//! use microkern::{Kernel, Service};
//!
//! #[derive(Default)]
//! struct App;
//! impl Service for App {}
//!
//! # async fn launch() -> Result<(), microkern::KernelError> {
//! Kernel::builder().register(App::default()).launch().await
//! # }
//! ```
//!
//! Registration order is preserved; each root is added in sequence, which
//! builds the full dependency graph transitively before the lifecycle
//! begins. The builder only ever appends to the kernel it constructs —
//! there is no implicit global container.

use std::ffi::OsString;

use crate::error::KernelError;
use crate::kernel::{BoxFuture, Kernel, Service};

trait DeferredService: Send {
    fn add<'a>(self: Box<Self>, kernel: &'a mut Kernel) -> BoxFuture<'a, Result<(), KernelError>>;
}

struct Root<S: Service>(S);

impl<S: Service> DeferredService for Root<S> {
    fn add<'a>(self: Box<Self>, kernel: &'a mut Kernel) -> BoxFuture<'a, Result<(), KernelError>> {
        let Root(service) = *self;
        Box::pin(async move { kernel.add_service(service).await.map(|_| ()) })
    }
}

/// Collects root services, then builds and launches a [`Kernel`].
#[derive(Default)]
pub struct KernelBuilder {
    roots: Vec<Box<dyn DeferredService>>,
}

impl KernelBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a root service; it is deployed when the kernel is built.
    pub fn register<S: Service>(mut self, service: S) -> Self {
        self.roots.push(Box::new(Root(service)));
        self
    }

    /// Builds the kernel by deploying every root in registration order.
    pub async fn build(self) -> Result<Kernel, KernelError> {
        let mut kernel = Kernel::new();
        for root in self.roots {
            root.add(&mut kernel).await?;
        }
        Ok(kernel)
    }

    /// Builds the kernel and runs the lifecycle with the process command
    /// line.
    pub async fn launch(self) -> Result<(), KernelError> {
        self.build().await?.launch().await
    }

    /// Builds the kernel and runs the lifecycle with an explicit argv.
    pub async fn launch_from<I, T>(self, args: I) -> Result<(), KernelError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.build().await?.launch_from(args).await
    }
}
