//! Error types used by the kernel runtime and by tasks.
//!
//! This module defines two main error enums:
//!
//! - [`KernelError`] — errors raised by the container itself: registration,
//!   injection, flag parsing, configuration, and lifecycle phase failures.
//! - [`TaskError`] — errors raised by individual task executions on the
//!   worker queue.
//!
//! Both types provide an `as_label` helper returning a short stable label
//! for logging. Lifecycle hooks on services return [`BoxError`]; the kernel
//! wraps hook failures into [`KernelError::Phase`] so the failing phase and
//! service identity are preserved alongside the source error.

use thiserror::Error;

use crate::kernel::ServiceId;

/// Boxed error type returned by service lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lifecycle phases driven by [`Kernel::launch`](crate::Kernel::launch).
///
/// Phases run in declaration order; `Init` runs per service at registration
/// time, the remaining phases run over the whole deployed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Registration-time initialisation; a service may register further
    /// dependencies here.
    Init,
    /// Runs after every service is deployed and flags are parsed.
    PostInit,
    /// Brings services up; a failure here triggers the stop sequence.
    Start,
    /// The main work phase.
    Run,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Init => write!(f, "init"),
            Phase::PostInit => write!(f, "post-init"),
            Phase::Start => write!(f, "start"),
            Phase::Run => write!(f, "run"),
        }
    }
}

/// # Errors produced by the kernel container.
///
/// These cover the whole registration / injection / launch surface. All of
/// them are fail-fast: the first one aborts the phase in progress and is
/// returned to the `launch` caller unmodified.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum KernelError {
    /// A service depends, directly or transitively, on itself.
    #[error("circular dependency on {0}")]
    CircularDependency(ServiceId),

    /// Registration was attempted after the kernel was frozen by `launch`.
    #[error("cannot deploy {0}: kernel is read only")]
    ReadOnly(ServiceId),

    /// `launch` was called with no services deployed.
    #[error("kernel has no services deployed")]
    Empty,

    /// Two different concrete types were registered under one explicit name.
    #[error("identity {0} is already deployed with a different concrete type")]
    IdentityConflict(ServiceId),

    /// A capability identity is already bound to a different instance.
    #[error("capability {0} is already bound to a different instance")]
    DuplicateCapability(ServiceId),

    /// A capability-shaped injection point had no registered binding.
    #[error("no instance bound for capability {0}")]
    UnknownCapability(ServiceId),

    /// An injection directive used an unrecognized keyword.
    #[error("unsupported injection directive {directive:?} on field {field:?}")]
    UnsupportedDirective {
        /// Field the directive was attached to.
        field: String,
        /// The unrecognized keyword.
        directive: String,
    },

    /// A directive keyword does not match the kind of cell it targets.
    #[error("directive {directive:?} on field {field:?} does not match its target cell")]
    DirectiveMismatch {
        /// Field the directive was attached to.
        field: String,
        /// The mismatched keyword.
        directive: String,
    },

    /// A flag name was declared more than once.
    #[error("flag {0:?} is already declared")]
    DuplicateFlag(String),

    /// A flag's default literal could not be parsed as the flag's type.
    #[error("malformed default {literal:?} for flag {flag:?}: {source}")]
    MalformedDefault {
        /// Flag name.
        flag: String,
        /// The literal that failed to parse.
        literal: String,
        /// Underlying parse failure.
        #[source]
        source: BoxError,
    },

    /// A command-line value could not be parsed as the flag's type.
    #[error("invalid value {literal:?} for flag {flag:?}: {source}")]
    InvalidFlagValue {
        /// Flag name.
        flag: String,
        /// The rejected command-line literal.
        literal: String,
        /// Underlying parse failure.
        #[source]
        source: BoxError,
    },

    /// The command line itself failed to parse (unknown flag, bad syntax).
    #[error("flag parsing failed: {0}")]
    Flags(#[from] clap::Error),

    /// Two registrants declared the same config section with different
    /// target types.
    #[error("config section {0:?} is already registered with a different type")]
    SectionConflict(String),

    /// The configuration document could not be read or parsed.
    #[error("config file {path:?} unusable: {source}")]
    ConfigFile {
        /// Path the loader attempted to read.
        path: String,
        /// Read or parse failure.
        #[source]
        source: BoxError,
    },

    /// A config section failed to decode into its registered type.
    #[error("config section {section:?} failed to decode: {source}")]
    ConfigDecode {
        /// Section name from the document.
        section: String,
        /// Decode failure.
        #[source]
        source: serde_yaml::Error,
    },

    /// A service lifecycle hook failed.
    #[error("{phase} phase failed for {service}: {source}")]
    Phase {
        /// Phase that was executing.
        phase: Phase,
        /// Identity of the failing service.
        service: ServiceId,
        /// Error returned by the hook.
        #[source]
        source: BoxError,
    },
}

impl KernelError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            KernelError::CircularDependency(_) => "kernel_circular_dependency",
            KernelError::ReadOnly(_) => "kernel_read_only",
            KernelError::Empty => "kernel_empty",
            KernelError::IdentityConflict(_) => "kernel_identity_conflict",
            KernelError::DuplicateCapability(_) => "kernel_duplicate_capability",
            KernelError::UnknownCapability(_) => "kernel_unknown_capability",
            KernelError::UnsupportedDirective { .. } => "inject_unsupported_directive",
            KernelError::DirectiveMismatch { .. } => "inject_directive_mismatch",
            KernelError::DuplicateFlag(_) => "flag_duplicate",
            KernelError::MalformedDefault { .. } => "flag_malformed_default",
            KernelError::InvalidFlagValue { .. } => "flag_invalid_value",
            KernelError::Flags(_) => "flag_parse",
            KernelError::SectionConflict(_) => "config_section_conflict",
            KernelError::ConfigFile { .. } => "config_file",
            KernelError::ConfigDecode { .. } => "config_decode",
            KernelError::Phase { .. } => "kernel_phase",
        }
    }
}

/// # Errors produced by task execution.
///
/// Abnormal termination is an explicit variant ([`TaskError::Aborted`])
/// rather than an unwinding panic, so branching combinators like
/// [`Task::on_abort`](crate::Task::on_abort) are ordinary pattern matches.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// Ordinary task failure.
    #[error("task failed: {0}")]
    Failed(String),

    /// Abnormal termination; the payload describes what went wrong.
    #[error("task aborted: {0}")]
    Aborted(String),

    /// The task's execution context was cancelled.
    #[error("task canceled")]
    Canceled,
}

impl TaskError {
    /// Creates an ordinary failure from any displayable payload.
    pub fn failed(msg: impl std::fmt::Display) -> Self {
        TaskError::Failed(msg.to_string())
    }

    /// Creates an abnormal-termination error from any displayable payload.
    pub fn aborted(msg: impl std::fmt::Display) -> Self {
        TaskError::Aborted(msg.to_string())
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use microkern::TaskError;
    ///
    /// assert_eq!(TaskError::failed("boom").as_label(), "task_failed");
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Failed(_) => "task_failed",
            TaskError::Aborted(_) => "task_aborted",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// True for the abnormal-termination variant.
    pub fn is_abort(&self) -> bool {
        matches!(self, TaskError::Aborted(_))
    }
}

/// Shorthand result type for task executions.
pub type TaskResult = Result<(), TaskError>;
