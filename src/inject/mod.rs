//! Declarative injection: directives, typed cells, and flag plumbing.

mod cells;
mod directive;
mod flags;
mod point;

pub use cells::{Dep, Flag, Section};
pub use directive::Directive;
pub use flags::{FlagKind, FlagValue};
pub use point::{InjectionPoint, Target};

pub(crate) use flags::FlagSet;
pub(crate) use point::{Action, Deploy, SectionBind};
