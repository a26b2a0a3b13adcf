//! # Command-line flag declaration and parsing.
//!
//! Every `flag` injection point declares one process-wide command-line
//! flag. Declarations accumulate in the kernel's [`FlagSet`] while services
//! deploy; `launch` assembles a [`clap::Command`] from them and parses the
//! command line exactly once, after all Init hooks have run and before
//! PostInit. Parsed values are bound into the declaring [`Flag`] cells.
//!
//! Flag types are the scalar set the container supports — `bool`,
//! `String`, `i32`, `i64`, `f64` — enforced at compile time by the sealed
//! [`FlagValue`] trait, so an unsupported field type is a type error rather
//! than a launch failure.
//!
//! Boolean flags accept both the bare `--name` form (meaning `true`) and an
//! explicit `--name=value`.

use std::collections::HashSet;
use std::ffi::OsString;

use crate::error::{BoxError, KernelError};
use crate::inject::Flag;

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for String {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f64 {}
}

/// Scalar kinds a flag cell can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagKind {
    /// `bool`
    Bool,
    /// `String`
    String,
    /// `i32`
    Int,
    /// `i64`
    Int64,
    /// `f64`
    Float,
}

impl std::fmt::Display for FlagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagKind::Bool => write!(f, "bool"),
            FlagKind::String => write!(f, "string"),
            FlagKind::Int => write!(f, "int"),
            FlagKind::Int64 => write!(f, "int64"),
            FlagKind::Float => write!(f, "float"),
        }
    }
}

/// Scalar types usable behind a [`Flag`] cell. Sealed.
pub trait FlagValue: sealed::Sealed + Clone + Send + Sync + 'static {
    /// The scalar kind, used for command-line wiring.
    const KIND: FlagKind;

    /// Parses a literal into the value; used for defaults and argv values.
    fn parse_literal(literal: &str) -> Result<Self, BoxError>;

    /// Literal used when a declaration omits its default.
    fn fallback_literal() -> &'static str;
}

impl FlagValue for bool {
    const KIND: FlagKind = FlagKind::Bool;

    fn parse_literal(literal: &str) -> Result<Self, BoxError> {
        literal.parse().map_err(|e: std::str::ParseBoolError| e.into())
    }

    fn fallback_literal() -> &'static str {
        "false"
    }
}

impl FlagValue for String {
    const KIND: FlagKind = FlagKind::String;

    fn parse_literal(literal: &str) -> Result<Self, BoxError> {
        Ok(literal.to_string())
    }

    fn fallback_literal() -> &'static str {
        ""
    }
}

impl FlagValue for i32 {
    const KIND: FlagKind = FlagKind::Int;

    fn parse_literal(literal: &str) -> Result<Self, BoxError> {
        literal.parse().map_err(|e: std::num::ParseIntError| e.into())
    }

    fn fallback_literal() -> &'static str {
        "0"
    }
}

impl FlagValue for i64 {
    const KIND: FlagKind = FlagKind::Int64;

    fn parse_literal(literal: &str) -> Result<Self, BoxError> {
        literal.parse().map_err(|e: std::num::ParseIntError| e.into())
    }

    fn fallback_literal() -> &'static str {
        "0"
    }
}

impl FlagValue for f64 {
    const KIND: FlagKind = FlagKind::Float;

    fn parse_literal(literal: &str) -> Result<Self, BoxError> {
        literal.parse().map_err(|e: std::num::ParseFloatError| e.into())
    }

    fn fallback_literal() -> &'static str {
        "0.0"
    }
}

/// Type-erased binding from a declared flag to its cell.
pub(crate) trait FlagBind: Send + Sync {
    fn kind(&self) -> FlagKind;
    fn fallback_literal(&self) -> &'static str;
    /// Validates a default literal without binding it.
    fn check(&self, literal: &str) -> Result<(), BoxError>;
    /// Parses `raw` and binds it into the cell.
    fn assign(&self, flag: &str, raw: &str) -> Result<(), KernelError>;
}

pub(crate) struct CellBind<T> {
    cell: Flag<T>,
}

impl<T> CellBind<T> {
    pub(crate) fn new(cell: &Flag<T>) -> Self {
        Self { cell: cell.clone() }
    }
}

impl<T: FlagValue> FlagBind for CellBind<T> {
    fn kind(&self) -> FlagKind {
        T::KIND
    }

    fn fallback_literal(&self) -> &'static str {
        T::fallback_literal()
    }

    fn check(&self, literal: &str) -> Result<(), BoxError> {
        T::parse_literal(literal).map(|_| ())
    }

    fn assign(&self, flag: &str, raw: &str) -> Result<(), KernelError> {
        let value = T::parse_literal(raw).map_err(|source| KernelError::InvalidFlagValue {
            flag: flag.to_string(),
            literal: raw.to_string(),
            source,
        })?;
        self.cell.bind(value);
        Ok(())
    }
}

struct FlagSpec {
    name: String,
    description: String,
    default: String,
    bind: Box<dyn FlagBind>,
}

/// Accumulates flag declarations until `launch` parses the command line.
#[derive(Default)]
pub(crate) struct FlagSet {
    specs: Vec<FlagSpec>,
    names: HashSet<String>,
}

impl FlagSet {
    /// Declares one flag. Omitted name/description/default fall back to the
    /// field name, the flag name, and the type's zero literal respectively.
    pub(crate) fn declare(
        &mut self,
        field: &str,
        name: Option<String>,
        description: Option<String>,
        default: Option<String>,
        bind: Box<dyn FlagBind>,
    ) -> Result<(), KernelError> {
        let name = name.unwrap_or_else(|| field.to_string());
        let description = description.unwrap_or_else(|| name.clone());
        let default = default.unwrap_or_else(|| bind.fallback_literal().to_string());

        if !self.names.insert(name.clone()) {
            return Err(KernelError::DuplicateFlag(name));
        }
        bind.check(&default)
            .map_err(|source| KernelError::MalformedDefault {
                flag: name.clone(),
                literal: default.clone(),
                source,
            })?;

        tracing::debug!(flag = %name, kind = %bind.kind(), default = %default, "declared flag");
        self.specs.push(FlagSpec {
            name,
            description,
            default,
            bind,
        });
        Ok(())
    }

    /// Builds the command-line parser from every declaration and parses
    /// `args` (argv[0] included), binding each value into its cell.
    pub(crate) fn parse_from<I, T>(&self, args: I) -> Result<(), KernelError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut cmd = clap::Command::new("microkern");
        for spec in &self.specs {
            let mut arg = clap::Arg::new(spec.name.clone())
                .long(spec.name.clone())
                .help(spec.description.clone())
                .num_args(1)
                .default_value(spec.default.clone());
            if spec.bind.kind() == FlagKind::Bool {
                // bare `--name` means true
                arg = arg.num_args(0..=1).default_missing_value("true");
            }
            cmd = cmd.arg(arg);
        }

        let matches = cmd.try_get_matches_from(args)?;
        for spec in &self.specs {
            let raw = matches
                .get_one::<String>(&spec.name)
                .cloned()
                .unwrap_or_else(|| spec.default.clone());
            spec.bind.assign(&spec.name, &raw)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare<T: FlagValue>(
        set: &mut FlagSet,
        field: &str,
        default: Option<&str>,
    ) -> Flag<T> {
        let cell: Flag<T> = Flag::new();
        set.declare(
            field,
            None,
            None,
            default.map(str::to_string),
            Box::new(CellBind::new(&cell)),
        )
        .expect("declare");
        cell
    }

    #[test]
    fn test_defaults_bind_when_argv_is_empty() {
        let mut set = FlagSet::default();
        let verbose: Flag<bool> = declare(&mut set, "verbose", None);
        let level: Flag<i64> = declare(&mut set, "level", Some("7"));
        let rate: Flag<f64> = declare(&mut set, "rate", Some("0.5"));

        set.parse_from(["test"]).expect("parse");
        assert_eq!(verbose.get(), &false);
        assert_eq!(level.get(), &7);
        assert_eq!(rate.get(), &0.5);
    }

    #[test]
    fn test_argv_values_override_defaults() {
        let mut set = FlagSet::default();
        let name: Flag<String> = declare(&mut set, "name", Some("fallback"));
        let count: Flag<i32> = declare(&mut set, "count", None);

        set.parse_from(["test", "--name", "live", "--count", "3"])
            .expect("parse");
        assert_eq!(name.get(), "live");
        assert_eq!(count.get(), &3);
    }

    #[test]
    fn test_bare_bool_flag_means_true() {
        let mut set = FlagSet::default();
        let verbose: Flag<bool> = declare(&mut set, "verbose", None);

        set.parse_from(["test", "--verbose"]).expect("parse");
        assert_eq!(verbose.get(), &true);
    }

    #[test]
    fn test_malformed_default_literal_is_rejected() {
        let mut set = FlagSet::default();
        let cell: Flag<i64> = Flag::new();
        let err = set
            .declare(
                "port",
                None,
                None,
                Some("not-a-number".to_string()),
                Box::new(CellBind::new(&cell)),
            )
            .unwrap_err();
        assert_eq!(err.as_label(), "flag_malformed_default");
    }

    #[test]
    fn test_duplicate_flag_name_is_rejected() {
        let mut set = FlagSet::default();
        let _first: Flag<bool> = declare(&mut set, "verbose", None);

        let cell: Flag<bool> = Flag::new();
        let err = set
            .declare("verbose", None, None, None, Box::new(CellBind::new(&cell)))
            .unwrap_err();
        assert_eq!(err.as_label(), "flag_duplicate");
    }

    #[test]
    fn test_unknown_argv_flag_is_a_parse_error() {
        let mut set = FlagSet::default();
        let _verbose: Flag<bool> = declare(&mut set, "verbose", None);

        let err = set.parse_from(["test", "--nope"]).unwrap_err();
        assert_eq!(err.as_label(), "flag_parse");
    }

    #[test]
    fn test_invalid_argv_value_is_rejected() {
        let mut set = FlagSet::default();
        let _count: Flag<i32> = declare(&mut set, "count", None);

        let err = set.parse_from(["test", "--count", "many"]).unwrap_err();
        assert_eq!(err.as_label(), "flag_invalid_value");
    }
}
