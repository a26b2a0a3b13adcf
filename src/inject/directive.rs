//! # Textual directive grammar.
//!
//! Injection points can be written out as comma-separated directive tags,
//! the grammar collaborator components use when they describe their wiring
//! as data:
//!
//! ```text
//! dependency
//! flag[,name[,description[,default]]]
//! config[,sectionName]
//! worker
//! ```
//!
//! Missing optional tokens fall back to field-name-derived defaults at
//! registration time. An unrecognized keyword is rejected with
//! [`KernelError::UnsupportedDirective`].

use crate::error::KernelError;

/// Parsed form of one directive tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Resolve-or-deploy a dependency (concrete type or capability).
    Dependency,
    /// Declare a command-line flag.
    Flag {
        /// Flag name; defaults to the field name.
        name: Option<String>,
        /// Help text; defaults to the flag name.
        description: Option<String>,
        /// Default literal; defaults to the type's zero literal.
        default: Option<String>,
    },
    /// Join a named configuration section.
    Config {
        /// Section name; defaults to the field name.
        section: Option<String>,
    },
    /// Resolve the shared worker.
    Worker,
}

impl Directive {
    /// Parses a directive tag; `field` is only used for error context.
    ///
    /// # Example
    /// ```
    /// use microkern::Directive;
    ///
    /// let d = Directive::parse("level", "flag,log-level,Log level,info").unwrap();
    /// assert_eq!(
    ///     d,
    ///     Directive::Flag {
    ///         name: Some("log-level".into()),
    ///         description: Some("Log level".into()),
    ///         default: Some("info".into()),
    ///     }
    /// );
    /// ```
    pub fn parse(field: &str, tag: &str) -> Result<Self, KernelError> {
        let mut tokens = tag.split(',').map(str::trim);
        let keyword = tokens.next().unwrap_or("");
        let params: Vec<&str> = tokens.collect();
        let param = |at: usize| {
            params
                .get(at)
                .filter(|p| !p.is_empty())
                .map(|p| (*p).to_string())
        };

        match keyword {
            "dependency" => Ok(Directive::Dependency),
            "worker" => Ok(Directive::Worker),
            "flag" => Ok(Directive::Flag {
                name: param(0),
                description: param(1),
                default: param(2),
            }),
            "config" => Ok(Directive::Config { section: param(0) }),
            other => Err(KernelError::UnsupportedDirective {
                field: field.to_string(),
                directive: other.to_string(),
            }),
        }
    }

    /// The directive's keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Directive::Dependency => "dependency",
            Directive::Flag { .. } => "flag",
            Directive::Config { .. } => "config",
            Directive::Worker => "worker",
        }
    }
}
