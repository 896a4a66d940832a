//! Error model for the config pipeline.

use crate::Origin;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// An error from parsing, resolving, or querying a configuration.
///
/// Every error carries an origin where one is known; diagnostics embed the
/// file, line, and a short context description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    origin: Option<Origin>,
}

/// The kind of a config error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigErrorKind {
    /// Malformed input at a known origin.
    Parse {
        /// What went wrong.
        message: String,
    },
    /// An accessor expected one value kind and found another.
    WrongType {
        /// The path that was accessed.
        path: String,
        /// The kind the accessor wanted.
        expected: String,
        /// The kind actually found.
        actual: String,
    },
    /// A path is absent from a resolved root, or a required include is
    /// missing.
    Missing {
        /// The absent path.
        path: String,
    },
    /// An accessed path still contains an unresolved substitution.
    UnresolvedSubstitution {
        /// The substitution expression, e.g. `${a.b}`.
        expression: String,
    },
    /// A source could not be read.
    Io {
        /// The underlying failure.
        message: String,
    },
    /// An include or substitution cycle.
    Cycle {
        /// What cycled.
        message: String,
        /// One entry per level of the cycle.
        trace: Vec<String>,
    },
    /// An internal invariant was violated.
    Bug {
        /// The broken invariant.
        message: String,
    },
}

impl ConfigError {
    /// Malformed input at the given origin.
    pub fn parse(origin: Origin, message: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::Parse {
                message: message.into(),
            },
            origin: Some(origin),
        }
    }

    /// Accessor type mismatch.
    pub fn wrong_type(
        origin: Origin,
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            kind: ConfigErrorKind::WrongType {
                path: path.into(),
                expected: expected.into(),
                actual: actual.into(),
            },
            origin: Some(origin),
        }
    }

    /// Absent path.
    pub fn missing(origin: Origin, path: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::Missing { path: path.into() },
            origin: Some(origin),
        }
    }

    /// Unresolved substitution reached by an accessor.
    pub fn unresolved_substitution(origin: Origin, expression: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::UnresolvedSubstitution {
                expression: expression.into(),
            },
            origin: Some(origin),
        }
    }

    /// Source could not be read.
    pub fn io(origin: Origin, message: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::Io {
                message: message.into(),
            },
            origin: Some(origin),
        }
    }

    /// Include or substitution cycle.
    pub fn cycle(origin: Origin, message: impl Into<String>, trace: Vec<String>) -> Self {
        Self {
            kind: ConfigErrorKind::Cycle {
                message: message.into(),
                trace,
            },
            origin: Some(origin),
        }
    }

    /// Internal invariant violation.
    pub fn bug(message: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::Bug {
                message: message.into(),
            },
            origin: None,
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }

    /// The origin, if one is known.
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// Whether this is a `Missing` error.
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::Missing { .. })
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(origin) = &self.origin {
            write!(f, "{}: ", origin.describe())?;
        }
        match &self.kind {
            ConfigErrorKind::Parse { message } => write!(f, "{message}"),
            ConfigErrorKind::WrongType {
                path,
                expected,
                actual,
            } => {
                write!(f, "{path} has type {actual} rather than {expected}")
            }
            ConfigErrorKind::Missing { path } => {
                write!(f, "no configuration setting found for key '{path}'")
            }
            ConfigErrorKind::UnresolvedSubstitution { expression } => {
                write!(f, "unresolved substitution {expression}")
            }
            ConfigErrorKind::Io { message } => write!(f, "{message}"),
            ConfigErrorKind::Cycle { message, trace } => {
                write!(f, "{message}")?;
                if !trace.is_empty() {
                    write!(f, " Trace:")?;
                    for entry in trace {
                        write!(f, "\n\t{entry}")?;
                    }
                }
                Ok(())
            }
            ConfigErrorKind::Bug { message } => {
                write!(f, "bug in config library: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
