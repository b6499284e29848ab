//! Task references: the wire identity of a dispatchable callable.
//!
//! A [`TaskRef`] names a task registered with the engine's task registry.
//! Its string form travels inside a [`DispatchPayload`](crate::payload::DispatchPayload)
//! and is re-parsed independently by every worker invocation; it carries no
//! state of its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the owning type and the method name in a method path.
const METHOD_DELIMITER: char = '|';

/// Errors produced when parsing a task path string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskPathError {
    /// The path was empty or contained an empty segment.
    #[error("task path '{0}' has an empty segment")]
    EmptySegment(String),

    /// The leading segment carried no module qualifier.
    #[error("task path '{0}' is missing a module qualifier")]
    MissingModule(String),

    /// More than two method delimiters were present.
    #[error("task path '{0}' has too many segments")]
    TooManySegments(String),
}

/// Identity of a dispatchable task.
///
/// The wire form has three shapes:
///
/// - `"<module>.<name>"` — a plain function;
/// - `"<module>.<Type>|<method>"` — a method whose receiver the worker must
///   construct before binding;
/// - `"<module>.<Type>|<method>|"` — a method callable directly on the type.
///
/// The trailing delimiter is the sole signal distinguishing the last two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TaskRef {
    /// A plain registered function.
    Function {
        /// Module qualifier, e.g. `"reports.nightly"`.
        module: String,
        /// Function name within the module.
        name: String,
    },
    /// A method on a registered type.
    Method {
        /// Module qualifier of the owning type.
        module: String,
        /// Owning type name.
        type_name: String,
        /// Method name.
        method: String,
        /// `true` when the worker must construct the receiver from
        /// constructor kwargs before binding the method.
        requires_init: bool,
    },
}

impl TaskRef {
    /// Convenience constructor for a plain function reference.
    #[must_use]
    pub fn function(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Function {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Convenience constructor for a method reference.
    #[must_use]
    pub fn method(
        module: impl Into<String>,
        type_name: impl Into<String>,
        method: impl Into<String>,
        requires_init: bool,
    ) -> Self {
        Self::Method {
            module: module.into(),
            type_name: type_name.into(),
            method: method.into(),
            requires_init,
        }
    }

    /// Render the wire path for this reference.
    #[must_use]
    pub fn as_path(&self) -> String {
        match self {
            Self::Function { module, name } => format!("{module}.{name}"),
            Self::Method {
                module,
                type_name,
                method,
                requires_init: true,
            } => format!("{module}.{type_name}{METHOD_DELIMITER}{method}"),
            Self::Method {
                module,
                type_name,
                method,
                requires_init: false,
            } => {
                format!("{module}.{type_name}{METHOD_DELIMITER}{method}{METHOD_DELIMITER}")
            }
        }
    }

    /// Registry lookup key: the wire path without the trailing delimiter,
    /// so both method shapes resolve to the same registration.
    #[must_use]
    pub fn registry_key(&self) -> String {
        match self {
            Self::Function { .. } => self.as_path(),
            Self::Method {
                module,
                type_name,
                method,
                ..
            } => format!("{module}.{type_name}{METHOD_DELIMITER}{method}"),
        }
    }

    /// Parse a wire path back into a [`TaskRef`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskPathError`] for empty segments, a missing module
    /// qualifier, or more than two delimiters.
    pub fn parse(path: &str) -> Result<Self, TaskPathError> {
        let segments: Vec<&str> = path.split(METHOD_DELIMITER).collect();
        match segments.as_slice() {
            [target] => {
                let (module, name) = split_qualified(target, path)?;
                Ok(Self::function(module, name))
            }
            [target, method] => {
                let (module, type_name) = split_qualified(target, path)?;
                ensure_non_empty(method, path)?;
                Ok(Self::method(module, type_name, *method, true))
            }
            [target, method, tail] if tail.is_empty() => {
                let (module, type_name) = split_qualified(target, path)?;
                ensure_non_empty(method, path)?;
                Ok(Self::method(module, type_name, *method, false))
            }
            _ => Err(TaskPathError::TooManySegments(path.to_string())),
        }
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_path())
    }
}

impl std::str::FromStr for TaskRef {
    type Err = TaskPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn ensure_non_empty(segment: &str, path: &str) -> Result<(), TaskPathError> {
    if segment.is_empty() {
        return Err(TaskPathError::EmptySegment(path.to_string()));
    }
    Ok(())
}

/// Split `"<module>.<name>"` on the final dot.
fn split_qualified<'a>(target: &'a str, path: &str) -> Result<(&'a str, &'a str), TaskPathError> {
    let Some((module, name)) = target.rsplit_once('.') else {
        return Err(TaskPathError::MissingModule(path.to_string()));
    };
    if module.is_empty() || name.is_empty() {
        return Err(TaskPathError::EmptySegment(path.to_string()));
    }
    Ok((module, name))
}
