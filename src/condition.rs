//! Condition model
//!
//! A closed sum type over the four condition kinds a package can declare.
//! Evaluation lives in [`crate::engine::evaluator`]; this module only holds
//! the data and the version arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::types::{ConditionOperator, FileState, VersionKind};

/// A boolean expression gating steps, plugin types and conditional installs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Holds when the most recent assertion of `name` equals `value`.
    /// An empty `value` matches a flag that was never set.
    Flag { name: String, value: String },

    /// Holds when the host reports `file` in `state`
    File { file: String, state: FileState },

    /// Holds when the host's `kind` version is at least `version`
    Version { kind: VersionKind, version: Version },

    /// AND/OR over nested conditions, evaluated left to right
    Composite {
        #[serde(default)]
        operator: ConditionOperator,
        #[serde(default)]
        conditions: Vec<Condition>,
    },
}

impl Condition {
    pub fn flag(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Flag { name: name.into(), value: value.into() }
    }

    pub fn file(file: impl Into<String>, state: FileState) -> Self {
        Self::File { file: file.into(), state }
    }

    pub fn version(kind: VersionKind, version: &str) -> Self {
        Self::Version { kind, version: Version::parse(version) }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::Composite { operator: ConditionOperator::And, conditions }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::Composite { operator: ConditionOperator::Or, conditions }
    }

    /// Record an [`Diagnostic::EmptyComposite`] for every childless composite
    /// in this tree. Empty composites still evaluate (AND to true, OR to false).
    pub fn check_empty(&self, context: &str, diagnostics: &mut Diagnostics) {
        if let Self::Composite { conditions, .. } = self {
            if conditions.is_empty() {
                diagnostics.push(Diagnostic::EmptyComposite { context: context.to_string() });
            }
            for child in conditions {
                child.check_empty(context, diagnostics);
            }
        }
    }
}

/// A `name = value` assertion made by a checked plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFlag {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl ConditionFlag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Four-component numeric version.
///
/// Missing components are 0 and a component that does not start with a digit
/// is 0 as well, so parsing never fails. A component too large for `u32`
/// saturates. Comparison is component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Version([u32; 4]);

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self([major, minor, patch, build])
    }

    pub fn parse(text: &str) -> Self {
        let mut parts = [0u32; 4];
        for (slot, component) in parts.iter_mut().zip(text.trim().split('.')) {
            let digits: String = component
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            // Only overflow can fail once there are digits.
            *slot = if digits.is_empty() { 0 } else { digits.parse().unwrap_or(u32::MAX) };
        }
        Self(parts)
    }

    /// `self` is at least `required`
    pub fn satisfies(&self, required: &Version) -> bool {
        required <= self
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl From<String> for Version {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<&str> for Version {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}
