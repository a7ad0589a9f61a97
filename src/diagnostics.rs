//! Non-fatal findings collected while building, navigating and composing.
//!
//! Authoring anomalies and per-directive resolution failures never abort the
//! wizard. They are recorded here, logged as they arrive, and handed back to
//! the caller next to the normal result.

use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

use crate::types::GroupType;

/// How loudly a diagnostic should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single non-fatal finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A group with one plugin had a policy that cannot offer a choice
    SingleOptionGroup {
        group: String,
        plugin: String,
        declared: GroupType,
        applied: GroupType,
    },
    /// A composite condition without children
    EmptyComposite { context: String },
    /// A file or folder entry with an empty source was dropped
    EmptySource { context: String },
    /// A required plugin inside a group that allows at most one selection
    RequiredInExclusiveGroup {
        group: String,
        plugin: String,
        group_type: GroupType,
    },
    /// The only selectable fallback in a must-select group may be unstable
    CouldBeUsableFallback { group: String, plugin: String },
    /// Nothing in a must-select group was selectable; the first plugin was forced
    ForcedFallback { group: String, plugin: String },
    /// A directive's source is absent from the archive
    SourceNotFound {
        source: String,
        destination: String,
    },
    /// Two directives with equal priority wrote the same destination
    PriorityConflict {
        overwritten: String,
        replacement: String,
        destination: String,
        priority: i32,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::EmptySource { .. } => Severity::Info,
            Self::ForcedFallback { .. } | Self::SourceNotFound { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleOptionGroup { group, plugin, declared, applied } => write!(
                f,
                "plugin {:?} is the only plugin in group {:?} declared {}; treating it as {}",
                plugin, group, declared, applied
            ),
            Self::EmptyComposite { context } => write!(f, "empty condition in {}", context),
            Self::EmptySource { context } => {
                write!(f, "ignoring entry with empty source in {}", context)
            }
            Self::RequiredInExclusiveGroup { group, plugin, group_type } => write!(
                f,
                "plugin {:?} is required in group {:?} which is {}; this is probably wrong",
                plugin, group, group_type
            ),
            Self::CouldBeUsableFallback { group, plugin } => write!(
                f,
                "group {:?} needs a selection but only {:?} is available and it could cause instability",
                group, plugin
            ),
            Self::ForcedFallback { group, plugin } => write!(
                f,
                "group {:?} needs a selection but none is available; forcing {:?}",
                group, plugin
            ),
            Self::SourceNotFound { source, destination } => {
                write!(f, "failed to install {} to {}: not found in archive", source, destination)
            }
            Self::PriorityConflict { overwritten, replacement, destination, priority } => write!(
                f,
                "overriding {} with {} at {} which has the same priority ({})",
                overwritten, replacement, destination, priority
            ),
        }
    }
}

/// Ordered collection of diagnostics that logs each entry as it is recorded
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => info!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
            Severity::Error => error!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
