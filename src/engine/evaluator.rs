//! Condition Evaluator
//!
//! Answers "does this condition hold?" against the pages committed so far.
//!
//! # Flag Semantics
//!
//! A flag condition only sees pages with index `< limit` that are visible.
//! Pages are scanned from the most recent one backwards; within a page, the
//! groups and plugins are scanned in reverse display order and each checked
//! plugin's flags in reverse declaration order. The first assertion of the
//! flag decides. A flag nobody asserted is "unset" and only matches `""`.
//!
//! # Caching
//!
//! [`FlagCache`] remembers flag values and proven-unset flags for the scan
//! limit it was filled at. A query with another limit starts it afresh, so a
//! cached answer is always the answer a full scan would give. The session
//! clears it on backward navigation and on every selection change. An
//! evaluator built without a cache (the speculative look-ahead) never writes.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::condition::Condition;
use crate::host::Host;
use crate::model::InstallerModel;
use crate::selection::Selection;
use crate::types::ConditionOperator;

// ============================================================================
// Flag Cache
// ============================================================================

/// Session-scoped memo of flag lookups
#[derive(Debug, Clone, Default)]
pub struct FlagCache {
    /// Scan limit the entries were computed for
    horizon: Option<usize>,
    values: HashMap<String, String>,
    unset: HashSet<String>,
}

impl FlagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything. Used when an earlier answer may have changed.
    pub fn clear(&mut self) {
        self.horizon = None;
        self.values.clear();
        self.unset.clear();
    }

    /// Forget proven-unset flags; a page about to be passed may set them.
    pub fn begin_forward_pass(&mut self) {
        self.unset.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.unset.is_empty()
    }

    /// `Some(Some(value))` for a cached value, `Some(None)` for a flag known to
    /// be unset, `None` when the flag has to be scanned.
    fn lookup(&self, name: &str, limit: usize) -> Option<Option<String>> {
        if self.horizon != Some(limit) {
            return None;
        }
        if let Some(value) = self.values.get(name) {
            return Some(Some(value.clone()));
        }
        if self.unset.contains(name) {
            return Some(None);
        }
        None
    }

    fn record(&mut self, name: &str, limit: usize, found: Option<&str>) {
        if self.horizon != Some(limit) {
            self.values.clear();
            self.unset.clear();
            self.horizon = Some(limit);
        }
        match found {
            Some(value) => {
                self.values.insert(name.to_string(), value.to_string());
            }
            None => {
                self.unset.insert(name.to_string());
            }
        }
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluates conditions over a model, a selection snapshot and the known
/// page visibility.
pub struct Evaluator<'a> {
    model: &'a InstallerModel,
    selection: &'a Selection,
    /// Visibility of pages `0..visible.len()`; later pages are computed
    visible: &'a [bool],
    host: &'a dyn Host,
    cache: Option<&'a mut FlagCache>,
}

impl<'a> Evaluator<'a> {
    /// An evaluator that never caches
    pub fn new(
        model: &'a InstallerModel,
        selection: &'a Selection,
        visible: &'a [bool],
        host: &'a dyn Host,
    ) -> Self {
        Self { model, selection, visible, host, cache: None }
    }

    pub fn with_cache(mut self, cache: &'a mut FlagCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Evaluate `condition`, letting flag lookups see pages `< limit`.
    pub fn evaluate(&mut self, condition: &Condition, limit: usize) -> bool {
        match condition {
            Condition::Flag { name, value } => match self.flag_value(name, limit) {
                Some(asserted) => asserted == *value,
                None => value.is_empty(),
            },
            Condition::File { file, state } => self.host.lookup_state(file) == *state,
            Condition::Version { kind, version } => {
                self.host.lookup_version(*kind).satisfies(version)
            }
            Condition::Composite { operator, conditions } => match operator {
                ConditionOperator::And => conditions.iter().all(|c| self.evaluate(c, limit)),
                ConditionOperator::Or => conditions.iter().any(|c| self.evaluate(c, limit)),
            },
        }
    }

    /// Whether page `page` is shown.
    ///
    /// Known visibility is taken as is; otherwise the step's visibility
    /// condition is evaluated over the pages before it. Steps without one are
    /// always visible, indices past the end never are.
    pub fn is_visible(&mut self, page: usize) -> bool {
        if let Some(&known) = self.visible.get(page) {
            return known;
        }
        let model = self.model;
        match model.steps.get(page) {
            None => false,
            Some(step) => match &step.visible {
                None => true,
                Some(condition) => self.evaluate(condition, page),
            },
        }
    }

    /// Most recent value asserted for `name` on visible pages `< limit`
    pub fn flag_value(&mut self, name: &str, limit: usize) -> Option<String> {
        if let Some(cached) = self.cache.as_deref().and_then(|c| c.lookup(name, limit)) {
            return cached;
        }

        let found = self.scan_flag(name, limit);
        debug!("flag {:?} below page {} resolved to {:?}", name, limit, found);

        if let Some(cache) = self.cache.as_deref_mut() {
            cache.record(name, limit, found.as_deref());
        }
        found
    }

    fn scan_flag(&mut self, name: &str, limit: usize) -> Option<String> {
        let model = self.model;
        let selection = self.selection;
        let end = limit.min(model.steps.len());

        for page in (0..end).rev() {
            if !self.is_visible(page) {
                continue;
            }
            let step = &model.steps[page];
            for (g, group) in step.groups.iter().enumerate().rev() {
                for (p, plugin) in group.plugins.iter().enumerate().rev() {
                    if !selection.is_checked(page, g, p) {
                        continue;
                    }
                    if let Some(flag) = plugin.flags.iter().rev().find(|f| f.name == name) {
                        return Some(flag.value.clone());
                    }
                }
            }
        }
        None
    }
}
