//! Selection Resolver
//!
//! Turns a group's selection policy plus each plugin's effective type into the
//! check state shown when a step is displayed.
//!
//! # Design
//!
//! - **Pure logic**: the policy takes the current states and returns new ones;
//!   the wizard decides when to apply them
//! - **First match wins**: dependency patterns are tested in declared order
//! - **Never blocks**: authoring anomalies come back as diagnostics
//!
//! # Policy Rules
//!
//! | Effective type  | Result |
//! |-----------------|--------|
//! | `Required`      | checked, locked |
//! | `NotUsable`     | unchecked, locked |
//! | `Recommended`   | checked unless an exclusive group already has a selection |
//! | `Optional`      | unchanged |
//! | `CouldBeUsable` | unchanged, with a warning affordance |
//!
//! `SelectAll` groups check and lock every plugin. A group that requires a
//! selection and ends up empty falls back to its first `Optional` plugin,
//! then its first `CouldBeUsable` plugin, then its first plugin.

use crate::diagnostics::Diagnostic;
use crate::engine::Evaluator;
use crate::model::{Group, PluginTypeInfo};
use crate::selection::OptionState;
use crate::types::{GroupType, PluginType};

// ============================================================================
// Type Resolution
// ============================================================================

/// Effective type of a plugin, with flag lookups limited to pages `< limit`.
pub fn resolve_option(info: &PluginTypeInfo, evaluator: &mut Evaluator<'_>, limit: usize) -> PluginType {
    info.patterns
        .iter()
        .find(|pattern| evaluator.evaluate(&pattern.condition, limit))
        .map(|pattern| pattern.plugin_type)
        .unwrap_or(info.default_type)
}

// ============================================================================
// Group Policy
// ============================================================================

/// New plugin states of one group plus what was noticed on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResolution {
    pub states: Vec<OptionState>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Apply `group`'s policy to its plugins.
///
/// `types[i]` is the effective type of plugin `i`; `current[i]` its state
/// before the step was displayed, which `Optional` and `CouldBeUsable`
/// plugins keep.
///
/// # What This Explicitly Refuses To Do
///
/// - Evaluate conditions: types are resolved beforehand
/// - Enforce radio semantics on edits: that is the wizard's job
pub fn apply_group_policy(group: &Group, types: &[PluginType], current: &[OptionState]) -> GroupResolution {
    let mut diagnostics = Vec::new();

    if group.group_type == GroupType::SelectAll {
        let states = types
            .iter()
            .map(|&plugin_type| OptionState { checked: true, locked: true, plugin_type })
            .collect();
        return GroupResolution { states, diagnostics };
    }

    let exclusive = group.group_type.is_exclusive();

    // A selection the user already made in an exclusive group stays the only one.
    let mut may_select_more = !(exclusive
        && types.iter().zip(current).any(|(&plugin_type, state)| {
            state.checked && plugin_type != PluginType::NotUsable
        }));

    let mut first_optional = None;
    let mut first_could_be_usable = None;
    let mut states = Vec::with_capacity(types.len());

    for (index, (&plugin_type, state)) in types.iter().zip(current).enumerate() {
        let plugin = &group.plugins[index];
        let next = match plugin_type {
            PluginType::Required => {
                if exclusive {
                    diagnostics.push(Diagnostic::RequiredInExclusiveGroup {
                        group: group.name.clone(),
                        plugin: plugin.name.clone(),
                        group_type: group.group_type,
                    });
                }
                OptionState { checked: true, locked: true, plugin_type }
            }
            PluginType::Recommended => OptionState {
                checked: may_select_more || !exclusive,
                locked: false,
                plugin_type,
            },
            PluginType::Optional => {
                first_optional.get_or_insert(index);
                OptionState { checked: state.checked, locked: false, plugin_type }
            }
            PluginType::CouldBeUsable => {
                first_could_be_usable.get_or_insert(index);
                OptionState { checked: state.checked, locked: false, plugin_type }
            }
            PluginType::NotUsable => OptionState { checked: false, locked: true, plugin_type },
        };
        if next.checked && exclusive {
            may_select_more = false;
        }
        states.push(next);
    }

    if group.group_type.requires_selection() && !states.iter().any(|s| s.checked) {
        let fallback = if let Some(index) = first_optional {
            index
        } else if let Some(index) = first_could_be_usable {
            diagnostics.push(Diagnostic::CouldBeUsableFallback {
                group: group.name.clone(),
                plugin: group.plugins[index].name.clone(),
            });
            index
        } else {
            diagnostics.push(Diagnostic::ForcedFallback {
                group: group.name.clone(),
                plugin: group.plugins[0].name.clone(),
            });
            0
        };
        if let Some(state) = states.get_mut(fallback) {
            state.checked = true;
        }
    }

    GroupResolution { states, diagnostics }
}
