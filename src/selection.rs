//! Run-time selection state
//!
//! The model is read-only; what the user (or the group policy) has checked
//! lives here, indexed `[step][group][plugin]` in display order.

use serde::Serialize;

use crate::model::InstallerModel;
use crate::types::PluginType;

/// Check state of one plugin as presented on its step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionState {
    pub checked: bool,
    /// The user cannot change `checked`
    pub locked: bool,
    /// Type resolved the last time the step was displayed
    pub plugin_type: PluginType,
}

impl OptionState {
    pub fn new(plugin_type: PluginType) -> Self {
        Self { checked: false, locked: false, plugin_type }
    }

    pub fn enabled(&self) -> bool {
        !self.locked
    }

    /// `CouldBeUsable` plugins are selectable but flagged as risky
    pub fn shows_warning(&self) -> bool {
        self.plugin_type == PluginType::CouldBeUsable
    }
}

/// Selection state for every plugin of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    steps: Vec<Vec<Vec<OptionState>>>,
}

impl Selection {
    /// Everything unchecked, types at their declared defaults
    pub fn new(model: &InstallerModel) -> Self {
        let steps = model
            .steps
            .iter()
            .map(|step| {
                step.groups
                    .iter()
                    .map(|group| {
                        group
                            .plugins
                            .iter()
                            .map(|plugin| OptionState::new(plugin.type_info.default_type))
                            .collect()
                    })
                    .collect()
            })
            .collect();
        Self { steps }
    }

    pub fn step(&self, step: usize) -> &[Vec<OptionState>] {
        &self.steps[step]
    }

    pub fn group(&self, step: usize, group: usize) -> &[OptionState] {
        &self.steps[step][group]
    }

    pub fn group_mut(&mut self, step: usize, group: usize) -> &mut Vec<OptionState> {
        &mut self.steps[step][group]
    }

    pub fn state(&self, step: usize, group: usize, plugin: usize) -> OptionState {
        self.steps[step][group][plugin]
    }

    pub fn is_checked(&self, step: usize, group: usize, plugin: usize) -> bool {
        self.steps[step][group][plugin].checked
    }
}
