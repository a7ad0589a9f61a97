//! Wizard Navigation
//!
//! A `WizardSession` owns everything that changes while a user walks through
//! an installer: the check states, the per-page visibility cache, the flag
//! cache and the way back.
//!
//! # Design Principles
//!
//! - **Single Source of Truth**: the session owns the current step; callers
//!   only ask for transitions
//! - **Fail Fast**: edits that break a group policy return errors and change
//!   nothing
//! - **Pure Look-Ahead**: [`WizardSession::is_last_step`] works on a copy of
//!   the visibility cache and never touches the flag cache
//!
//! # State Flow
//!
//! ```text
//! AtStep(first visible)
//!     ↓ next (skips invisible steps)      ↑ back (to the step it came from)
//! AtStep(j)
//!     ↓ next (no visible step left)
//! Finished → finish() → InstallPlan
//! ```
//!
//! # Invariants
//!
//! - At `AtStep(i)` the visibility cache covers exactly pages `0..=i`, with
//!   page `i` visible; at `Finished` it covers every page
//! - Group policies are applied when a step is reached going forward, never
//!   when it is returned to
//! - Every selection change and every backward move clears the flag cache

use serde::Serialize;
use tracing::{debug, info};

use crate::archive;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::engine::{Composer, Evaluator, FlagCache, Overwrite};
use crate::error::{FomodError, Result};
use crate::host::Host;
use crate::logic::{apply_group_policy, resolve_option};
use crate::model::{FileDirective, InstallerModel, Step};
use crate::selection::{OptionState, Selection};
use crate::tree::DirectoryTree;
use crate::types::{GroupType, PluginType};

/// Where the wizard currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WizardState {
    AtStep(usize),
    Finished,
}

/// What the forward button does right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ForwardAction {
    /// Another visible step follows
    Next,
    /// The current step is the last visible one
    Install,
    /// These groups on the current step still need a selection
    Disabled { groups: Vec<String> },
}

/// Output of a completed wizard
#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    pub tree: DirectoryTree,
    pub overwrites: Vec<Overwrite>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One run of the installer wizard over a package
pub struct WizardSession {
    model: InstallerModel,
    host: Box<dyn Host>,
    selection: Selection,
    /// Known page visibility, indexed by step
    visible: Vec<bool>,
    flags: FlagCache,
    /// Step each page was reached from going forward
    came_from: Vec<Option<usize>>,
    state: WizardState,
    diagnostics: Diagnostics,
}

impl WizardSession {
    /// Start a session on the first visible step.
    ///
    /// # Errors
    ///
    /// Returns [`FomodError::ModuleNotUsable`] when the package's module
    /// dependencies do not hold on `host`.
    pub fn new(model: InstallerModel, host: impl Host + 'static) -> Result<Self> {
        let host: Box<dyn Host> = Box::new(host);
        let selection = Selection::new(&model);

        if let Some(condition) = &model.module_dependencies {
            let usable = Evaluator::new(&model, &selection, &[], host.as_ref()).evaluate(condition, 0);
            if !usable {
                return Err(FomodError::ModuleNotUsable(model.module_name.clone()));
            }
        }

        let step_count = model.steps.len();
        let mut session = Self {
            model,
            host,
            selection,
            visible: Vec::with_capacity(step_count),
            flags: FlagCache::new(),
            came_from: vec![None; step_count],
            state: WizardState::Finished,
            diagnostics: Diagnostics::new(),
        };

        match session.scan_forward(0, None) {
            Some(first) => info!("Starting {:?} at step {:?}", session.model.module_name, session.model.steps[first].name),
            None => info!("{:?} has no visible steps", session.model.module_name),
        }
        Ok(session)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn model(&self) -> &InstallerModel {
        &self.model
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn list_steps(&self) -> &[Step] {
        &self.model.steps
    }

    /// Index and step shown right now, `None` once finished
    pub fn current_step(&self) -> Option<(usize, &Step)> {
        match self.state {
            WizardState::AtStep(index) => Some((index, &self.model.steps[index])),
            WizardState::Finished => None,
        }
    }

    /// Check states of `step`, grouped like the step's groups
    pub fn option_states(&self, step: usize) -> Option<&[Vec<OptionState>]> {
        (step < self.model.steps.len()).then(|| self.selection.step(step))
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Session diagnostics so far (model-build diagnostics live on the model)
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether [`back`](Self::back) would move
    pub fn can_go_back(&self) -> bool {
        match self.state {
            WizardState::AtStep(index) => self.came_from[index].is_some(),
            WizardState::Finished => false,
        }
    }

    /// Whether no visible step follows the current one.
    ///
    /// Runs the same forward scan as [`next`](Self::next) on a copy of the
    /// visibility cache without the flag cache, so nothing is committed.
    pub fn is_last_step(&self) -> bool {
        let WizardState::AtStep(current) = self.state else {
            return true;
        };
        let mut overlay = self.visible.clone();
        for page in current + 1..self.model.steps.len() {
            let visible =
                Evaluator::new(&self.model, &self.selection, &overlay, self.host.as_ref()).is_visible(page);
            if visible {
                return false;
            }
            overlay.push(false);
        }
        true
    }

    /// Names of the groups on `step` that need a selection and have none
    pub fn pending_groups(&self, step: usize) -> Vec<String> {
        let Some(page) = self.model.steps.get(step) else {
            return Vec::new();
        };
        page.groups
            .iter()
            .enumerate()
            .filter(|(g, group)| {
                group.group_type.requires_selection()
                    && !self.selection.group(step, *g).iter().any(|state| state.checked)
            })
            .map(|(_, group)| group.name.clone())
            .collect()
    }

    pub fn forward_action(&self) -> ForwardAction {
        if let WizardState::AtStep(current) = self.state {
            let groups = self.pending_groups(current);
            if !groups.is_empty() {
                return ForwardAction::Disabled { groups };
            }
        }
        if self.is_last_step() {
            ForwardAction::Install
        } else {
            ForwardAction::Next
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Move to the next visible step.
    ///
    /// Returns `Ok(false)` when no visible step is left; the session is then
    /// `Finished`.
    ///
    /// # Errors
    ///
    /// Returns [`FomodError::SelectionRequired`] while a group on the current
    /// step still needs a selection.
    pub fn next(&mut self) -> Result<bool> {
        let WizardState::AtStep(current) = self.state else {
            return Ok(false);
        };

        let groups = self.pending_groups(current);
        if !groups.is_empty() {
            return Err(FomodError::SelectionRequired { groups });
        }

        self.flags.begin_forward_pass();
        match self.scan_forward(current + 1, Some(current)) {
            Some(page) => {
                info!("Step {:?} -> {:?}", self.model.steps[current].name, self.model.steps[page].name);
                Ok(true)
            }
            None => {
                info!("Wizard finished after step {:?}", self.model.steps[current].name);
                Ok(false)
            }
        }
    }

    /// Return to the step the current one was reached from.
    ///
    /// The target keeps the check states it had; returns `false` without
    /// moving on the first step and once finished.
    pub fn back(&mut self) -> bool {
        let WizardState::AtStep(current) = self.state else {
            return false;
        };
        let Some(target) = self.came_from[current] else {
            return false;
        };

        self.came_from[current] = None;
        self.invalidate_from(target);
        self.activate(target);
        info!("Step {:?} <- {:?}", self.model.steps[target].name, self.model.steps[current].name);
        true
    }

    /// Check or uncheck option `flat_index` (display order across groups) of
    /// the current step.
    ///
    /// # Errors
    ///
    /// - [`FomodError::Navigation`] when `step` is not the current step
    /// - [`FomodError::Selection`] for an unknown or locked option, or for
    ///   unchecking the selection of a `SelectExactlyOne` group
    pub fn set_option_checked(&mut self, step: usize, flat_index: usize, checked: bool) -> Result<()> {
        if self.state != WizardState::AtStep(step) {
            return Err(FomodError::navigation(format!("step {} is not the current step", step)));
        }
        let page = &self.model.steps[step];
        let (g, p) = page.locate(flat_index).ok_or_else(|| {
            FomodError::selection(format!("step {:?} has no option {}", page.name, flat_index))
        })?;
        let group = &page.groups[g];
        let plugin = &group.plugins[p];

        let states = self.selection.group_mut(step, g);
        if states[p].locked {
            return Err(FomodError::selection(format!("option {:?} cannot be changed", plugin.name)));
        }

        if checked {
            if group.group_type.is_exclusive() {
                for (index, state) in states.iter_mut().enumerate() {
                    if index != p && !state.locked {
                        state.checked = false;
                    }
                }
            }
            states[p].checked = true;
        } else {
            if states[p].checked && group.group_type == GroupType::SelectExactlyOne {
                return Err(FomodError::selection(format!(
                    "group {:?} needs exactly one selection",
                    group.name
                )));
            }
            states[p].checked = false;
        }

        debug!("{} {:?} in group {:?}", if checked { "checked" } else { "unchecked" }, plugin.name, group.name);
        self.flags.clear();
        Ok(())
    }

    /// Check the option named `plugin` on the current step
    pub fn select_by_name(&mut self, plugin: &str) -> Result<()> {
        let (step, page) = self
            .current_step()
            .ok_or_else(|| FomodError::navigation("the wizard has finished"))?;
        let flat_index = page
            .plugins()
            .position(|(_, _, candidate)| candidate.name.eq_ignore_ascii_case(plugin))
            .ok_or_else(|| FomodError::selection(format!("step {:?} has no option {:?}", page.name, plugin)))?;
        self.set_option_checked(step, flat_index, true)
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Compose the output tree from `source`, the archive the package came in.
    ///
    /// Collects the required files, the conditional installs that hold with
    /// every page in view, and the files of the plugins on visible steps:
    /// everything for checked plugins, `always_install` files for the others
    /// and `install_if_usable` files for unchecked plugins that are not
    /// `NotUsable`.
    ///
    /// # Errors
    ///
    /// Returns [`FomodError::Navigation`] before the wizard has finished.
    pub fn finish(&mut self, source: &DirectoryTree) -> Result<InstallPlan> {
        if self.state != WizardState::Finished {
            return Err(FomodError::navigation("the wizard has not reached its last step"));
        }

        let limit = self.model.steps.len();
        let mut directives: Vec<&FileDirective> = self.model.required_files.iter().collect();

        let mut evaluator = Evaluator::new(&self.model, &self.selection, &self.visible, self.host.as_ref())
            .with_cache(&mut self.flags);
        for install in &self.model.conditional_installs {
            if evaluator.evaluate(&install.condition, limit) {
                directives.extend(install.files.iter());
            }
        }

        for (page, step) in self.model.steps.iter().enumerate() {
            if !self.visible.get(page).copied().unwrap_or(false) {
                continue;
            }
            for (g, p, plugin) in step.plugins() {
                let state = self.selection.state(page, g, p);
                if state.checked {
                    directives.extend(plugin.files.iter());
                    continue;
                }
                let usable = state.plugin_type != PluginType::NotUsable;
                directives.extend(
                    plugin.files.iter().filter(|file| file.always_install || (usable && file.install_if_usable)),
                );
            }
        }

        let base = archive::package_root(source).unwrap_or_default();
        debug!("Composing {} directives below {:?}", directives.len(), base);
        let composition = Composer::new(source).with_base_path(&base).compose(directives);

        let mut diagnostics: Vec<Diagnostic> = self.model.diagnostics().entries().to_vec();
        diagnostics.extend(self.diagnostics.entries().iter().cloned());
        diagnostics.extend(composition.diagnostics.into_vec());

        info!("Install plan has {} files", composition.tree.file_count());
        Ok(InstallPlan {
            tree: composition.tree,
            overwrites: composition.overwrites,
            diagnostics,
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Make the first visible step at or after `start` current, marking the
    /// skipped ones invisible. Finishes the wizard when there is none.
    fn scan_forward(&mut self, start: usize, from: Option<usize>) -> Option<usize> {
        for page in start..self.model.steps.len() {
            let visible = Evaluator::new(&self.model, &self.selection, &self.visible, self.host.as_ref())
                .with_cache(&mut self.flags)
                .is_visible(page);
            if visible {
                self.came_from[page] = from;
                self.activate(page);
                self.display(page);
                return Some(page);
            }
            debug!("Skipping step {:?}", self.model.steps[page].name);
            self.visible.push(false);
        }
        self.state = WizardState::Finished;
        None
    }

    fn activate(&mut self, page: usize) {
        self.visible.truncate(page);
        self.visible.push(true);
        self.state = WizardState::AtStep(page);
    }

    /// Forget what was computed for pages at or after `page`
    fn invalidate_from(&mut self, page: usize) {
        self.visible.truncate(page);
        self.flags.clear();
    }

    /// Resolve plugin types on `page` and apply every group's policy
    fn display(&mut self, page: usize) {
        let mut types: Vec<Vec<PluginType>> = Vec::new();
        {
            let mut evaluator = Evaluator::new(&self.model, &self.selection, &self.visible, self.host.as_ref())
                .with_cache(&mut self.flags);
            for group in &self.model.steps[page].groups {
                let mut group_types = Vec::with_capacity(group.plugins.len());
                for plugin in &group.plugins {
                    group_types.push(resolve_option(&plugin.type_info, &mut evaluator, page));
                }
                types.push(group_types);
            }
        }

        for (g, group) in self.model.steps[page].groups.iter().enumerate() {
            let resolution = apply_group_policy(group, &types[g], self.selection.group(page, g));
            *self.selection.group_mut(page, g) = resolution.states;
            for diagnostic in resolution.diagnostics {
                if !self.diagnostics.entries().contains(&diagnostic) {
                    self.diagnostics.push(diagnostic);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::host::StaticHost;
    use crate::model::{Group, ModuleConfig, Plugin};
    use crate::types::{FileState, ItemOrder};

    fn build(config: ModuleConfig) -> InstallerModel {
        InstallerModel::build(config.with_step_order(ItemOrder::Explicit)).expect("valid model") // test: known-good input
    }

    fn radio_step(name: &str, group_type: GroupType, plugins: &[&str]) -> Step {
        let plugins = plugins.iter().map(|p| Plugin::new(*p)).collect();
        Step::new(name, vec![Group::new("Choice", group_type, plugins).with_order(ItemOrder::Explicit)])
    }

    #[test]
    fn test_zero_steps_start_finished() {
        let session = WizardSession::new(build(ModuleConfig::new("Empty")), StaticHost::new()).unwrap();
        assert_eq!(session.state(), WizardState::Finished);
        assert!(session.current_step().is_none());
        assert!(session.is_last_step());
    }

    #[test]
    fn test_module_dependencies_must_hold() {
        let config = ModuleConfig::new("Patch")
            .with_module_dependencies(Condition::file("Dawnguard.esm", FileState::Active));

        let err = WizardSession::new(build(config.clone()), StaticHost::new()).err().unwrap();
        assert!(matches!(err, FomodError::ModuleNotUsable(_)));

        let host = StaticHost::new().with_file("Dawnguard.esm", FileState::Active);
        assert!(WizardSession::new(build(config), host).is_ok());
    }

    #[test]
    fn test_exactly_one_gets_a_default_and_cannot_be_cleared() {
        let config = ModuleConfig::new("m").with_step(radio_step("Main", GroupType::SelectExactlyOne, &["a", "b"]));
        let mut session = WizardSession::new(build(config), StaticHost::new()).unwrap();

        let checked: Vec<bool> = session.option_states(0).unwrap()[0].iter().map(|s| s.checked).collect();
        assert_eq!(checked, [true, false]);

        session.set_option_checked(0, 1, true).unwrap();
        let checked: Vec<bool> = session.option_states(0).unwrap()[0].iter().map(|s| s.checked).collect();
        assert_eq!(checked, [false, true]);

        let err = session.set_option_checked(0, 1, false).unwrap_err();
        assert!(matches!(err, FomodError::Selection(_)));
    }

    #[test]
    fn test_at_most_one_may_be_cleared() {
        let config = ModuleConfig::new("m").with_step(radio_step("Main", GroupType::SelectAtMostOne, &["a", "b"]));
        let mut session = WizardSession::new(build(config), StaticHost::new()).unwrap();

        session.set_option_checked(0, 0, true).unwrap();
        session.set_option_checked(0, 0, false).unwrap();
        assert!(session.option_states(0).unwrap()[0].iter().all(|s| !s.checked));
    }

    #[test]
    fn test_edits_are_limited_to_current_step() {
        let config = ModuleConfig::new("m")
            .with_step(radio_step("One", GroupType::SelectAny, &["a", "b"]))
            .with_step(radio_step("Two", GroupType::SelectAny, &["c", "d"]));
        let mut session = WizardSession::new(build(config), StaticHost::new()).unwrap();

        assert!(matches!(session.set_option_checked(1, 0, true), Err(FomodError::Navigation(_))));
        assert!(matches!(session.set_option_checked(0, 5, true), Err(FomodError::Selection(_))));
    }

    #[test]
    fn test_locked_option_cannot_change() {
        let step = Step::new(
            "Main",
            vec![Group::new(
                "g",
                GroupType::SelectAny,
                vec![Plugin::new("core").with_type(PluginType::Required), Plugin::new("extra")],
            )
            .with_order(ItemOrder::Explicit)],
        );
        let mut session = WizardSession::new(build(ModuleConfig::new("m").with_step(step)), StaticHost::new()).unwrap();
        assert!(matches!(session.set_option_checked(0, 0, false), Err(FomodError::Selection(_))));
    }

    #[test]
    fn test_back_is_not_possible_from_first_step_or_finished() {
        let config = ModuleConfig::new("m").with_step(radio_step("Only", GroupType::SelectAny, &["a", "b"]));
        let mut session = WizardSession::new(build(config), StaticHost::new()).unwrap();

        assert!(!session.can_go_back());
        assert!(!session.back());
        assert!(!session.next().unwrap());
        assert_eq!(session.state(), WizardState::Finished);
        assert!(!session.back());
    }

    #[test]
    fn test_finish_requires_finished_state() {
        let config = ModuleConfig::new("m").with_step(radio_step("Only", GroupType::SelectAny, &["a", "b"]));
        let mut session = WizardSession::new(build(config), StaticHost::new()).unwrap();
        let err = session.finish(&DirectoryTree::new()).unwrap_err();
        assert!(matches!(err, FomodError::Navigation(_)));
    }

    #[test]
    fn test_selection_required_blocks_next() {
        let step = Step::new(
            "Main",
            vec![Group::new(
                "Patches",
                GroupType::SelectAtLeastOne,
                vec![Plugin::new("a"), Plugin::new("b").with_type(PluginType::Recommended)],
            )
            .with_order(ItemOrder::Explicit)],
        );
        let mut session = WizardSession::new(build(ModuleConfig::new("m").with_step(step)), StaticHost::new()).unwrap();

        // The recommended plugin satisfies the group; clearing it blocks the way forward.
        session.set_option_checked(0, 1, false).unwrap();
        assert_eq!(
            session.forward_action(),
            ForwardAction::Disabled { groups: vec!["Patches".to_string()] }
        );
        assert!(matches!(session.next(), Err(FomodError::SelectionRequired { .. })));

        session.set_option_checked(0, 0, true).unwrap();
        assert_eq!(session.forward_action(), ForwardAction::Install);
    }

    #[test]
    fn test_select_by_name() {
        let config = ModuleConfig::new("m").with_step(radio_step("Main", GroupType::SelectExactlyOne, &["Low", "High"]));
        let mut session = WizardSession::new(build(config), StaticHost::new()).unwrap();
        session.select_by_name("high").unwrap();
        assert!(session.selection().is_checked(0, 0, 1));
        assert!(session.select_by_name("Ultra").is_err());
    }
}
