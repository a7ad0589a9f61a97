//! Declarative package model
//!
//! `ModuleConfig` is the package description as an external parser (or a JSON
//! file, see [`crate::model_file`]) hands it over. [`InstallerModel::build`]
//! normalizes it once, before any wizard runs:
//!
//! - file directives get their destination default and a global declaration
//!   sequence number (required files, then steps, then conditional installs)
//! - entries with an empty source and flags with an empty name are dropped
//! - steps and plugins are put in their declared item order
//! - single-plugin groups have their policy degraded
//! - empty composite conditions are reported
//!
//! After `build` the model is read-only; run-time selection state lives in the
//! wizard session.

use serde::{Deserialize, Serialize};

use crate::condition::{Condition, ConditionFlag};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{FomodError, Result};
use crate::types::{GroupType, ItemOrder, PluginType};

// ============================================================================
// Declarative Types
// ============================================================================

/// A single file or folder copy instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDirective {
    /// Path inside the archive, relative to the package root
    pub source: String,
    /// Path in the output tree; the source path when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Lower priorities apply first and are overwritten by higher ones
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_folder: bool,
    /// Install even when the owning plugin is not checked
    #[serde(default)]
    pub always_install: bool,
    /// Install whenever the owning plugin is not `NotUsable`
    #[serde(default)]
    pub install_if_usable: bool,
    /// Declaration order across the whole package, assigned by the model build
    #[serde(skip)]
    pub sequence: usize,
}

impl FileDirective {
    pub fn file(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::new(source.into(), Some(destination.into()), false)
    }

    pub fn folder(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::new(source.into(), Some(destination.into()), true)
    }

    fn new(source: String, destination: Option<String>, is_folder: bool) -> Self {
        Self {
            source,
            destination,
            priority: 0,
            is_folder,
            always_install: false,
            install_if_usable: false,
            sequence: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn always_installed(mut self) -> Self {
        self.always_install = true;
        self
    }

    pub fn installed_if_usable(mut self) -> Self {
        self.install_if_usable = true;
        self
    }

    pub fn destination(&self) -> &str {
        self.destination.as_deref().unwrap_or(&self.source)
    }
}

/// Overrides a plugin's default type while `condition` holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyPattern {
    pub condition: Condition,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
}

/// Default type plus ordered dependency patterns; the first matching pattern wins
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PluginTypeInfo {
    #[serde(default)]
    pub default_type: PluginType,
    #[serde(default)]
    pub patterns: Vec<DependencyPattern>,
}

/// A selectable option of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, rename = "type")]
    pub type_info: PluginTypeInfo,
    #[serde(default)]
    pub flags: Vec<ConditionFlag>,
    #[serde(default)]
    pub files: Vec<FileDirective>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            image: None,
            type_info: PluginTypeInfo::default(),
            flags: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn with_type(mut self, plugin_type: PluginType) -> Self {
        self.type_info.default_type = plugin_type;
        self
    }

    pub fn with_pattern(mut self, condition: Condition, plugin_type: PluginType) -> Self {
        self.type_info.patterns.push(DependencyPattern { condition, plugin_type });
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.flags.push(ConditionFlag::new(name, value));
        self
    }

    pub fn with_file(mut self, file: FileDirective) -> Self {
        self.files.push(file);
        self
    }
}

/// Plugins sharing one selection policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    #[serde(default)]
    pub order: ItemOrder,
    pub plugins: Vec<Plugin>,
}

impl Group {
    pub fn new(name: impl Into<String>, group_type: GroupType, plugins: Vec<Plugin>) -> Self {
        Self { name: name.into(), group_type, order: ItemOrder::default(), plugins }
    }

    pub fn with_order(mut self, order: ItemOrder) -> Self {
        self.order = order;
        self
    }
}

/// One page of the wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// Always visible when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<Condition>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Step {
    pub fn new(name: impl Into<String>, groups: Vec<Group>) -> Self {
        Self { name: name.into(), visible: None, groups }
    }

    pub fn with_visibility(mut self, condition: Condition) -> Self {
        self.visible = Some(condition);
        self
    }

    /// Plugins in display order as `(group index, plugin index, plugin)`
    pub fn plugins(&self) -> impl Iterator<Item = (usize, usize, &Plugin)> {
        self.groups.iter().enumerate().flat_map(|(g, group)| {
            group.plugins.iter().enumerate().map(move |(p, plugin)| (g, p, plugin))
        })
    }

    /// Map a display-order plugin index to `(group index, plugin index)`
    pub fn locate(&self, flat_index: usize) -> Option<(usize, usize)> {
        self.plugins().nth(flat_index).map(|(g, p, _)| (g, p))
    }
}

/// Files installed whenever `condition` holds at finish time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalInstall {
    pub condition: Condition,
    #[serde(default)]
    pub files: Vec<FileDirective>,
}

/// The package description before normalization
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default)]
    pub module_name: String,
    /// Must hold on the host for the package to be installable at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_dependencies: Option<Condition>,
    #[serde(default)]
    pub required_files: Vec<FileDirective>,
    #[serde(default)]
    pub step_order: ItemOrder,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub conditional_installs: Vec<ConditionalInstall>,
}

impl ModuleConfig {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self { module_name: module_name.into(), ..Self::default() }
    }

    pub fn with_required_file(mut self, file: FileDirective) -> Self {
        self.required_files.push(file);
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_conditional_install(mut self, condition: Condition, files: Vec<FileDirective>) -> Self {
        self.conditional_installs.push(ConditionalInstall { condition, files });
        self
    }

    pub fn with_module_dependencies(mut self, condition: Condition) -> Self {
        self.module_dependencies = Some(condition);
        self
    }

    pub fn with_step_order(mut self, order: ItemOrder) -> Self {
        self.step_order = order;
        self
    }
}

// ============================================================================
// Normalized Model
// ============================================================================

/// Normalized, read-only package model consumed by the engine
#[derive(Debug, Clone)]
pub struct InstallerModel {
    pub module_name: String,
    pub module_dependencies: Option<Condition>,
    pub required_files: Vec<FileDirective>,
    pub steps: Vec<Step>,
    pub conditional_installs: Vec<ConditionalInstall>,
    diagnostics: Diagnostics,
}

impl InstallerModel {
    /// Normalize a package description.
    ///
    /// # Errors
    ///
    /// Returns [`FomodError::Model`] for structurally invalid input: a group
    /// without plugins.
    pub fn build(config: ModuleConfig) -> Result<Self> {
        let ModuleConfig {
            module_name,
            module_dependencies,
            mut required_files,
            step_order,
            mut steps,
            mut conditional_installs,
        } = config;

        let mut diagnostics = Diagnostics::new();
        let mut sequence = 0usize;

        if let Some(condition) = &module_dependencies {
            condition.check_empty("module dependencies", &mut diagnostics);
        }

        normalize_files(&mut required_files, "required files", &mut sequence, &mut diagnostics);

        for step in &mut steps {
            if let Some(condition) = &step.visible {
                condition.check_empty(&format!("visibility of step {:?}", step.name), &mut diagnostics);
            }
            for group in &mut step.groups {
                normalize_group(group, &mut sequence, &mut diagnostics)?;
            }
        }
        sort_by_order(&mut steps, step_order, |step| &step.name);

        for (index, install) in conditional_installs.iter_mut().enumerate() {
            let context = format!("conditional install pattern {}", index + 1);
            install.condition.check_empty(&context, &mut diagnostics);
            normalize_files(&mut install.files, &context, &mut sequence, &mut diagnostics);
        }

        Ok(Self {
            module_name,
            module_dependencies,
            required_files,
            steps,
            conditional_installs,
            diagnostics,
        })
    }

    /// Anomalies found while normalizing
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether the package presents any page at all
    pub fn has_options(&self) -> bool {
        !self.steps.is_empty()
    }
}

fn normalize_group(group: &mut Group, sequence: &mut usize, diagnostics: &mut Diagnostics) -> Result<()> {
    if group.plugins.is_empty() {
        return Err(FomodError::model(format!("group {:?} has no plugins", group.name)));
    }

    for plugin in &mut group.plugins {
        plugin.flags.retain(|flag| !flag.name.is_empty());
        for (index, pattern) in plugin.type_info.patterns.iter().enumerate() {
            let context = format!("pattern {} of plugin {:?}", index + 1, plugin.name);
            pattern.condition.check_empty(&context, diagnostics);
        }
        let context = format!("plugin {:?}", plugin.name);
        normalize_files(&mut plugin.files, &context, sequence, diagnostics);
    }

    if group.plugins.len() == 1 {
        if let Some(applied) = group.group_type.degrade_single() {
            diagnostics.push(Diagnostic::SingleOptionGroup {
                group: group.name.clone(),
                plugin: group.plugins[0].name.clone(),
                declared: group.group_type,
                applied,
            });
            group.group_type = applied;
        }
    }

    sort_by_order(&mut group.plugins, group.order, |plugin| &plugin.name);
    Ok(())
}

fn normalize_files(
    files: &mut Vec<FileDirective>,
    context: &str,
    sequence: &mut usize,
    diagnostics: &mut Diagnostics,
) {
    files.retain(|file| {
        if file.source.is_empty() {
            diagnostics.push(Diagnostic::EmptySource { context: context.to_string() });
            false
        } else {
            true
        }
    });
    for file in files.iter_mut() {
        if file.destination.is_none() {
            file.destination = Some(file.source.clone());
        }
        *sequence += 1;
        file.sequence = *sequence;
    }
}

fn sort_by_order<T>(items: &mut [T], order: ItemOrder, name: impl Fn(&T) -> &String) {
    match order {
        ItemOrder::Ascending => items.sort_by(|a, b| name(a).cmp(name(b))),
        ItemOrder::Descending => items.sort_by(|a, b| name(b).cmp(name(a))),
        ItemOrder::Explicit => {}
    }
}
