//! fomod Engine Library
//!
//! The decision engine behind fomod mod-package installers: evaluates the
//! conditions a package declares, turns group policies into check states while
//! a wizard walks the steps, and composes the output file tree once the user
//! is done. Parsing the package XML and extracting the archive are left to the
//! caller.

pub mod archive;
pub mod cli;
pub mod condition;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod host;
pub mod logic;
pub mod model;
pub mod model_file;
pub mod selection;
pub mod tree;
pub mod types;
pub mod wizard;

// Re-export main types for convenience
pub use condition::{Condition, ConditionFlag, Version};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{FomodError, Result};
pub use host::{FileStateOracle, Host, StaticHost, VersionOracle};
pub use model::{
    ConditionalInstall, DependencyPattern, FileDirective, Group, InstallerModel, ModuleConfig,
    Plugin, PluginTypeInfo, Step,
};
pub use selection::{OptionState, Selection};
pub use tree::{DirectoryTree, Leaf, Node};
pub use types::{ConditionOperator, FileState, GroupType, ItemOrder, PluginType, VersionKind};
pub use wizard::{ForwardAction, InstallPlan, WizardSession, WizardState};

// Engine internals for callers that drive evaluation or composition directly
pub use engine::{Composer, Composition, Evaluator, FlagCache, Overwrite};
