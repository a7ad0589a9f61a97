//! Logic modules: translate plugin types and group policies into check states.
//!
//! # Modules
//!
//! - `resolver`: effective plugin types and per-group default selection

pub mod resolver;

pub use resolver::{apply_group_policy, resolve_option, GroupResolution};
