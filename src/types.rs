//! Type-safe installer keywords
//!
//! The package format is stringly typed (`"SelectExactlyOne"`, `"Recommended"`,
//! ...). These enums replace the strings with exhaustive Rust types. Parsing
//! fails closed: an unrecognized keyword is a model error, never a guess.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

use crate::error::{FomodError, Result};

/// Selection policy of a group of plugins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum GroupType {
    SelectAtLeastOne,
    SelectAtMostOne,
    SelectExactlyOne,
    SelectAny,
    SelectAll,
}

impl GroupType {
    /// Groups that cannot be left without a checked plugin
    pub fn requires_selection(self) -> bool {
        matches!(self, Self::SelectAtLeastOne | Self::SelectExactlyOne)
    }

    /// Groups where at most one plugin may be checked (radio buttons)
    pub fn is_exclusive(self) -> bool {
        matches!(self, Self::SelectAtMostOne | Self::SelectExactlyOne)
    }

    /// The policy a group with a single plugin falls back to, if it changes.
    ///
    /// "At least/exactly one" of one plugin forces it on; "at most one" of one
    /// plugin is a plain checkbox.
    pub fn degrade_single(self) -> Option<Self> {
        match self {
            Self::SelectAtLeastOne | Self::SelectExactlyOne => Some(Self::SelectAll),
            Self::SelectAtMostOne => Some(Self::SelectAny),
            Self::SelectAny | Self::SelectAll => None,
        }
    }
}

/// Effective type of a plugin, either declared or chosen by a dependency pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum PluginType {
    Required,
    Recommended,
    #[default]
    Optional,
    NotUsable,
    CouldBeUsable,
}

/// Ordering applied to steps and to the plugins of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum ItemOrder {
    #[default]
    Ascending,
    Descending,
    Explicit,
}

/// Installation state of a target file as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum FileState {
    #[default]
    Missing,
    Inactive,
    Active,
}

/// Boolean operator of a composite condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum ConditionOperator {
    #[default]
    And,
    Or,
}

/// Which version a version condition tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VersionKind {
    /// Version of the game itself
    Game,
    /// Version of the mod manager running the installer
    Host,
    /// Version of the game's script extender
    Extender,
}

/// Parse an installer keyword, failing closed on unknown values.
///
/// ```
/// use fomod_engine::types::{parse_keyword, GroupType};
///
/// let group: GroupType = parse_keyword("group type", "SelectAny").unwrap();
/// assert_eq!(group, GroupType::SelectAny);
/// assert!(parse_keyword::<GroupType>("group type", "SelectSome").is_err());
/// ```
pub fn parse_keyword<T: FromStr>(what: &str, keyword: &str) -> Result<T> {
    keyword
        .parse()
        .map_err(|_| FomodError::model(format!("unsupported {} {:?}", what, keyword)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_group_type_keywords_round_trip() {
        for group_type in GroupType::iter() {
            let parsed: GroupType = parse_keyword("group type", &group_type.to_string())
                .expect("known keyword"); // test: known-good input
            assert_eq!(parsed, group_type);
        }
    }

    #[test]
    fn test_unknown_plugin_type_fails_closed() {
        let err = parse_keyword::<PluginType>("plugin type", "Mandatory").unwrap_err();
        assert!(matches!(err, FomodError::Model(_)));
        assert!(err.to_string().contains("Mandatory"));
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert!(parse_keyword::<FileState>("file state", "active").is_err());
        assert_eq!(
            parse_keyword::<FileState>("file state", "Active").unwrap(),
            FileState::Active
        );
    }

    #[test]
    fn test_single_plugin_degradation() {
        assert_eq!(GroupType::SelectExactlyOne.degrade_single(), Some(GroupType::SelectAll));
        assert_eq!(GroupType::SelectAtLeastOne.degrade_single(), Some(GroupType::SelectAll));
        assert_eq!(GroupType::SelectAtMostOne.degrade_single(), Some(GroupType::SelectAny));
        assert_eq!(GroupType::SelectAny.degrade_single(), None);
    }

    #[test]
    fn test_version_kind_serializes_snake_case() {
        let json = serde_json::to_string(&VersionKind::Extender).unwrap();
        assert_eq!(json, "\"extender\"");
        assert_eq!(VersionKind::Host.to_string(), "host");
    }
}
