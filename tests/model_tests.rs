//! Model File Integration Tests
//!
//! Loads package descriptions, archive listings and host facts from disk the
//! way the CLI does, then runs them through the engine.

use std::io::Write;
use tempfile::NamedTempFile;

use fomod_engine::model_file::load_model;
use fomod_engine::{
    archive, Diagnostic, DirectoryTree, GroupType, ModuleConfig, PluginType, StaticHost,
    WizardSession, WizardState,
};

const MODEL_JSON: &str = r#"{
    "module_name": "Better Armor",
    "module_dependencies": {"type": "version", "kind": "game", "version": "1.5"},
    "required_files": [
        {"source": "core", "destination": "", "is_folder": true},
        {"source": ""}
    ],
    "step_order": "Explicit",
    "steps": [
        {
            "name": "Resolution",
            "groups": [{
                "name": "Textures",
                "type": "SelectExactlyOne",
                "order": "Explicit",
                "plugins": [
                    {"name": "4K", "flags": [{"name": "Res", "value": "4K"}],
                     "files": [{"source": "4k", "destination": "textures", "is_folder": true, "priority": 1}]},
                    {"name": "2K", "type": {"default_type": "Recommended"},
                     "flags": [{"name": "Res", "value": "2K"}],
                     "files": [{"source": "2k", "destination": "textures", "is_folder": true, "priority": 1}]}
                ]
            }]
        },
        {
            "name": "Dawnguard",
            "visible": {"type": "file", "file": "Dawnguard.esm", "state": "Active"},
            "groups": [{
                "name": "Patch",
                "type": "SelectExactlyOne",
                "plugins": [{"name": "Dawnguard Patch", "files": [{"source": "patches/dg.esp"}]}]
            }]
        }
    ],
    "conditional_installs": [
        {"condition": {"type": "flag", "name": "Res", "value": "4K"},
         "files": [{"source": "4k/lod.dds", "destination": "textures/lod/lod.dds"}]}
    ]
}"#;

const LISTING: &str = "\
BetterArmor/
BetterArmor/fomod/
BetterArmor/fomod/info.xml
BetterArmor/fomod/ModuleConfig.xml
BetterArmor/fomod/images/4k.png
BetterArmor/core/BetterArmor.esp
BetterArmor/4k/armor.dds
BetterArmor/4k/lod.dds
BetterArmor/2k/armor.dds
BetterArmor/patches/dg.esp
";

const HOST_JSON: &str = r#"{
    "game_version": "1.6.1170",
    "file_states": {"DAWNGUARD.ESM": "Active"}
}"#;

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_model_normalizes() {
    let file = temp_file(MODEL_JSON);
    let model = load_model(file.path()).unwrap();

    assert_eq!(model.module_name, "Better Armor");
    assert_eq!(model.required_files.len(), 1);
    assert_eq!(model.steps[0].name, "Resolution");
    assert!(model.has_options());

    // The one-plugin ExactlyOne group is forced on.
    assert_eq!(model.steps[1].groups[0].group_type, GroupType::SelectAll);
    assert_eq!(model.steps[0].groups[0].plugins[1].type_info.default_type, PluginType::Recommended);

    let kinds: Vec<&Diagnostic> = model.diagnostics().entries().iter().collect();
    assert!(kinds.iter().any(|d| matches!(d, Diagnostic::EmptySource { .. })));
    assert!(kinds.iter().any(|d| matches!(d, Diagnostic::SingleOptionGroup { .. })));
}

#[test]
fn test_save_then_load_model_file() {
    let file = temp_file(MODEL_JSON);
    let config = ModuleConfig::load_from_file(file.path()).unwrap();

    let copy = NamedTempFile::new().unwrap();
    config.save_to_file(copy.path()).unwrap();
    assert_eq!(ModuleConfig::load_from_file(copy.path()).unwrap(), config);
}

#[test]
fn test_archive_listing_is_recognized() {
    let file = temp_file(LISTING);
    let tree = DirectoryTree::load_listing(file.path()).unwrap();

    assert!(archive::is_fomod_archive(&tree));
    assert_eq!(archive::package_root(&tree).as_deref(), Some("BetterArmor"));
    assert_eq!(
        archive::installer_files(&tree),
        [
            "BetterArmor/fomod/info.xml",
            "BetterArmor/fomod/ModuleConfig.xml",
            "BetterArmor/fomod/images/4k.png",
        ]
    );
}

// =============================================================================
// End to End
// =============================================================================

#[test]
fn test_install_from_files() {
    let model = load_model(temp_file(MODEL_JSON).path()).unwrap();
    let host = StaticHost::load_from_file(temp_file(HOST_JSON).path()).unwrap();
    let source = DirectoryTree::load_listing(temp_file(LISTING).path()).unwrap();

    let mut session = WizardSession::new(model, host).unwrap();
    // 2K is recommended and therefore the default.
    session.select_by_name("4K").unwrap();
    assert!(session.next().unwrap());
    assert_eq!(session.state(), WizardState::AtStep(1));
    assert!(!session.next().unwrap());

    let plan = session.finish(&source).unwrap();
    let mut paths = plan.tree.paths();
    paths.sort();
    assert_eq!(
        paths,
        [
            "BetterArmor.esp",
            "patches/dg.esp",
            "textures/armor.dds",
            "textures/lod.dds",
            "textures/lod/lod.dds",
        ]
    );
    assert_eq!(plan.tree.find_leaf("textures/armor.dds").unwrap().priority, 1);
}

#[test]
fn test_module_dependencies_reject_old_game() {
    let model = load_model(temp_file(MODEL_JSON).path()).unwrap();
    let host = StaticHost::load_from_file(temp_file(r#"{"game_version": "1.4.2"}"#).path()).unwrap();
    assert!(WizardSession::new(model, host).is_err());
}

#[test]
fn test_dawnguard_step_hidden_without_master() {
    let model = load_model(temp_file(MODEL_JSON).path()).unwrap();
    let host = StaticHost::load_from_file(temp_file(r#"{"game_version": "1.6"}"#).path()).unwrap();
    let source = DirectoryTree::load_listing(temp_file(LISTING).path()).unwrap();

    let mut session = WizardSession::new(model, host).unwrap();
    assert!(session.is_last_step());
    assert!(!session.next().unwrap());

    let plan = session.finish(&source).unwrap();
    let mut paths = plan.tree.paths();
    paths.sort();
    assert_eq!(paths, ["BetterArmor.esp", "textures/armor.dds"]);
    assert_eq!(plan.tree.find_leaf("textures/armor.dds").unwrap().source, "BetterArmor/2k/armor.dds");
}
