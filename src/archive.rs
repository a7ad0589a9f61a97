//! Archive inspection
//!
//! Recognizes installer archives and lists what has to be extracted before
//! the wizard can run. Works on the [`DirectoryTree`] built from the archive
//! listing; nothing is read from disk here.

use crate::tree::{DirectoryTree, Node};

/// Name of the installer metadata directory
pub const FOMOD_DIR: &str = "fomod";
/// Installer script inside the metadata directory
pub const MODULE_CONFIG: &str = "ModuleConfig.xml";
/// Package metadata inside the metadata directory
pub const INFO_FILE: &str = "info.xml";

const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".gif", ".bmp"];

/// Path segments of the metadata directory.
///
/// It is looked up at the archive root first; archives wrapped in a single
/// directory without files are searched one level further down.
pub fn find_fomod_dir(tree: &DirectoryTree) -> Option<Vec<String>> {
    let mut path = Vec::new();
    let mut node = tree.root();
    loop {
        if let Some(found) = node.child(FOMOD_DIR) {
            path.push(found.name.clone());
            return Some(path);
        }
        match (node.nodes.as_slice(), node.leaves.is_empty()) {
            ([wrapper], true) => {
                path.push(wrapper.name.clone());
                node = wrapper;
            }
            _ => return None,
        }
    }
}

/// Directory that directive sources are relative to: the parent of the
/// metadata directory
pub fn package_root(tree: &DirectoryTree) -> Option<String> {
    find_fomod_dir(tree).map(|mut path| {
        path.pop();
        path.join("/")
    })
}

/// Whether the archive carries an installer script
pub fn is_fomod_archive(tree: &DirectoryTree) -> bool {
    fomod_node(tree).is_some_and(|node| node.leaf(MODULE_CONFIG).is_some())
}

/// Archive paths to extract before the wizard starts: the installer script,
/// the package metadata and every image in the archive.
pub fn installer_files(tree: &DirectoryTree) -> Vec<String> {
    let mut files = Vec::new();
    if let Some(node) = fomod_node(tree) {
        files.extend(
            node.leaves
                .iter()
                .filter(|leaf| {
                    leaf.name.eq_ignore_ascii_case(INFO_FILE)
                        || leaf.name.eq_ignore_ascii_case(MODULE_CONFIG)
                })
                .map(|leaf| leaf.source.clone()),
        );
    }
    collect_images(tree.root(), &mut files);
    files
}

fn fomod_node(tree: &DirectoryTree) -> Option<&Node> {
    let path = find_fomod_dir(tree)?;
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    tree.root().find(&segments)
}

fn collect_images(node: &Node, files: &mut Vec<String>) {
    for leaf in &node.leaves {
        let name = leaf.name.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            files.push(leaf.source.clone());
        }
    }
    for child in &node.nodes {
        collect_images(child, files);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fomod_dir_at_root() {
        let tree = DirectoryTree::from_listing(["FOMOD/ModuleConfig.xml", "core.esp"]);
        assert_eq!(find_fomod_dir(&tree), Some(vec!["FOMOD".to_string()]));
        assert_eq!(package_root(&tree).as_deref(), Some(""));
        assert!(is_fomod_archive(&tree));
    }

    #[test]
    fn test_fomod_dir_inside_wrappers() {
        let tree = DirectoryTree::from_listing(["Outer/Inner/fomod/moduleconfig.xml", "Outer/Inner/a.esp"]);
        assert_eq!(package_root(&tree).as_deref(), Some("Outer/Inner"));
        assert!(is_fomod_archive(&tree));
    }

    #[test]
    fn test_wrapper_with_files_is_not_descended() {
        let tree = DirectoryTree::from_listing(["readme.txt", "Mod/fomod/ModuleConfig.xml"]);
        assert_eq!(find_fomod_dir(&tree), None);
        assert!(!is_fomod_archive(&tree));
    }

    #[test]
    fn test_fomod_dir_without_script_is_not_supported() {
        let tree = DirectoryTree::from_listing(["fomod/info.xml"]);
        assert!(find_fomod_dir(&tree).is_some());
        assert!(!is_fomod_archive(&tree));
    }

    #[test]
    fn test_installer_files() {
        let tree = DirectoryTree::from_listing([
            "fomod/info.xml",
            "fomod/ModuleConfig.xml",
            "fomod/notes.txt",
            "fomod/images/cover.PNG",
            "textures/a.dds",
            "screens/shot.jpg",
        ]);
        assert_eq!(
            installer_files(&tree),
            ["fomod/info.xml", "fomod/ModuleConfig.xml", "fomod/images/cover.PNG", "screens/shot.jpg"]
        );
    }
}
