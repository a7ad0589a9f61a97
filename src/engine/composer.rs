//! Output Tree Composer
//!
//! Merges the enabled file directives into one output tree.
//!
//! # Algorithm
//!
//! 1. Stable-sort the directives by `(priority, sequence)`: lower priorities
//!    apply first and are overwritten by higher ones, ties keep declaration
//!    order
//! 2. Resolve each source case-insensitively below the base path; a missing
//!    source is reported and the directive skipped
//! 3. Folder directives merge the whole source subtree into the destination,
//!    file directives place one leaf under the destination name
//! 4. Replacing a leaf with different content records an [`Overwrite`]; once
//!    the walk is done, overwrites between equal priorities are reported as
//!    conflicts
//!
//! # What This Explicitly Refuses To Do
//!
//! - Extract anything: the tree only says which archive entry goes where
//! - Fail the merge: composition always returns a tree plus diagnostics

use serde::Serialize;
use tracing::debug;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::model::FileDirective;
use crate::tree::{split_path, DirectoryTree, Leaf, Node};

/// A leaf that was replaced during composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overwrite {
    /// Output path of the replaced leaf
    pub destination: String,
    pub replaced: Leaf,
    pub by: Leaf,
}

impl Overwrite {
    pub fn is_conflict(&self) -> bool {
        self.replaced.priority == self.by.priority
    }
}

/// Result of a composition
#[derive(Debug, Clone)]
pub struct Composition {
    pub tree: DirectoryTree,
    pub overwrites: Vec<Overwrite>,
    pub diagnostics: Diagnostics,
}

/// Composes output trees from one source tree
pub struct Composer<'a> {
    source: &'a DirectoryTree,
    /// Directive sources are relative to this directory of the source tree
    base: Vec<String>,
}

impl<'a> Composer<'a> {
    pub fn new(source: &'a DirectoryTree) -> Self {
        Self { source, base: Vec::new() }
    }

    pub fn with_base_path(mut self, base: &str) -> Self {
        self.base = split_path(base).into_iter().map(str::to_string).collect();
        self
    }

    pub fn compose<'d, I>(&self, directives: I) -> Composition
    where
        I: IntoIterator<Item = &'d FileDirective>,
    {
        let mut ordered: Vec<&FileDirective> = directives.into_iter().collect();
        ordered.sort_by_key(|directive| (directive.priority, directive.sequence));

        let mut composition = Composition {
            tree: DirectoryTree::new(),
            overwrites: Vec::new(),
            diagnostics: Diagnostics::new(),
        };

        for directive in ordered {
            let placed = if directive.is_folder {
                self.apply_folder(directive, &mut composition)
            } else {
                self.apply_file(directive, &mut composition)
            };
            if !placed {
                composition.diagnostics.push(Diagnostic::SourceNotFound {
                    source: directive.source.clone(),
                    destination: directive.destination().to_string(),
                });
            }
        }

        for overwrite in &composition.overwrites {
            if overwrite.is_conflict() {
                composition.diagnostics.push(Diagnostic::PriorityConflict {
                    overwritten: overwrite.replaced.source.clone(),
                    replacement: overwrite.by.source.clone(),
                    destination: overwrite.destination.clone(),
                    priority: overwrite.by.priority,
                });
            }
        }

        composition
    }

    fn source_node(&self, segments: &[&str]) -> Option<&'a Node> {
        let base: Vec<&str> = self.base.iter().map(String::as_str).collect();
        self.source.root().find(&base)?.find(segments)
    }

    fn apply_folder(&self, directive: &FileDirective, composition: &mut Composition) -> bool {
        let Some(source) = self.source_node(&split_path(&directive.source)) else {
            return false;
        };
        let segments = split_path(directive.destination());
        debug!("merging folder {} into /{}", directive.source, segments.join("/"));

        let prefix: String = segments.iter().map(|s| format!("{}/", s)).collect();
        let target = composition.tree.root_mut().find_or_create(&segments);
        merge_node(source, target, directive.priority, &prefix, &mut composition.overwrites);
        true
    }

    fn apply_file(&self, directive: &FileDirective, composition: &mut Composition) -> bool {
        let source_segments = split_path(&directive.source);
        let Some((source_name, source_parents)) = source_segments.split_last() else {
            return false;
        };
        let Some(leaf) = self.source_node(source_parents).and_then(|node| node.leaf(source_name))
        else {
            return false;
        };

        // A destination ending in a separator names a directory, not the file.
        let destination = split_path(directive.destination());
        let into_directory = directive.destination().ends_with(['/', '\\']);
        let (name, parents) = match destination.split_last() {
            Some((name, parents)) if !into_directory => (*name, parents),
            _ => (leaf.name.as_str(), &destination[..]),
        };
        debug!("placing {} at /{}", leaf.source, destination.join("/"));

        let path = parents.iter().chain(std::iter::once(&name)).copied().collect::<Vec<_>>().join("/");
        let target = composition.tree.root_mut().find_or_create(parents);
        place_leaf(target, leaf.placed(name, directive.priority), path, &mut composition.overwrites);
        true
    }
}

fn merge_node(source: &Node, target: &mut Node, priority: i32, prefix: &str, overwrites: &mut Vec<Overwrite>) {
    for leaf in &source.leaves {
        let path = format!("{}{}", prefix, leaf.name);
        place_leaf(target, leaf.placed(&leaf.name, priority), path, overwrites);
    }
    for child in &source.nodes {
        let sub = target.child_or_insert(&child.name);
        merge_node(child, sub, priority, &format!("{}{}/", prefix, child.name), overwrites);
    }
}

fn place_leaf(target: &mut Node, leaf: Leaf, destination: String, overwrites: &mut Vec<Overwrite>) {
    let by = leaf.clone();
    if let Some(replaced) = target.insert_leaf(leaf) {
        if replaced.origin != by.origin {
            overwrites.push(Overwrite { destination, replaced, by });
        }
    }
}
