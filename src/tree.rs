//! Directory Tree
//!
//! One hierarchical file collection type serves both as the source archive
//! (built from an archive listing) and as the composed output handed to the
//! extraction step.
//!
//! # Design
//!
//! - Child directories and leaves are looked up case-insensitively; the first
//!   spelling seen is kept
//! - Leaf names are unique within a directory; inserting a same-named leaf
//!   replaces it and hands the old one back
//! - Every leaf remembers where its content comes from (`origin` index and
//!   archive path) and the priority of the directive that placed it
//! - Children keep insertion order, so dumps and JSON are deterministic

use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Split an archive path on either separator, dropping empty and `.` segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

/// A file entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaf {
    pub name: String,
    /// Index of the archive entry providing the content
    pub origin: usize,
    /// Archive path of the content
    pub source: String,
    /// Priority of the directive that placed the leaf (0 in source trees)
    pub priority: i32,
}

impl Leaf {
    /// Same content under another name, placed with `priority`
    pub fn placed(&self, name: &str, priority: i32) -> Self {
        Self {
            name: name.to_string(),
            origin: self.origin,
            source: self.source.clone(),
            priority,
        }
    }
}

/// A directory entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Node {
    pub name: String,
    pub leaves: Vec<Leaf>,
    pub nodes: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), leaves: Vec::new(), nodes: Vec::new() }
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name.eq_ignore_ascii_case(name))
    }

    /// The named sub-directory, created when absent
    pub fn child_or_insert(&mut self, name: &str) -> &mut Node {
        let index = match self.nodes.iter().position(|node| node.name.eq_ignore_ascii_case(name)) {
            Some(index) => index,
            None => {
                self.nodes.push(Node::new(name));
                self.nodes.len() - 1
            }
        };
        &mut self.nodes[index]
    }

    pub fn leaf(&self, name: &str) -> Option<&Leaf> {
        self.leaves.iter().find(|leaf| leaf.name.eq_ignore_ascii_case(name))
    }

    /// Insert `leaf`, returning the entry it replaced
    pub fn insert_leaf(&mut self, leaf: Leaf) -> Option<Leaf> {
        match self.leaves.iter_mut().find(|old| old.name.eq_ignore_ascii_case(&leaf.name)) {
            Some(slot) => Some(std::mem::replace(slot, leaf)),
            None => {
                self.leaves.push(leaf);
                None
            }
        }
    }

    /// Walk `segments` downwards, case-insensitively
    pub fn find(&self, segments: &[&str]) -> Option<&Node> {
        segments.iter().try_fold(self, |node, segment| node.child(segment))
    }

    /// Walk `segments` downwards, creating missing directories
    pub fn find_or_create(&mut self, segments: &[&str]) -> &mut Node {
        let mut node = self;
        for segment in segments {
            node = node.child_or_insert(segment);
        }
        node
    }

    pub fn file_count(&self) -> usize {
        self.leaves.len() + self.nodes.iter().map(Node::file_count).sum::<usize>()
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for leaf in &self.leaves {
            out.push(format!("{}{}", prefix, leaf.name));
        }
        for node in &self.nodes {
            node.collect_paths(&format!("{}{}/", prefix, node.name), out);
        }
    }

    fn dump_into(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        for leaf in &self.leaves {
            let _ = writeln!(out, "{}{} <- {} (priority {})", indent, leaf.name, leaf.source, leaf.priority);
        }
        for node in &self.nodes {
            let _ = writeln!(out, "{}{}/", indent, node.name);
            node.dump_into(depth + 1, out);
        }
    }
}

/// A rooted directory tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DirectoryTree {
    root: Node,
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source tree from archive paths, one entry per item.
    ///
    /// The position of an entry is its origin index. Entries ending in a
    /// separator are directories.
    pub fn from_listing<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tree = Self::new();
        for (origin, entry) in entries.into_iter().enumerate() {
            let entry = entry.trim();
            let segments = split_path(entry);
            let Some((name, parents)) = segments.split_last() else {
                continue;
            };
            let parent = tree.root.find_or_create(parents);
            if entry.ends_with(['/', '\\']) {
                parent.child_or_insert(name);
            } else {
                parent.insert_leaf(Leaf {
                    name: name.to_string(),
                    origin,
                    source: segments.join("/"),
                    priority: 0,
                });
            }
        }
        tree
    }

    /// Read a listing file, one archive path per line
    pub fn load_listing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_listing(content.lines().filter(|line| !line.trim().is_empty())))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Directory at `path`; the empty path is the root
    pub fn find_node(&self, path: &str) -> Option<&Node> {
        self.root.find(&split_path(path))
    }

    pub fn find_leaf(&self, path: &str) -> Option<&Leaf> {
        let segments = split_path(path);
        let (name, parents) = segments.split_last()?;
        self.root.find(parents)?.leaf(name)
    }

    pub fn is_empty(&self) -> bool {
        self.root.leaves.is_empty() && self.root.nodes.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.root.file_count()
    }

    /// All file paths, leaves before sub-directories at every level
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_paths("", &mut out);
        out
    }

    /// Indented listing, leaves before sub-directories
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.root.dump_into(0, &mut out);
        out
    }
}
