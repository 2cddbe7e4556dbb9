//! Path parsing and parent-path tracking.
//!
//! Node-revisions have no parent pointers, so a walk from a root records every
//! ancestor it passes in a [`ParentPath`]. Copy-on-write uses the recorded
//! chain to rewrite each ancestor's entry.

use crate::error::FsError;
use crate::store::NodeRevisionStore;
use crate::tree::node::DagNode;
use crate::types::NodeId;
use unicode_normalization::UnicodeNormalization;

/// Validate one directory entry name, returning its NFC form.
pub fn validate_entry_name(name: &str) -> Result<String, FsError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(FsError::InvalidPath(format!("invalid entry name {:?}", name)));
    }
    Ok(name.nfc().collect())
}

/// Split a `/`-separated path into validated components. Empty components are
/// skipped, so `""`, `"/"` and `"//"` all name the root.
pub fn split_path(path: &str) -> Result<Vec<String>, FsError> {
    path.split('/')
        .filter(|c| !c.is_empty())
        .map(validate_entry_name)
        .collect()
}

/// Canonical display form of a component list.
pub fn join_path(components: &[String]) -> String {
    format!("/{}", components.join("/"))
}

/// Parse `path` and walk it from `root`.
pub fn open_path<S: NodeRevisionStore>(
    store: &S,
    root: NodeId,
    path: &str,
) -> Result<ParentPath, FsError> {
    ParentPath::open(store, root, &split_path(path)?)
}

/// One ancestor visited by a walk; `name` is `None` for the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub name: Option<String>,
    pub id: NodeId,
}

/// Arena of the nodes visited walking from a root down to some node.
#[derive(Debug, Clone)]
pub struct ParentPath {
    steps: Vec<PathStep>,
}

impl ParentPath {
    /// Walk `components` from `root`, recording every step.
    pub fn open<S: NodeRevisionStore>(
        store: &S,
        root: NodeId,
        components: &[String],
    ) -> Result<Self, FsError> {
        let mut steps = vec![PathStep {
            name: None,
            id: root,
        }];
        let mut current = root;
        for (depth, name) in components.iter().enumerate() {
            let node = DagNode::fetch(store, current)?;
            if !node.is_directory() {
                return Err(FsError::NotADirectory(join_path(&components[..depth])));
            }
            current = node
                .entry(name)?
                .ok_or_else(|| FsError::PathNotFound(join_path(&components[..=depth])))?;
            steps.push(PathStep {
                name: Some(name.clone()),
                id: current,
            });
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of entries below the root.
    pub fn depth(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn root_id(&self) -> NodeId {
        self.steps[0].id
    }

    pub fn leaf_id(&self) -> NodeId {
        self.steps[self.steps.len() - 1].id
    }

    pub fn path_string(&self) -> String {
        let names: Vec<String> = self.steps.iter().filter_map(|s| s.name.clone()).collect();
        join_path(&names)
    }

    pub(crate) fn step(&self, depth: usize) -> &PathStep {
        &self.steps[depth]
    }

    pub(crate) fn set_id(&mut self, depth: usize, id: NodeId) {
        self.steps[depth].id = id;
    }
}
