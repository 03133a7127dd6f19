//! Port index: `component -> node path -> interface`.
//!
//! Every component of the file gets an entry, even with no nodes. Every
//! extracted node appears once under its own component, including nodes
//! whose interface has no ports. Failed nodes are absent.

use indexmap::IndexMap;
use smol_str::SmolStr;
use thiserror::Error;

use super::extract::Extraction;
use crate::base::constants::NODE_PATH_SEPARATOR;
use crate::syntax::{File, Interface, Node};

/// The `nodesPorts` map of the resolve-file response.
pub type NodesPorts = IndexMap<SmolStr, IndexMap<SmolStr, Interface>>;

/// Build the index for `file` from extracted nodes.
pub fn build_index(file: &File, extraction: &Extraction) -> NodesPorts {
    let mut index = NodesPorts::new();
    for (component, _) in file.components() {
        let nodes = extraction
            .components
            .get(component)
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|n| (n.path.clone(), n.interface.clone()))
                    .collect()
            })
            .unwrap_or_default();
        index.insert(component.clone(), nodes);
    }
    index
}

/// A key of the index that does not name anything in the file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("'{0}' is not a component of the file")]
    UnknownComponent(SmolStr),
    #[error("component '{component}' has no node '{node}'")]
    UnknownNode { component: SmolStr, node: SmolStr },
}

/// Check that every key pair of `index` refers to an existing node.
pub fn check_integrity(file: &File, index: &NodesPorts) -> Result<(), IntegrityError> {
    for (component_name, nodes) in index {
        let Some(component) = file.component(component_name) else {
            return Err(IntegrityError::UnknownComponent(component_name.clone()));
        };
        for path in nodes.keys() {
            if find_node(&component.nodes, path).is_none() {
                return Err(IntegrityError::UnknownNode {
                    component: component_name.clone(),
                    node: path.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Follow a `parent/child` path through nested dependency nodes.
pub fn find_node<'f>(nodes: &'f IndexMap<SmolStr, Node>, path: &str) -> Option<&'f Node> {
    let mut segments = path.split(NODE_PATH_SEPARATOR);
    let mut node = nodes.get(segments.next()?)?;
    for segment in segments {
        node = node.deps.get(segment)?;
    }
    Some(node)
}
