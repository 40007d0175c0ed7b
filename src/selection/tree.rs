use crate::rt::{IsoDoseLayer, StructureLayer};
use std::fmt;
use std::sync::Arc;

/// The two fixed branches under the hidden root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Structures,
    IsoDoses,
}

impl Branch {
    pub const ALL: [Branch; 2] = [Branch::Structures, Branch::IsoDoses];

    pub fn label(self) -> &'static str {
        match self {
            Branch::Structures => "Structures",
            Branch::IsoDoses => "Isodoses",
        }
    }
}

/// Address of a node.
///
/// Leaf ids carry the generation of their branch, so an id captured before
/// a rebuild no longer resolves afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Root,
    Branch(Branch),
    Leaf {
        branch: Branch,
        index: usize,
        generation: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeafPayload {
    Structure(Arc<StructureLayer>),
    IsoDose(Arc<IsoDoseLayer>),
}

impl fmt::Display for LeafPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafPayload::Structure(layer) => write!(f, "{layer}"),
            LeafPayload::IsoDose(layer) => write!(f, "{layer}"),
        }
    }
}

/// Emitted once per user toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeCheckEvent {
    pub node: NodeId,
    pub checked: bool,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct LeafNode {
    payload: LeafPayload,
    checked: bool,
}

#[derive(Debug, Clone, Default)]
struct BranchNode {
    checked: bool,
    generation: u32,
    leaves: Vec<LeafNode>,
}

type CheckListener = Box<dyn FnMut(&TreeCheckEvent)>;

/// Checkable two-branch tree of structure and isodose layers.
///
/// Checking is independent per node: a branch state does not propagate to
/// its leaves and leaves do not aggregate into their branch.
pub struct SelectionTree {
    root_checked: bool,
    structures: BranchNode,
    iso_doses: BranchNode,
    listeners: Vec<CheckListener>,
}

impl fmt::Debug for SelectionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionTree")
            .field("root_checked", &self.root_checked)
            .field("structures", &self.structures)
            .field("iso_doses", &self.iso_doses)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for SelectionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTree {
    pub fn new() -> Self {
        Self {
            root_checked: true,
            structures: BranchNode::default(),
            iso_doses: BranchNode::default(),
            listeners: Vec::new(),
        }
    }

    /// Registers a callback for user toggles.
    pub fn on_check(&mut self, listener: impl FnMut(&TreeCheckEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces the leaves of each branch whose argument is `Some`.
    ///
    /// A rebuilt branch is checked and its new leaves are unchecked. No
    /// listener is notified.
    pub fn rebuild(
        &mut self,
        structures: Option<&[Arc<StructureLayer>]>,
        iso_doses: Option<&[Arc<IsoDoseLayer>]>,
    ) {
        if let Some(layers) = structures {
            self.replace_leaves(
                Branch::Structures,
                layers
                    .iter()
                    .map(|layer| LeafPayload::Structure(Arc::clone(layer)))
                    .collect(),
            );
        }
        if let Some(layers) = iso_doses {
            self.replace_leaves(
                Branch::IsoDoses,
                layers
                    .iter()
                    .map(|layer| LeafPayload::IsoDose(Arc::clone(layer)))
                    .collect(),
            );
        }
    }

    /// Empties `branch` and leaves it unchecked. No listener is notified.
    pub fn disable(&mut self, branch: Branch) {
        self.replace_leaves(branch, Vec::new());
        self.set_checked(NodeId::Branch(branch), false);
    }

    /// Drops every leaf of both branches.
    pub fn clear(&mut self) {
        for branch in Branch::ALL {
            let node = self.branch_mut(branch);
            node.leaves.clear();
            node.generation = node.generation.wrapping_add(1);
        }
    }

    fn replace_leaves(&mut self, branch: Branch, payloads: Vec<LeafPayload>) {
        let node = self.branch_mut(branch);
        node.generation = node.generation.wrapping_add(1);
        node.leaves = payloads
            .into_iter()
            .map(|payload| LeafNode {
                payload,
                checked: false,
            })
            .collect();
        self.set_checked(NodeId::Branch(branch), true);

        log::debug!(
            "Rebuilt {} branch with {} leaves",
            branch.label(),
            self.leaf_count(branch)
        );
    }

    /// Silent check state change, reserved for rebuilds.
    fn set_checked(&mut self, node: NodeId, checked: bool) -> bool {
        match self.state_mut(node) {
            Some(state) => {
                *state = checked;
                true
            }
            None => false,
        }
    }

    /// User toggle. Notifies listeners and returns the event when the node
    /// exists, is not the root, and its state actually changes.
    pub fn toggle(&mut self, node: NodeId, checked: bool) -> Option<TreeCheckEvent> {
        if node == NodeId::Root {
            return None;
        }
        let state = self.state_mut(node)?;
        if *state == checked {
            return None;
        }
        *state = checked;

        let event = TreeCheckEvent {
            node,
            checked,
            parent: self.parent(node),
        };
        for listener in &mut self.listeners {
            listener(&event);
        }
        Some(event)
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        match node {
            NodeId::Root => self.root_checked,
            NodeId::Branch(branch) => self.branch(branch).checked,
            NodeId::Leaf { .. } => self.leaf(node).is_some_and(|leaf| leaf.checked),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, node: NodeId) -> bool {
        match node {
            NodeId::Root | NodeId::Branch(_) => true,
            NodeId::Leaf { .. } => self.leaf(node).is_some(),
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        match node {
            NodeId::Root => None,
            NodeId::Branch(_) => Some(NodeId::Root),
            NodeId::Leaf { branch, .. } => Some(NodeId::Branch(branch)),
        }
    }

    #[cfg(test)]
    pub fn payload(&self, node: NodeId) -> Option<&LeafPayload> {
        self.leaf(node).map(|leaf| &leaf.payload)
    }

    /// Leaves of `branch` in display order with their ids and check state.
    pub fn leaves(&self, branch: Branch) -> impl Iterator<Item = (NodeId, &LeafPayload, bool)> {
        let node = self.branch(branch);
        node.leaves.iter().enumerate().map(move |(index, leaf)| {
            (
                NodeId::Leaf {
                    branch,
                    index,
                    generation: node.generation,
                },
                &leaf.payload,
                leaf.checked,
            )
        })
    }

    pub fn leaf_count(&self, branch: Branch) -> usize {
        self.branch(branch).leaves.len()
    }

    fn branch(&self, branch: Branch) -> &BranchNode {
        match branch {
            Branch::Structures => &self.structures,
            Branch::IsoDoses => &self.iso_doses,
        }
    }

    fn branch_mut(&mut self, branch: Branch) -> &mut BranchNode {
        match branch {
            Branch::Structures => &mut self.structures,
            Branch::IsoDoses => &mut self.iso_doses,
        }
    }

    fn leaf(&self, node: NodeId) -> Option<&LeafNode> {
        let NodeId::Leaf {
            branch,
            index,
            generation,
        } = node
        else {
            return None;
        };
        let parent = self.branch(branch);
        if parent.generation != generation {
            return None;
        }
        parent.leaves.get(index)
    }

    fn state_mut(&mut self, node: NodeId) -> Option<&mut bool> {
        match node {
            NodeId::Root => Some(&mut self.root_checked),
            NodeId::Branch(branch) => Some(&mut self.branch_mut(branch).checked),
            NodeId::Leaf {
                branch,
                index,
                generation,
            } => {
                let parent = self.branch_mut(branch);
                if parent.generation != generation {
                    return None;
                }
                parent.leaves.get_mut(index).map(|leaf| &mut leaf.checked)
            }
        }
    }
}
