pub mod filter;
pub mod tree;

pub use filter::{
    selected_iso_doses, selected_structures, IsoDoseSelection, StructureSelection,
};
pub use tree::{Branch, LeafPayload, NodeId, SelectionTree, TreeCheckEvent};
