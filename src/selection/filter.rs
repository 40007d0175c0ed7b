use super::tree::{Branch, LeafPayload, NodeId, SelectionTree};
use crate::rt::{IsoDose, IsoDoseKey, IsoDoseLayer, Structure, StructureKey, StructureLayer};
use indexmap::IndexMap;
use std::hash::Hash;
use std::sync::Arc;

/// Checked layers keyed by identity, in tree order.
#[derive(Debug, Clone)]
pub struct LayerSelection<K, L> {
    layers: IndexMap<K, Arc<L>>,
}

impl<K, L> Default for LayerSelection<K, L> {
    fn default() -> Self {
        Self {
            layers: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq, L> LayerSelection<K, L> {
    /// Keeps the first layer seen for a key.
    fn insert(&mut self, key: K, layer: Arc<L>) {
        self.layers.entry(key).or_insert(layer);
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.layers.contains_key(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    #[cfg(test)]
    pub fn layers(&self) -> impl Iterator<Item = &Arc<L>> {
        self.layers.values()
    }
}

pub type StructureSelection = LayerSelection<StructureKey, StructureLayer>;
pub type IsoDoseSelection = LayerSelection<IsoDoseKey, IsoDoseLayer>;

impl StructureSelection {
    pub fn from_layers<'a>(layers: impl IntoIterator<Item = &'a Arc<StructureLayer>>) -> Self {
        let mut selection = Self::default();
        for layer in layers {
            selection.insert(layer.structure.key(), Arc::clone(layer));
        }
        selection
    }

    pub fn contains(&self, structure: &Structure) -> bool {
        self.contains_key(&structure.key())
    }
}

impl IsoDoseSelection {
    pub fn from_layers<'a>(layers: impl IntoIterator<Item = &'a Arc<IsoDoseLayer>>) -> Self {
        let mut selection = Self::default();
        for layer in layers {
            selection.insert(layer.iso_dose.key(), Arc::clone(layer));
        }
        selection
    }

    pub fn contains(&self, iso_dose: &IsoDose) -> bool {
        self.contains_key(&iso_dose.key())
    }
}

/// Checked structure leaves, or nothing when the Structures branch is off.
pub fn selected_structures(tree: &SelectionTree) -> StructureSelection {
    if !tree.is_checked(NodeId::Branch(Branch::Structures)) {
        return StructureSelection::default();
    }
    StructureSelection::from_layers(tree.leaves(Branch::Structures).filter_map(
        |(_, payload, checked)| match payload {
            LeafPayload::Structure(layer) if checked => Some(layer),
            _ => None,
        },
    ))
}

/// Checked isodose leaves, or nothing when the Isodoses branch is off.
pub fn selected_iso_doses(tree: &SelectionTree) -> IsoDoseSelection {
    if !tree.is_checked(NodeId::Branch(Branch::IsoDoses)) {
        return IsoDoseSelection::default();
    }
    IsoDoseSelection::from_layers(tree.leaves(Branch::IsoDoses).filter_map(
        |(_, payload, checked)| match payload {
            LeafPayload::IsoDose(layer) if checked => Some(layer),
            _ => None,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt::{LayerHandle, RoiInterpretedType};
    use iced::Color;

    fn structure_layer(number: i32, name: &str, handle: u64) -> Arc<StructureLayer> {
        Arc::new(StructureLayer {
            structure: Structure {
                roi_number: number,
                roi_name: name.into(),
                color: Color::WHITE,
                thickness: 1.0,
                interpreted_type: RoiInterpretedType::Organ,
            },
            layer: LayerHandle::new(handle),
        })
    }

    fn iso_layer(level: f64, handle: u64) -> Arc<IsoDoseLayer> {
        Arc::new(IsoDoseLayer {
            iso_dose: IsoDose::new(level, Color::WHITE, 1.0),
            layer: LayerHandle::new(handle),
        })
    }

    fn check_all(tree: &mut SelectionTree, branch: Branch) {
        let ids: Vec<_> = tree.leaves(branch).map(|(id, _, _)| id).collect();
        for id in ids {
            tree.toggle(id, true);
        }
    }

    #[test]
    fn unchecked_branch_selects_nothing() {
        let mut tree = SelectionTree::new();
        tree.rebuild(Some(&[structure_layer(1, "PTV", 1)]), None);
        check_all(&mut tree, Branch::Structures);
        tree.toggle(NodeId::Branch(Branch::Structures), false);

        assert!(selected_structures(&tree).is_empty());
    }

    #[test]
    fn checked_branch_without_checked_leaves_selects_nothing() {
        let mut tree = SelectionTree::new();
        tree.rebuild(Some(&[structure_layer(1, "PTV", 1)]), Some(&[iso_layer(50.0, 2)]));
        assert!(selected_structures(&tree).is_empty());
        assert!(selected_iso_doses(&tree).is_empty());
    }

    #[test]
    fn only_checked_leaves_are_selected() {
        let mut tree = SelectionTree::new();
        tree.rebuild(
            Some(&[structure_layer(1, "PTV", 1), structure_layer(2, "Lung", 2)]),
            None,
        );
        let lung = tree.leaves(Branch::Structures).nth(1).map(|(id, _, _)| id).unwrap();
        tree.toggle(lung, true);

        let selection = selected_structures(&tree);
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&structure_layer(2, "Lung", 99).structure));
        assert!(!selection.contains(&structure_layer(1, "PTV", 1).structure));
    }

    #[test]
    fn duplicate_identity_collapses_to_first_leaf() {
        let mut tree = SelectionTree::new();
        tree.rebuild(
            Some(&[structure_layer(1, "PTV", 10), structure_layer(1, "PTV", 11)]),
            Some(&[iso_layer(50.0, 20), iso_layer(50.0, 21)]),
        );
        check_all(&mut tree, Branch::Structures);
        check_all(&mut tree, Branch::IsoDoses);

        let structures = selected_structures(&tree);
        assert_eq!(structures.len(), 1);
        assert_eq!(structures.layers().next().map(|l| l.layer), Some(LayerHandle::new(10)));

        let iso_doses = selected_iso_doses(&tree);
        assert_eq!(iso_doses.len(), 1);
        assert_eq!(iso_doses.layers().next().map(|l| l.layer), Some(LayerHandle::new(20)));
    }

    #[test]
    fn isodose_membership_matches_level_and_label() {
        let selection = IsoDoseSelection::from_layers(&[iso_layer(50.0, 1)]);
        assert!(selection.contains(&IsoDose::new(50.0, Color::BLACK, 3.0)));
        assert!(!selection.contains(&IsoDose::new(95.0, Color::WHITE, 1.0)));

        let mut relabelled = IsoDose::new(50.0, Color::WHITE, 1.0);
        relabelled.label = "Rx".into();
        assert!(!selection.contains(&relabelled));
    }
}
