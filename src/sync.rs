//! Keeps the layer tree, the RT case and the visible slices in step.

use crate::overlay::{resolve, LayerKind, SliceView};
use crate::rt::{RtCase, RtElement, RtElementId};
use crate::selection::{
    selected_iso_doses, selected_structures, Branch, NodeId, SelectionTree, TreeCheckEvent,
};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    NoCase,
    /// `active` once the case inventories have been materialized.
    CaseLoaded { active: bool },
}

/// Sole owner of the current RT case and of the selection tree built from it.
#[derive(Debug)]
pub struct RtSync {
    case: Option<RtCase>,
    load_enabled: bool,
    tree: SelectionTree,
    structure_sets: Vec<RtElementId>,
    plans: Vec<RtElementId>,
    selected_structure_set: Option<RtElementId>,
    selected_plan: Option<RtElementId>,
    /// Raised by the tree's check listener, consumed by `toggle`.
    overlay_stale: Rc<Cell<bool>>,
}

impl Default for RtSync {
    fn default() -> Self {
        let overlay_stale = Rc::new(Cell::new(false));
        let mut tree = SelectionTree::new();
        let stale = Rc::clone(&overlay_stale);
        tree.on_check(move |event| {
            if affects_overlay(event) {
                stale.set(true);
            }
        });

        Self {
            case: None,
            load_enabled: false,
            tree,
            structure_sets: Vec::new(),
            plans: Vec::new(),
            selected_structure_set: None,
            selected_plan: None,
            overlay_stale,
        }
    }
}

impl RtSync {
    pub fn state(&self) -> SyncState {
        match &self.case {
            None => SyncState::NoCase,
            Some(case) => SyncState::CaseLoaded {
                active: case.is_loaded(),
            },
        }
    }

    pub fn tree(&self) -> &SelectionTree {
        &self.tree
    }

    pub fn load_enabled(&self) -> bool {
        self.load_enabled
    }

    pub fn structure_sets(&self) -> &[RtElementId] {
        &self.structure_sets
    }

    pub fn plans(&self) -> &[RtElementId] {
        &self.plans
    }

    pub fn selected_structure_set(&self) -> Option<&RtElementId> {
        self.selected_structure_set.as_ref()
    }

    pub fn selected_plan(&self) -> Option<&RtElementId> {
        self.selected_plan.as_ref()
    }

    /// Called when the active image changes, with the RT objects related to it.
    ///
    /// A different element set replaces the case wholesale (unloaded again);
    /// the same set keeps the case and only re-resolves `views`.
    pub fn activate_image(&mut self, related: Vec<RtElement>, views: &mut [SliceView]) {
        let unchanged = self
            .case
            .as_ref()
            .is_some_and(|case| case.has_elements(&related));

        if !unchanged {
            self.reset();
            for view in views.iter_mut() {
                clear_rt_graphics(view);
            }
            if !related.is_empty() {
                log::info!("RT case created from {} related element(s)", related.len());
                self.case = Some(RtCase::new(related));
                self.load_enabled = true;
            }
        }

        for view in views.iter_mut() {
            self.update_canvas(view);
        }
    }

    /// Materializes the case and shows its first structure set and plan.
    ///
    /// Returns `false` when there is nothing to load.
    pub fn load(&mut self, views: &mut [SliceView]) -> bool {
        if !self.load_enabled {
            return false;
        }
        let Some(case) = self.case.as_mut() else {
            return false;
        };
        case.reload();
        self.load_enabled = false;

        for view in views.iter_mut() {
            self.update_canvas(view);
        }
        true
    }

    /// Reconciles selectors with the case inventory, then resolves `view`.
    pub fn update_canvas(&mut self, view: &mut SliceView) {
        let Some(case) = self.case.as_ref() else {
            self.reset();
            return;
        };

        self.structure_sets = case.structure_set_ids();
        self.plans = case.plan_ids();
        let first_structure_set = case.first_structure_set_id().cloned();
        let first_plan = case.first_plan_id().cloned();

        let structure_set_valid = self
            .selected_structure_set
            .as_ref()
            .is_some_and(|id| self.structure_sets.contains(id));
        if !structure_set_valid {
            self.selected_structure_set = first_structure_set;
            self.rebuild_branch(Branch::Structures);
        }

        let plan_valid = self
            .selected_plan
            .as_ref()
            .is_some_and(|id| self.plans.contains(id));
        if !plan_valid || self.tree.leaf_count(Branch::IsoDoses) == 0 {
            self.selected_plan = first_plan;
            self.rebuild_branch(Branch::IsoDoses);
        }

        self.resolve_view(view);
    }

    pub fn select_structure_set(&mut self, id: RtElementId, views: &mut [SliceView]) {
        if !self.structure_sets.contains(&id) || self.selected_structure_set.as_ref() == Some(&id) {
            return;
        }
        self.selected_structure_set = Some(id);
        self.rebuild_branch(Branch::Structures);
        self.resolve_all(views);
    }

    pub fn select_plan(&mut self, id: RtElementId, views: &mut [SliceView]) {
        if !self.plans.contains(&id) || self.selected_plan.as_ref() == Some(&id) {
            return;
        }
        self.selected_plan = Some(id);
        self.rebuild_branch(Branch::IsoDoses);
        self.resolve_all(views);
    }

    /// User check/uncheck of a tree node.
    pub fn toggle(&mut self, node: NodeId, checked: bool, views: &mut [SliceView]) {
        self.tree.toggle(node, checked);
        if self.overlay_stale.replace(false) && self.case.is_some() {
            self.resolve_all(views);
        }
    }

    fn rebuild_branch(&mut self, branch: Branch) {
        let Some(case) = self.case.as_ref() else {
            return;
        };
        match branch {
            Branch::Structures => {
                let Some(id) = self.selected_structure_set.as_ref() else {
                    return;
                };
                let layers = case.structure_set(id).unwrap_or_default();
                self.tree.rebuild(Some(&layers), None);
            }
            Branch::IsoDoses => {
                let Some(id) = self.selected_plan.as_ref() else {
                    return;
                };
                match case.plan(id).and_then(|plan| plan.first_dose()) {
                    Some(dose) => self.tree.rebuild(None, Some(&dose.iso_dose_layers())),
                    None => self.tree.disable(Branch::IsoDoses),
                }
            }
        }
    }

    fn resolve_all(&self, views: &mut [SliceView]) {
        for view in views.iter_mut() {
            self.resolve_view(view);
        }
    }

    fn resolve_view(&self, view: &mut SliceView) {
        resolve(
            self.case.as_ref(),
            &selected_structures(&self.tree),
            &selected_iso_doses(&self.tree),
            view,
        );
    }

    fn reset(&mut self) {
        self.case = None;
        self.load_enabled = false;
        self.tree.clear();
        self.structure_sets.clear();
        self.plans.clear();
        self.selected_structure_set = None;
        self.selected_plan = None;
    }
}

fn affects_overlay(event: &TreeCheckEvent) -> bool {
    matches!(event.node, NodeId::Branch(_)) || matches!(event.parent, Some(NodeId::Branch(_)))
}

fn clear_rt_graphics(view: &mut SliceView) {
    let removed = view
        .image_mut()
        .and_then(|image| image.overlay.as_mut())
        .map_or(0, |model| model.delete_by_layer_kind(LayerKind::DicomRt));
    if removed > 0 {
        view.repaint();
    }
}
