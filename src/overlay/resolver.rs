use super::graphic::{Graphic, GraphicListener, LayerKind};
use super::model::OverlayModel;
use super::view::SliceView;
use crate::rt::RtCase;
use crate::selection::{IsoDoseSelection, StructureSelection};

/// Replaces the RT graphics of the slice shown in `view` with the ones the
/// current selection calls for.
///
/// Leaves the view untouched when there is no case, no sliced image, or
/// neither contours nor a dose for that image. Isodose lines are added
/// before structures so structures paint on top.
pub fn resolve(
    rt_case: Option<&RtCase>,
    structures: &StructureSelection,
    iso_doses: &IsoDoseSelection,
    view: &mut SliceView,
) {
    let Some(rt_case) = rt_case else {
        return;
    };
    let pane = view.listener();
    let Some(image) = view.image_mut() else {
        return;
    };
    let Some(geometry) = image.geometry.clone() else {
        return;
    };
    let z = geometry.z();

    let contours = rt_case.contours_for(&image.sop_instance_uid);
    let dose = rt_case.first_plan().and_then(|plan| plan.first_dose());
    if contours.is_none() && dose.is_none() {
        return;
    }

    if let Some(model) = image.overlay.as_mut() {
        model.delete_by_layer_kind(LayerKind::DicomRt);
    } else {
        log::debug!("Attaching overlay model to {}", image.sop_instance_uid);
    }
    let uid = image.sop_instance_uid.clone();
    let model = image
        .overlay
        .get_or_insert_with(|| OverlayModel::new(uid));
    model.add_graphics_listener(pane);

    let mut added_iso = 0;
    if let Some(dose) = dose {
        for layer in dose.iso_doses.values() {
            let iso_dose = &layer.iso_dose;
            if !iso_doses.contains(iso_dose) {
                continue;
            }
            let Some(plane) = iso_dose.contours_at(z) else {
                continue;
            };
            for contour in plane {
                if let Some(mut graphic) = contour.graphic(&geometry) {
                    graphic.line_thickness = iso_dose.thickness;
                    graphic.paint = iso_dose.color;
                    graphic.layer_kind = LayerKind::DicomRt;
                    graphic.layer = Some(layer.layer);
                    graphic.filled = true;
                    install(model, graphic);
                    added_iso += 1;
                }
            }
        }
    }

    let mut added_structures = 0;
    for contour in contours.unwrap_or_default() {
        let Some(layer) = contour.layer.as_ref() else {
            continue;
        };
        let structure = &layer.structure;
        if !structures.contains(structure) {
            continue;
        }
        if let Some(mut graphic) = contour.graphic(&geometry) {
            graphic.line_thickness = structure.thickness;
            graphic.paint = structure.color;
            graphic.layer_kind = LayerKind::DicomRt;
            graphic.layer = Some(layer.layer);
            // External outlines stay hollow; organs and targets are filled.
            graphic.filled = !structure.interpreted_type.is_external();
            install(model, graphic);
            added_structures += 1;
        }
    }

    log::debug!(
        "{} at z={z}: {added_iso} isodose and {added_structures} structure graphic(s)",
        model.image_uid()
    );
    view.repaint();
}

fn install(model: &mut OverlayModel, mut graphic: Graphic) {
    let listeners: Vec<GraphicListener> = model.graphics_listeners().to_vec();
    for listener in listeners {
        graphic.add_listener(listener);
    }
    model.add_graphic(graphic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{GraphicShape, ImageElement};
    use crate::rt::case::fixtures::*;
    use crate::rt::geometry::axial;
    use crate::rt::{IsoDose, StructureLayer};
    use glam::DVec2;
    use std::sync::Arc;

    const CT: &str = "ct-10";

    fn view_at(z: f64) -> SliceView {
        let mut view = SliceView::default();
        view.show(Some(ImageElement::new(CT, Some(axial(z)))));
        view
    }

    fn with_annotation(mut view: SliceView) -> SliceView {
        let image = view.image_mut().unwrap();
        let mut model = OverlayModel::new(CT);
        model.add_graphic(Graphic::new(GraphicShape::Point, vec![DVec2::ONE]));
        image.overlay = Some(model);
        view
    }

    fn ptv_case() -> RtCase {
        loaded(vec![structure_set(
            "rs",
            vec![roi(1, "PTV", "TARGET", vec![square_on(CT, 10.0)])],
        )])
    }

    fn all_structures(case: &RtCase) -> StructureSelection {
        let id = case.first_structure_set_id().unwrap();
        StructureSelection::from_layers(&case.structure_set(id).unwrap())
    }

    fn rt_graphics(view: &SliceView) -> Vec<Graphic> {
        view.overlay()
            .map(|model| model.graphics_of_kind(LayerKind::DicomRt).cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn selected_target_yields_one_filled_rt_graphic() {
        let case = ptv_case();
        let mut view = view_at(10.0);
        resolve(Some(&case), &all_structures(&case), &IsoDoseSelection::default(), &mut view);

        let graphics = rt_graphics(&view);
        assert_eq!(graphics.len(), 1);
        assert!(graphics[0].filled);
        assert_eq!(graphics[0].layer_kind, LayerKind::DicomRt);
        assert_eq!(graphics[0].line_thickness, 2.0);
        assert!(graphics[0].layer.is_some());
    }

    #[test]
    fn unselected_structure_adds_nothing_and_keeps_other_graphics() {
        let case = ptv_case();
        let mut view = with_annotation(view_at(10.0));
        resolve(
            Some(&case),
            &StructureSelection::default(),
            &IsoDoseSelection::default(),
            &mut view,
        );

        assert!(rt_graphics(&view).is_empty());
        assert_eq!(view.overlay().unwrap().graphics().len(), 1);
    }

    #[test]
    fn external_structures_are_not_filled() {
        let case = loaded(vec![structure_set(
            "rs",
            vec![
                roi(1, "Body", "EXTERNAL", vec![square_on(CT, 10.0)]),
                roi(2, "Heart", "ORGAN", vec![square_on(CT, 10.0)]),
            ],
        )]);
        let mut view = view_at(10.0);
        resolve(Some(&case), &all_structures(&case), &IsoDoseSelection::default(), &mut view);

        let filled: Vec<bool> = rt_graphics(&view).iter().map(|g| g.filled).collect();
        assert_eq!(filled, [false, true]);
    }

    #[test]
    fn isodose_plane_lookup_is_exact() {
        let case = loaded(vec![
            plan("rp"),
            dose("rd", Some("rp"), vec![iso_dose_with_plane(50.0, 12.0)]),
        ]);
        let iso_doses = IsoDoseSelection::from_layers(
            &case.first_plan().unwrap().first_dose().unwrap().iso_dose_layers(),
        );

        let mut view = view_at(10.0);
        resolve(Some(&case), &StructureSelection::default(), &iso_doses, &mut view);
        assert!(rt_graphics(&view).is_empty());

        let mut view = view_at(12.0);
        resolve(Some(&case), &StructureSelection::default(), &iso_doses, &mut view);
        let graphics = rt_graphics(&view);
        assert_eq!(graphics.len(), 1);
        assert!(graphics[0].filled);
        assert_eq!(graphics[0].line_thickness, 1.5);
    }

    #[test]
    fn isodoses_are_added_beneath_structures() {
        let case = loaded(vec![
            structure_set("rs", vec![roi(1, "PTV", "PTV", vec![square_on(CT, 10.0)])]),
            plan("rp"),
            dose("rd", Some("rp"), vec![iso_dose_with_plane(95.0, 10.0)]),
        ]);
        let iso_doses = IsoDoseSelection::from_layers(
            &case.first_plan().unwrap().first_dose().unwrap().iso_dose_layers(),
        );
        let mut view = view_at(10.0);
        resolve(Some(&case), &all_structures(&case), &iso_doses, &mut view);

        let thickness: Vec<f32> = rt_graphics(&view).iter().map(|g| g.line_thickness).collect();
        assert_eq!(thickness, [1.5, 2.0]);
    }

    #[test]
    fn resolving_twice_replaces_instead_of_appending() {
        let case = ptv_case();
        let selection = all_structures(&case);
        let mut view = with_annotation(view_at(10.0));

        resolve(Some(&case), &selection, &IsoDoseSelection::default(), &mut view);
        let first = view.overlay().unwrap().graphics().to_vec();
        resolve(Some(&case), &selection, &IsoDoseSelection::default(), &mut view);

        assert_eq!(view.overlay().unwrap().graphics(), first.as_slice());
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn larger_selection_yields_superset() {
        let case = loaded(vec![structure_set(
            "rs",
            vec![
                roi(1, "PTV", "PTV", vec![square_on(CT, 10.0)]),
                roi(2, "Cord", "ORGAN", vec![square_on(CT, 10.0)]),
            ],
        )]);
        let layers = case.structure_set(case.first_structure_set_id().unwrap()).unwrap();
        let small = StructureSelection::from_layers(&layers[..1]);
        let large = StructureSelection::from_layers(&layers);

        let mut view = view_at(10.0);
        resolve(Some(&case), &small, &IsoDoseSelection::default(), &mut view);
        let subset = rt_graphics(&view);
        resolve(Some(&case), &large, &IsoDoseSelection::default(), &mut view);
        let superset = rt_graphics(&view);

        assert_eq!(superset.len(), 2);
        assert!(subset.iter().all(|graphic| superset.contains(graphic)));
    }

    #[test]
    fn registered_listeners_are_attached_to_every_graphic() {
        let case = ptv_case();
        let mut view = SliceView::new(GraphicListener(9));
        view.show(Some(ImageElement::new(CT, Some(axial(10.0)))));
        let mut model = OverlayModel::new(CT);
        model.add_graphics_listener(GraphicListener(1));
        model.add_graphics_listener(GraphicListener(2));
        view.image_mut().unwrap().overlay = Some(model);

        resolve(Some(&case), &all_structures(&case), &IsoDoseSelection::default(), &mut view);
        let graphics = rt_graphics(&view);
        assert_eq!(
            graphics[0].listeners(),
            &[GraphicListener(1), GraphicListener(2), GraphicListener(9)]
        );
    }

    #[test]
    fn new_overlay_model_is_observed_by_its_pane() {
        let case = ptv_case();
        let mut view = SliceView::new(GraphicListener(4));
        view.show(Some(ImageElement::new(CT, Some(axial(10.0)))));

        resolve(Some(&case), &all_structures(&case), &IsoDoseSelection::default(), &mut view);
        let model = view.overlay().unwrap();
        assert_eq!(model.image_uid(), CT);
        assert_eq!(model.graphics_listeners(), &[GraphicListener(4)]);
        assert_eq!(model.graphics()[0].listeners(), &[GraphicListener(4)]);
    }

    #[test]
    fn missing_case_is_a_strict_no_op() {
        let mut view = with_annotation(view_at(10.0));
        let before = view.revision();
        resolve(None, &StructureSelection::default(), &IsoDoseSelection::default(), &mut view);

        assert_eq!(view.revision(), before);
        assert_eq!(view.overlay().unwrap().graphics().len(), 1);
    }

    #[test]
    fn slice_without_rt_data_is_left_alone() {
        let case = ptv_case();
        let mut view = SliceView::default();
        view.show(Some(ImageElement::new("other", Some(axial(10.0)))));
        let before = view.revision();

        resolve(Some(&case), &all_structures(&case), &IsoDoseSelection::default(), &mut view);
        assert!(view.overlay().is_none());
        assert_eq!(view.revision(), before);
    }

    #[test]
    fn empty_and_missing_inputs_never_fail() {
        let case = ptv_case();
        let unloaded = RtCase::new(Vec::new());
        let none = StructureSelection::default();
        let no_iso = IsoDoseSelection::default();

        let mut empty_view = SliceView::default();
        resolve(Some(&case), &none, &no_iso, &mut empty_view);

        let mut no_geometry = SliceView::default();
        no_geometry.show(Some(ImageElement::new(CT, None)));
        resolve(Some(&case), &all_structures(&case), &no_iso, &mut no_geometry);
        assert!(no_geometry.overlay().is_none());

        let mut view = view_at(10.0);
        resolve(Some(&unloaded), &none, &no_iso, &mut view);
        assert!(view.overlay().is_none());

        let orphan = Arc::new(StructureLayer {
            structure: case.structure_set(case.first_structure_set_id().unwrap()).unwrap()[0]
                .structure
                .clone(),
            layer: crate::rt::LayerHandle::new(999),
        });
        resolve(Some(&case), &StructureSelection::from_layers([&orphan]), &no_iso, &mut view);
        assert_eq!(rt_graphics(&view).len(), 1);

        let dose_without_planes = loaded(vec![
            plan("rp"),
            dose("rd", Some("rp"), vec![IsoDose::new(50.0, iced::Color::WHITE, 1.0)]),
        ]);
        let mut view = view_at(10.0);
        resolve(Some(&dose_without_planes), &none, &no_iso, &mut view);
        assert!(rt_graphics(&view).is_empty());
        assert!(view.overlay().is_some());
    }
}
