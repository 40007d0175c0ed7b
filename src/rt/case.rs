use super::contour::{Contour, ContourKind};
use super::entities::{
    Dose, IsoDose, IsoDoseLayer, LayerHandle, Plan, RoiInterpretedType, Structure, StructureLayer,
};
use glam::DVec3;
use iced::Color;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identity of one RT object (structure set, plan, dose or image).
///
/// Doubles as the selector shown in the structure set / plan pick lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RtElementId {
    pub sop_instance_uid: String,
    pub label: String,
}

impl RtElementId {
    pub fn new(sop_instance_uid: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            sop_instance_uid: sop_instance_uid.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for RtElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            f.write_str(&self.sop_instance_uid)
        } else {
            f.write_str(&self.label)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContourData {
    pub kind: ContourKind,
    pub points: Vec<DVec3>,
    /// SOP instance UIDs of the images this contour was drawn on.
    pub referenced_images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoiData {
    pub roi_number: i32,
    pub roi_name: String,
    pub color: Color,
    pub thickness: f32,
    pub interpreted_type: RoiInterpretedType,
    pub contours: Vec<ContourData>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureSetData {
    pub rois: Vec<RoiData>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DoseData {
    pub referenced_plan_uid: Option<String>,
    pub iso_doses: Vec<IsoDose>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RtPayload {
    StructureSet(StructureSetData),
    Plan,
    Dose(DoseData),
    Image,
}

/// One related DICOM object handed over by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct RtElement {
    pub id: RtElementId,
    pub payload: RtPayload,
}

type StructureSet = IndexMap<i32, Arc<StructureLayer>>;

/// Radiotherapy data for one frame of reference.
///
/// Created unloaded from its related elements; [`RtCase::reload`]
/// materializes the contour, structure set and plan inventories.
#[derive(Debug, Clone)]
pub struct RtCase {
    elements: Vec<RtElement>,
    loaded: bool,
    next_layer: u64,
    contours: HashMap<String, Vec<Contour>>,
    structure_sets: IndexMap<RtElementId, StructureSet>,
    plans: IndexMap<RtElementId, Plan>,
}

impl RtCase {
    pub fn new(elements: Vec<RtElement>) -> Self {
        Self {
            elements,
            loaded: false,
            next_layer: 0,
            contours: HashMap::new(),
            structure_sets: IndexMap::new(),
            plans: IndexMap::new(),
        }
    }

    /// True when `elements` names exactly the objects this case was built from.
    pub fn has_elements(&self, elements: &[RtElement]) -> bool {
        self.elements.len() == elements.len()
            && self
                .elements
                .iter()
                .zip(elements)
                .all(|(ours, theirs)| ours.id == theirs.id)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn reload(&mut self) {
        self.contours.clear();
        self.structure_sets.clear();
        self.plans.clear();

        let elements = std::mem::take(&mut self.elements);
        for element in &elements {
            match &element.payload {
                RtPayload::StructureSet(data) => self.materialize_structure_set(&element.id, data),
                RtPayload::Plan => {
                    self.plans.insert(
                        element.id.clone(),
                        Plan {
                            sop_instance_uid: element.id.sop_instance_uid.clone(),
                            label: element.id.label.clone(),
                            doses: Vec::new(),
                        },
                    );
                }
                RtPayload::Dose(_) | RtPayload::Image => {}
            }
        }

        // Doses after plans so references resolve regardless of element order.
        for element in &elements {
            if let RtPayload::Dose(data) = &element.payload {
                self.materialize_dose(&element.id, data);
            }
        }
        self.elements = elements;
        self.loaded = true;

        log::info!(
            "RT case loaded: {} structure set(s), {} plan(s), {} contoured image(s)",
            self.structure_sets.len(),
            self.plans.len(),
            self.contours.len()
        );
    }

    fn next_layer(&mut self) -> LayerHandle {
        self.next_layer += 1;
        LayerHandle::new(self.next_layer)
    }

    fn materialize_structure_set(&mut self, id: &RtElementId, data: &StructureSetData) {
        let mut set = StructureSet::new();
        for roi in &data.rois {
            let layer = Arc::new(StructureLayer {
                structure: Structure {
                    roi_number: roi.roi_number,
                    roi_name: roi.roi_name.clone(),
                    color: roi.color,
                    thickness: roi.thickness,
                    interpreted_type: roi.interpreted_type.clone(),
                },
                layer: self.next_layer(),
            });

            for contour in &roi.contours {
                for image_uid in &contour.referenced_images {
                    self.contours
                        .entry(image_uid.clone())
                        .or_default()
                        .push(
                            Contour::new(contour.kind, contour.points.clone())
                                .with_layer(Arc::clone(&layer)),
                        );
                }
            }

            if set.insert(roi.roi_number, layer).is_some() {
                log::warn!(
                    "Structure set {id} repeats ROI number {}, keeping the last one",
                    roi.roi_number
                );
            }
        }
        self.structure_sets.insert(id.clone(), set);
    }

    fn materialize_dose(&mut self, id: &RtElementId, data: &DoseData) {
        let mut iso_doses = IndexMap::new();
        for (index, iso_dose) in data.iso_doses.iter().enumerate() {
            let layer = IsoDoseLayer {
                iso_dose: iso_dose.clone(),
                layer: self.next_layer(),
            };
            iso_doses.insert(index as i32, Arc::new(layer));
        }
        let dose = Dose {
            sop_instance_uid: id.sop_instance_uid.clone(),
            iso_doses,
        };

        let target = data.referenced_plan_uid.as_deref().and_then(|plan_uid| {
            self.plans
                .values_mut()
                .find(|plan| plan.sop_instance_uid == plan_uid)
        });
        match target {
            Some(plan) => plan.doses.push(dose),
            None => {
                log::debug!("Dose {id} has no loaded plan, using it as its own plan");
                self.plans.insert(
                    id.clone(),
                    Plan {
                        sop_instance_uid: id.sop_instance_uid.clone(),
                        label: id.to_string(),
                        doses: vec![dose],
                    },
                );
            }
        }
    }

    /// Contours drawn on the image with the given SOP instance UID.
    pub fn contours_for(&self, image_uid: &str) -> Option<&[Contour]> {
        self.contours.get(image_uid).map(Vec::as_slice)
    }

    pub fn structure_set_ids(&self) -> Vec<RtElementId> {
        self.structure_sets.keys().cloned().collect()
    }

    pub fn structure_set(&self, id: &RtElementId) -> Option<Vec<Arc<StructureLayer>>> {
        self.structure_sets
            .get(id)
            .map(|set| set.values().cloned().collect())
    }

    pub fn first_structure_set_id(&self) -> Option<&RtElementId> {
        self.structure_sets.keys().next()
    }

    pub fn plan_ids(&self) -> Vec<RtElementId> {
        self.plans.keys().cloned().collect()
    }

    pub fn plan(&self, id: &RtElementId) -> Option<&Plan> {
        self.plans.get(id)
    }

    pub fn first_plan_id(&self) -> Option<&RtElementId> {
        self.plans.keys().next()
    }

    pub fn first_plan(&self) -> Option<&Plan> {
        self.plans.values().next()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn roi(number: i32, name: &str, kind: &str, contours: Vec<ContourData>) -> RoiData {
        RoiData {
            roi_number: number,
            roi_name: name.to_string(),
            color: Color::from_rgb8(255, 0, 0),
            thickness: 2.0,
            interpreted_type: RoiInterpretedType::parse(kind),
            contours,
        }
    }

    pub(crate) fn square_on(image_uid: &str, z: f64) -> ContourData {
        ContourData {
            kind: ContourKind::ClosedPlanar,
            points: vec![
                DVec3::new(0.0, 0.0, z),
                DVec3::new(10.0, 0.0, z),
                DVec3::new(10.0, 10.0, z),
            ],
            referenced_images: vec![image_uid.to_string()],
        }
    }

    pub(crate) fn structure_set(uid: &str, rois: Vec<RoiData>) -> RtElement {
        RtElement {
            id: RtElementId::new(uid, format!("RS {uid}")),
            payload: RtPayload::StructureSet(StructureSetData { rois }),
        }
    }

    pub(crate) fn plan(uid: &str) -> RtElement {
        RtElement {
            id: RtElementId::new(uid, format!("RP {uid}")),
            payload: RtPayload::Plan,
        }
    }

    pub(crate) fn dose(uid: &str, plan_uid: Option<&str>, iso_doses: Vec<IsoDose>) -> RtElement {
        RtElement {
            id: RtElementId::new(uid, format!("RD {uid}")),
            payload: RtPayload::Dose(DoseData {
                referenced_plan_uid: plan_uid.map(str::to_string),
                iso_doses,
            }),
        }
    }

    pub(crate) fn iso_dose_with_plane(level: f64, z: f64) -> IsoDose {
        let mut iso = IsoDose::new(level, Color::from_rgb8(0, 0, 255), 1.5);
        iso.add_contour(
            z,
            Contour::new(
                ContourKind::ClosedPlanar,
                vec![
                    DVec3::new(-5.0, -5.0, z),
                    DVec3::new(5.0, -5.0, z),
                    DVec3::new(5.0, 5.0, z),
                ],
            ),
        );
        iso
    }

    pub(crate) fn image(uid: &str) -> RtElement {
        RtElement {
            id: RtElementId::new(uid, ""),
            payload: RtPayload::Image,
        }
    }

    pub(crate) fn loaded(elements: Vec<RtElement>) -> RtCase {
        let mut case = RtCase::new(elements);
        case.reload();
        case
    }
}
