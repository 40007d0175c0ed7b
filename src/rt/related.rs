use super::case::{RtElement, RtElementId, RtPayload};
use crate::model::{DicomEntry, EntryContent};

/// Collects the RT objects and planning images that share a frame of
/// reference with `active`, in load order.
///
/// Structure sets are taken regardless of frame of reference since they
/// usually only carry it inside ReferencedFrameOfReferenceSequence.
pub fn related_elements(entries: &[DicomEntry], active: &DicomEntry) -> Vec<RtElement> {
    let Some(frame_of_reference) = active
        .frame_of_reference_uid
        .as_deref()
        .filter(|uid| !uid.is_empty())
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| entry.patient_id == active.patient_id)
        .filter(|entry| {
            entry.frame_of_reference_uid.as_deref() == Some(frame_of_reference)
                || entry.modality == "RTSTRUCT"
        })
        .filter_map(|entry| match &entry.content {
            EntryContent::Rt(element) => Some(element.clone()),
            EntryContent::Image(_) if entry.modality == "CT" => Some(RtElement {
                id: RtElementId::new(entry.sop_instance_uid.clone(), ""),
                payload: RtPayload::Image,
            }),
            _ => None,
        })
        .collect()
}
