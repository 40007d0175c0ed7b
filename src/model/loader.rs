use super::{DicomEntry, DicomView, EntryContent};
use crate::config::RtDisplayConfig;
use crate::image_pipeline::{SliceImage, SliceImagePipeline};
use crate::overlay::ImageElement;
use crate::rt::{
    Contour, ContourData, ContourKind, DoseData, IsoDose, RoiData, RoiInterpretedType, RtElement,
    RtElementId, RtPayload, SliceGeometry, StructureSetData,
};
use dicom::object::{open_file, DefaultDicomObject, InMemDicomObject};
use iced::Color;
use indexmap::IndexMap;
use std::path::PathBuf;

pub fn load_dicom(path: PathBuf, config: &RtDisplayConfig) -> Result<DicomEntry, String> {
    log::info!("Loading DICOM file: {}", path.display());
    let object = open_file(&path).map_err(|err| {
        let message = format!("{}: failed to open DICOM file ({err})", path.display());
        log::error!("{message}");
        message
    })?;

    let sop_uid = attribute_text(&object, "SOPInstanceUID")
        .ok_or_else(|| format!("{}: missing SOPInstanceUID", path.display()))?;
    let modality = attribute_text(&object, "Modality").unwrap_or_default();

    let content = match modality.as_str() {
        "RTSTRUCT" => EntryContent::Rt(RtElement {
            id: RtElementId::new(
                sop_uid.clone(),
                attribute_text(&object, "StructureSetLabel").unwrap_or_default(),
            ),
            payload: RtPayload::StructureSet(read_structure_set(&object, config)),
        }),
        "RTPLAN" => EntryContent::Rt(RtElement {
            id: RtElementId::new(
                sop_uid.clone(),
                attribute_text(&object, "RTPlanLabel").unwrap_or_default(),
            ),
            payload: RtPayload::Plan,
        }),
        "RTDOSE" => EntryContent::Rt(RtElement {
            id: RtElementId::new(
                sop_uid.clone(),
                attribute_text(&object, "SeriesDescription").unwrap_or_default(),
            ),
            payload: RtPayload::Dose(read_dose(&object, config)),
        }),
        _ if object.element_by_name("Rows").is_ok() => EntryContent::Image(ImageElement::new(
            sop_uid.clone(),
            image_geometry(&object, config),
        )),
        _ => EntryContent::Other,
    };

    let image = if matches!(content, EntryContent::Image(_)) {
        extract_slice_image(&object)
    } else {
        None
    };

    Ok(DicomEntry {
        patient_id: attribute_text(&object, "PatientID").unwrap_or_else(|| "Unknown".to_string()),
        study_instance_uid: attribute_text(&object, "StudyInstanceUID")
            .unwrap_or_else(|| "Unknown".to_string()),
        series_instance_uid: attribute_text(&object, "SeriesInstanceUID")
            .unwrap_or_else(|| "Unknown".to_string()),
        sop_instance_uid: sop_uid,
        modality,
        frame_of_reference_uid: attribute_text(&object, "FrameOfReferenceUID"),
        view: DicomView {
            file_path: path,
            image,
        },
        content,
    })
}

fn extract_slice_image(object: &DefaultDicomObject) -> Option<SliceImage> {
    match SliceImagePipeline::render_first_frame(object) {
        Ok(image) => image,
        Err(err) => {
            log::warn!("Unable to build frame preview: {err}");
            None
        }
    }
}

fn image_geometry(object: &InMemDicomObject, config: &RtDisplayConfig) -> Option<SliceGeometry> {
    let tolerance = attribute_float(object, "SliceThickness")
        .filter(|thickness| *thickness > 0.0)
        .map_or(config.plane_tolerance_mm, |thickness| thickness / 2.0);

    SliceGeometry::from_dicom(
        &attribute_floats(object, "ImagePositionPatient")?,
        &attribute_floats(object, "ImageOrientationPatient")?,
        &attribute_floats(object, "PixelSpacing")?,
        u32::try_from(attribute_int(object, "Rows")?).ok()?,
        u32::try_from(attribute_int(object, "Columns")?).ok()?,
        tolerance,
    )
}

fn read_structure_set(object: &InMemDicomObject, config: &RtDisplayConfig) -> StructureSetData {
    let mut rois = IndexMap::new();
    for item in sequence_items(object, "StructureSetROISequence") {
        let Some(number) = attribute_int(item, "ROINumber") else {
            log::warn!("Skipping structure set ROI without ROINumber");
            continue;
        };
        let name = attribute_text(item, "ROIName").unwrap_or_else(|| format!("ROI {number}"));
        rois.insert(
            number,
            RoiData {
                roi_number: number,
                roi_name: name,
                color: Color::WHITE,
                thickness: config.structure_thickness,
                interpreted_type: RoiInterpretedType::Unspecified,
                contours: Vec::new(),
            },
        );
    }

    for item in sequence_items(object, "RTROIObservationsSequence") {
        let number = attribute_int(item, "ReferencedROINumber");
        let kind = attribute_text(item, "RTROIInterpretedType");
        if let (Some(roi), Some(kind)) = (number.and_then(|n| rois.get_mut(&n)), kind) {
            roi.interpreted_type = RoiInterpretedType::parse(&kind);
        }
    }

    for item in sequence_items(object, "ROIContourSequence") {
        let Some(roi) = attribute_int(item, "ReferencedROINumber").and_then(|n| rois.get_mut(&n))
        else {
            log::warn!("Skipping ROI contour that references an unknown ROI");
            continue;
        };
        if let Some(color) = attribute_ints(item, "ROIDisplayColor").and_then(|rgb| display_color(&rgb)) {
            roi.color = color;
        }

        let skipped = read_contours(sequence_items(item, "ContourSequence"), &mut roi.contours);
        if skipped > 0 {
            log::warn!("{}: skipped {skipped} malformed contour(s)", roi.roi_name);
        }
    }

    StructureSetData {
        rois: rois.into_values().collect(),
    }
}

/// Appends the well-formed contours of `items`, returning how many were not.
fn read_contours(items: &[InMemDicomObject], contours: &mut Vec<ContourData>) -> usize {
    let before = contours.len();
    contours.extend(items.iter().filter_map(read_contour));
    items.len() - (contours.len() - before)
}

fn read_contour(item: &InMemDicomObject) -> Option<ContourData> {
    let kind = attribute_text(item, "ContourGeometricType").and_then(|v| ContourKind::parse(&v))?;
    let points = Contour::points_from_flat(&attribute_floats(item, "ContourData")?)?;
    let referenced_images = sequence_items(item, "ContourImageSequence")
        .iter()
        .filter_map(|image| attribute_text(image, "ReferencedSOPInstanceUID"))
        .collect();
    Some(ContourData {
        kind,
        points,
        referenced_images,
    })
}

/// Isodose levels come from the settings; their planes are filled by the
/// dose provider, not here.
fn read_dose(object: &InMemDicomObject, config: &RtDisplayConfig) -> DoseData {
    let referenced_plan_uid = sequence_items(object, "ReferencedRTPlanSequence")
        .first()
        .and_then(|item| attribute_text(item, "ReferencedSOPInstanceUID"));
    let iso_doses = config
        .isodose_levels
        .iter()
        .map(|level| IsoDose::new(level.level, level.color(), config.isodose_thickness))
        .collect();
    DoseData {
        referenced_plan_uid,
        iso_doses,
    }
}

fn display_color(rgb: &[i32]) -> Option<Color> {
    let [r, g, b] = *rgb else {
        return None;
    };
    let channel = |value: i32| value.clamp(0, 255) as u8;
    Some(Color::from_rgb8(channel(r), channel(g), channel(b)))
}

fn attribute_text(object: &InMemDicomObject, name: &str) -> Option<String> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn attribute_int(object: &InMemDicomObject, name: &str) -> Option<i32> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_int::<i32>().ok())
}

fn attribute_ints(object: &InMemDicomObject, name: &str) -> Option<Vec<i32>> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_multi_int::<i32>().ok())
}

fn attribute_float(object: &InMemDicomObject, name: &str) -> Option<f64> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_float64().ok())
}

fn attribute_floats(object: &InMemDicomObject, name: &str) -> Option<Vec<f64>> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_multi_float64().ok())
}

fn sequence_items<'a>(object: &'a InMemDicomObject, name: &str) -> &'a [InMemDicomObject] {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.items())
        .unwrap_or(&[])
}
