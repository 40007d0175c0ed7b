use crate::image_pipeline::SliceImage;
use crate::overlay::ImageElement;
use crate::rt::RtElement;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DicomView {
    pub file_path: PathBuf,
    pub image: Option<SliceImage>,
}

/// What an instance contributes once loaded.
#[derive(Debug, Clone)]
pub enum EntryContent {
    Image(ImageElement),
    Rt(RtElement),
    Other,
}

#[derive(Debug, Clone)]
pub struct DicomEntry {
    pub patient_id: String,
    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub sop_instance_uid: String,
    pub modality: String,
    pub frame_of_reference_uid: Option<String>,
    pub view: DicomView,
    pub content: EntryContent,
}

impl DicomEntry {
    pub fn image_element(&self) -> Option<&ImageElement> {
        match &self.content {
            EntryContent::Image(image) => Some(image),
            _ => None,
        }
    }
}
