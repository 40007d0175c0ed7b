pub mod dicom_entry;
pub mod loader;
pub mod tree;

pub use dicom_entry::{DicomEntry, DicomView, EntryContent};
pub use tree::TreeNodeKey;
