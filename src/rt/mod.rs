//! Radiotherapy vocabulary: structures, isodoses, contours and the case
//! that groups them for one frame of reference.

pub mod case;
pub mod contour;
pub mod entities;
pub mod geometry;
pub mod related;

pub use case::{
    ContourData, DoseData, RoiData, RtCase, RtElement, RtElementId, RtPayload, StructureSetData,
};
pub use contour::{Contour, ContourKind};
pub use entities::{
    IsoDose, IsoDoseKey, IsoDoseLayer, LayerHandle, RoiInterpretedType, Structure, StructureKey,
    StructureLayer,
};
pub use geometry::SliceGeometry;
pub use related::related_elements;
