use super::entities::StructureLayer;
use super::geometry::SliceGeometry;
use crate::overlay::{Graphic, GraphicShape};
use glam::DVec3;
use std::sync::Arc;

/// Contour Geometric Type (3006,0042).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourKind {
    ClosedPlanar,
    OpenPlanar,
    OpenNonplanar,
    Point,
}

impl ContourKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "CLOSED_PLANAR" => Some(Self::ClosedPlanar),
            "OPEN_PLANAR" => Some(Self::OpenPlanar),
            "OPEN_NONPLANAR" => Some(Self::OpenNonplanar),
            "POINT" => Some(Self::Point),
            _ => None,
        }
    }

    fn min_points(self) -> usize {
        match self {
            Self::ClosedPlanar => 3,
            Self::OpenPlanar | Self::OpenNonplanar => 2,
            Self::Point => 1,
        }
    }

    fn shape(self) -> GraphicShape {
        match self {
            Self::ClosedPlanar => GraphicShape::Polygon,
            Self::OpenPlanar | Self::OpenNonplanar => GraphicShape::Polyline,
            Self::Point => GraphicShape::Point,
        }
    }
}

/// Planar outline in patient coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub kind: ContourKind,
    pub points: Vec<DVec3>,
    /// Owning structure; isodose lines have none.
    pub layer: Option<Arc<StructureLayer>>,
}

impl Contour {
    pub fn new(kind: ContourKind, points: Vec<DVec3>) -> Self {
        Self {
            kind,
            points,
            layer: None,
        }
    }

    #[cfg(test)]
    pub fn point(point: DVec3) -> Self {
        Self::new(ContourKind::Point, vec![point])
    }

    pub fn with_layer(mut self, layer: Arc<StructureLayer>) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Projects the contour onto `geometry`, or `None` if it is off the plane.
    pub fn graphic(&self, geometry: &SliceGeometry) -> Option<Graphic> {
        if self.points.len() < self.kind.min_points() {
            return None;
        }
        if !self.points.iter().all(|point| geometry.contains(*point)) {
            return None;
        }

        let points = self
            .points
            .iter()
            .map(|point| geometry.to_pixel(*point))
            .collect::<Vec<_>>();
        if points.iter().any(|point| !point.is_finite()) {
            return None;
        }

        Some(Graphic::new(self.kind.shape(), points))
    }

    /// Parses flat ContourData (x\y\z triplets).
    pub fn points_from_flat(data: &[f64]) -> Option<Vec<DVec3>> {
        if data.is_empty() || data.len() % 3 != 0 {
            return None;
        }
        Some(
            data.chunks_exact(3)
                .map(|xyz| DVec3::new(xyz[0], xyz[1], xyz[2]))
                .collect(),
        )
    }
}
