use crate::rt::LayerHandle;
use glam::DVec2;
use iced::Color;

/// Tag that groups graphics by producer on one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Radiotherapy structures and isodose lines.
    DicomRt,
    Annotation,
}

/// Handle of an observer notified when a graphic changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GraphicListener(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicShape {
    Polygon,
    Polyline,
    Point,
}

/// A 2D drawable in pixel coordinates of the image it is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub shape: GraphicShape,
    pub points: Vec<DVec2>,
    pub line_thickness: f32,
    pub paint: Color,
    pub layer_kind: LayerKind,
    pub layer: Option<LayerHandle>,
    pub filled: bool,
    listeners: Vec<GraphicListener>,
}

impl Graphic {
    pub fn new(shape: GraphicShape, points: Vec<DVec2>) -> Self {
        Self {
            shape,
            points,
            line_thickness: 1.0,
            paint: Color::WHITE,
            layer_kind: LayerKind::Annotation,
            layer: None,
            filled: false,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: GraphicListener) {
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    #[cfg(test)]
    pub fn listeners(&self) -> &[GraphicListener] {
        &self.listeners
    }
}
