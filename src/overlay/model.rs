use super::graphic::{Graphic, GraphicListener, LayerKind};

/// Graphics attached to one image, shared with whatever draws that image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayModel {
    image_uid: String,
    graphics: Vec<Graphic>,
    listeners: Vec<GraphicListener>,
}

impl OverlayModel {
    pub fn new(image_uid: impl Into<String>) -> Self {
        Self {
            image_uid: image_uid.into(),
            ..Self::default()
        }
    }

    pub fn image_uid(&self) -> &str {
        &self.image_uid
    }

    pub fn graphics(&self) -> &[Graphic] {
        &self.graphics
    }

    #[cfg(test)]
    pub fn graphics_of_kind(&self, kind: LayerKind) -> impl Iterator<Item = &Graphic> {
        self.graphics
            .iter()
            .filter(move |graphic| graphic.layer_kind == kind)
    }

    pub fn add_graphic(&mut self, graphic: Graphic) {
        self.graphics.push(graphic);
    }

    /// Removes every graphic tagged with `kind`, returning how many went away.
    pub fn delete_by_layer_kind(&mut self, kind: LayerKind) -> usize {
        let before = self.graphics.len();
        self.graphics.retain(|graphic| graphic.layer_kind != kind);
        before - self.graphics.len()
    }

    pub fn graphics_listeners(&self) -> &[GraphicListener] {
        &self.listeners
    }

    pub fn add_graphics_listener(&mut self, listener: GraphicListener) {
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
    }
}
