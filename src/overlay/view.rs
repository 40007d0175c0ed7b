use super::graphic::GraphicListener;
use super::model::OverlayModel;
use crate::rt::SliceGeometry;

/// A cross-sectional image as seen by the overlay code.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub sop_instance_uid: String,
    pub geometry: Option<SliceGeometry>,
    pub overlay: Option<OverlayModel>,
}

impl ImageElement {
    pub fn new(sop_instance_uid: impl Into<String>, geometry: Option<SliceGeometry>) -> Self {
        Self {
            sop_instance_uid: sop_instance_uid.into(),
            geometry,
            overlay: None,
        }
    }
}

/// One viewer pane: the image it displays and its repaint bookkeeping.
///
/// The pane observes the overlay of whatever image it shows through
/// `listener`.
#[derive(Debug, Clone, Default)]
pub struct SliceView {
    image: Option<ImageElement>,
    revision: u64,
    listener: GraphicListener,
}

impl SliceView {
    pub fn new(listener: GraphicListener) -> Self {
        Self {
            listener,
            ..Self::default()
        }
    }

    pub fn listener(&self) -> GraphicListener {
        self.listener
    }

    pub fn show(&mut self, image: Option<ImageElement>) {
        self.image = image;
        self.repaint();
    }

    pub fn image(&self) -> Option<&ImageElement> {
        self.image.as_ref()
    }

    pub fn image_mut(&mut self) -> Option<&mut ImageElement> {
        self.image.as_mut()
    }

    pub fn overlay(&self) -> Option<&OverlayModel> {
        self.image.as_ref().and_then(|image| image.overlay.as_ref())
    }

    /// Asks the rendering surface to draw again.
    pub fn repaint(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
