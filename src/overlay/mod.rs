//! Per-image graphics and the pass that fills them from RT data.

pub mod graphic;
pub mod model;
pub mod resolver;
pub mod view;

pub use graphic::{Graphic, GraphicListener, GraphicShape, LayerKind};
pub use model::OverlayModel;
pub use resolver::resolve;
pub use view::{ImageElement, SliceView};
