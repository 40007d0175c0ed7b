pub mod image_viewer;
pub mod overlay_canvas;
pub mod rt_panel;
pub mod tree_browser;

pub use image_viewer::image_panel;
pub use rt_panel::rt_panel;
pub use tree_browser::tree_panel;
