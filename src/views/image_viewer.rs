use super::overlay_canvas::OverlayCanvas;
use crate::config::RtDisplayConfig;
use crate::message::Message;
use crate::model::DicomView;
use crate::overlay::SliceView;
use iced::widget::{canvas, column, stack, text, Image};
use iced::{Element, Length};

pub fn image_panel<'a>(
    view: Option<&'a DicomView>,
    slice: &'a SliceView,
    config: &RtDisplayConfig,
) -> Element<'a, Message> {
    let Some(view) = view else {
        return text("Select an instance to preview its first frame").into();
    };
    let caption = text(format!("File: {}", view.file_path.display())).size(14);
    let Some(image) = &view.image else {
        return column![caption, text("No frame preview available")]
            .spacing(12)
            .into();
    };

    let picture = Image::new(image.handle.clone())
        .width(Length::Fill)
        .height(Length::Fill);

    let body: Element<'a, Message> = match slice.overlay() {
        Some(overlay) if !overlay.graphics().is_empty() => {
            let layer = canvas(OverlayCanvas::new(
                overlay,
                image.columns,
                image.rows,
                slice.revision(),
                config.fill_alpha,
            ))
            .width(Length::Fill)
            .height(Length::Fill);
            stack![picture, layer].into()
        }
        _ => picture.into(),
    };

    column![caption, body].spacing(12).into()
}
