use crate::message::Message;
use crate::overlay::{Graphic, GraphicShape, OverlayModel};
use glam::DVec2;
use iced::widget::canvas::{self, Cache, Frame, Geometry, Path, Stroke};
use iced::{mouse, Point, Rectangle, Renderer, Size, Theme, Vector};
use std::cell::Cell;

/// Draws the graphics of one image on top of its picture.
pub struct OverlayCanvas<'a> {
    overlay: &'a OverlayModel,
    columns: u32,
    rows: u32,
    revision: u64,
    fill_alpha: f32,
}

impl<'a> OverlayCanvas<'a> {
    pub fn new(
        overlay: &'a OverlayModel,
        columns: u32,
        rows: u32,
        revision: u64,
        fill_alpha: f32,
    ) -> Self {
        Self {
            overlay,
            columns,
            rows,
            revision,
            fill_alpha,
        }
    }
}

pub struct OverlayCache {
    cache: Cache,
    revision: Cell<Option<u64>>,
}

impl Default for OverlayCache {
    fn default() -> Self {
        Self {
            cache: Cache::new(),
            revision: Cell::new(None),
        }
    }
}

impl canvas::Program<Message> for OverlayCanvas<'_> {
    type State = OverlayCache;

    fn draw(
        &self,
        state: &OverlayCache,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        if state.revision.replace(Some(self.revision)) != Some(self.revision) {
            state.cache.clear();
        }

        let Some(fit) = ContainFit::new(bounds.size(), self.columns, self.rows) else {
            return Vec::new();
        };

        let geometry = state.cache.draw(renderer, bounds.size(), |frame| {
            for graphic in self.overlay.graphics() {
                self.draw_graphic(frame, &fit, graphic);
            }
        });
        vec![geometry]
    }
}

impl OverlayCanvas<'_> {
    fn draw_graphic(&self, frame: &mut Frame, fit: &ContainFit, graphic: &Graphic) {
        let Some((first, rest)) = graphic.points.split_first() else {
            return;
        };
        let stroke = Stroke::default()
            .with_width(graphic.line_thickness)
            .with_color(graphic.paint);

        match graphic.shape {
            GraphicShape::Point => {
                let radius = graphic.line_thickness.max(1.0) * 1.5;
                frame.fill(&Path::circle(fit.map(*first), radius), graphic.paint);
            }
            GraphicShape::Polygon | GraphicShape::Polyline => {
                let closed = graphic.shape == GraphicShape::Polygon;
                let path = Path::new(|builder| {
                    builder.move_to(fit.map(*first));
                    for point in rest {
                        builder.line_to(fit.map(*point));
                    }
                    if closed {
                        builder.close();
                    }
                });
                if closed && graphic.filled {
                    frame.fill(&path, graphic.paint.scale_alpha(self.fill_alpha));
                }
                frame.stroke(&path, stroke);
            }
        }
    }
}

/// Placement of an image scaled to fit its bounds while keeping its aspect
/// ratio, centered.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ContainFit {
    offset: Vector,
    scale: f32,
}

impl ContainFit {
    fn new(bounds: Size, columns: u32, rows: u32) -> Option<Self> {
        if columns == 0 || rows == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
            return None;
        }
        let (columns, rows) = (columns as f32, rows as f32);
        let scale = (bounds.width / columns).min(bounds.height / rows);
        Some(Self {
            offset: Vector::new(
                (bounds.width - columns * scale) / 2.0,
                (bounds.height - rows * scale) / 2.0,
            ),
            scale,
        })
    }

    /// Pixel coordinates address pixel centers.
    fn map(&self, pixel: DVec2) -> Point {
        Point::new(
            self.offset.x + (pixel.x as f32 + 0.5) * self.scale,
            self.offset.y + (pixel.y as f32 + 0.5) * self.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wide_bounds_center_horizontally() {
        let fit = ContainFit::new(Size::new(400.0, 200.0), 100, 100).unwrap();
        assert_relative_eq!(fit.scale, 2.0);
        assert_relative_eq!(fit.offset.x, 100.0);
        assert_relative_eq!(fit.offset.y, 0.0);

        let corner = fit.map(DVec2::new(-0.5, -0.5));
        assert_relative_eq!(corner.x, 100.0);
        assert_relative_eq!(corner.y, 0.0);
        let center = fit.map(DVec2::new(49.5, 49.5));
        assert_relative_eq!(center.x, 200.0);
        assert_relative_eq!(center.y, 100.0);
    }

    #[test]
    fn tall_bounds_center_vertically() {
        let fit = ContainFit::new(Size::new(256.0, 1024.0), 512, 512).unwrap();
        assert_relative_eq!(fit.scale, 0.5);
        assert_relative_eq!(fit.offset.y, 384.0);
    }

    #[test]
    fn empty_image_or_bounds_have_no_fit() {
        assert!(ContainFit::new(Size::new(100.0, 100.0), 0, 10).is_none());
        assert!(ContainFit::new(Size::ZERO, 10, 10).is_none());
    }
}
