use dicom::object::DefaultDicomObject;
use dicom::pixeldata::{DecodedPixelData, PhotometricInterpretation, PixelDecoder};
use iced::widget::image::Handle;

/// First frame of an instance, ready for display.
///
/// `columns`/`rows` are kept so overlays can map pixel coordinates onto
/// the scaled widget.
#[derive(Debug, Clone)]
pub struct SliceImage {
    pub handle: Handle,
    pub columns: u32,
    pub rows: u32,
}

pub struct SliceImagePipeline;

impl SliceImagePipeline {
    pub fn render_first_frame(object: &DefaultDicomObject) -> Result<Option<SliceImage>, String> {
        let decoded = object
            .decode_pixel_data()
            .map_err(|err| format!("Failed to decode pixel data: {err}"))?;

        if decoded.number_of_frames() == 0 {
            return Ok(None);
        }

        let rgba = match decoded.photometric_interpretation() {
            photometric if photometric.is_monochrome() => Self::grayscale(&decoded)?,
            other => Self::color(&decoded, other)?,
        };

        Ok(Some(SliceImage {
            handle: Handle::from_rgba(decoded.columns(), decoded.rows(), rgba),
            columns: decoded.columns(),
            rows: decoded.rows(),
        }))
    }

    /// Stretches rescaled values over the full 8-bit range.
    fn grayscale(decoded: &DecodedPixelData<'_>) -> Result<Vec<u8>, String> {
        let samples = decoded
            .to_vec_frame::<f32>(0)
            .map_err(|err| format!("Failed to materialize frame data: {err}"))?;
        let invert = matches!(
            decoded.photometric_interpretation(),
            PhotometricInterpretation::Monochrome1
        );

        let (min, max) = value_range(&samples).unwrap_or((0.0, 0.0));
        let mut rgba = Vec::with_capacity(samples.len() * 4);
        for &value in &samples {
            let mut gray = stretch(value, min, max);
            if invert {
                gray = 255 - gray;
            }
            rgba.extend_from_slice(&[gray, gray, gray, 255]);
        }
        Ok(rgba)
    }

    fn color(
        decoded: &DecodedPixelData<'_>,
        interpretation: &PhotometricInterpretation,
    ) -> Result<Vec<u8>, String> {
        decoded
            .to_dynamic_image(0)
            .map(|image| image.into_rgba8().into_raw())
            .map_err(|err| {
                format!(
                    "Unsupported photometric interpretation `{}`: {err}",
                    interpretation.as_str()
                )
            })
    }
}

fn value_range(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
}

fn stretch(value: f32, min: f32, max: f32) -> u8 {
    if max <= min || !value.is_finite() {
        return 0;
    }
    ((value - min) / (max - min) * 255.0).clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_ignores_non_finite_samples() {
        assert_eq!(value_range(&[3.0, f32::NAN, -1000.0, 40.0]), Some((-1000.0, 40.0)));
        assert_eq!(value_range(&[]), None);
    }

    #[test]
    fn stretch_maps_range_to_full_scale() {
        assert_eq!(stretch(-1000.0, -1000.0, 1000.0), 0);
        assert_eq!(stretch(1000.0, -1000.0, 1000.0), 255);
        assert_eq!(stretch(0.0, -1000.0, 1000.0), 128);
        assert_eq!(stretch(5.0, 5.0, 5.0), 0);
    }
}
