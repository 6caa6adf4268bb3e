use std::io::Cursor;

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::{ImageFormat, ScreenshotConfig};
use crate::errors::PilotResult;
use crate::perception::types::{EncodedFrame, ScreenFrame};

/// Encode a captured frame for the model: optional downscale, PNG or JPEG,
/// then standard base64.
///
/// The model answers in screen fractions, so downscaling does not move click targets.
pub fn encode_frame(frame: &ScreenFrame, cfg: &ScreenshotConfig) -> PilotResult<EncodedFrame> {
    let mut img = DynamicImage::ImageRgba8(frame.image.clone());

    if let Some(max_width) = cfg.max_width {
        if max_width > 0 && img.width() > max_width {
            let ratio = max_width as f64 / img.width() as f64;
            let new_height = ((img.height() as f64 * ratio).round() as u32).max(1);
            img = img.resize_exact(max_width, new_height, FilterType::Triangle);
        }
    }

    let mut out = Vec::new();
    let mime = match cfg.format {
        ImageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
            "image/png"
        }
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut out, cfg.quality).encode_image(&rgb)?;
            "image/jpeg"
        }
    };

    tracing::debug!(
        width = img.width(),
        height = img.height(),
        bytes = out.len(),
        mime,
        "screenshot encoded"
    );

    Ok(EncodedFrame {
        mime,
        base64: base64::engine::general_purpose::STANDARD.encode(&out),
        width: img.width(),
        height: img.height(),
    })
}
