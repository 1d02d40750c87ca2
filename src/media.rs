//! # Media Classifier Module
//!
//! Decides whether an inbound message carries an image we can forward to the
//! inference gateway, and sanity-checks the downloaded bytes before they go out.

use image::ImageFormat;
use log::info;

use crate::errors::TransportError;
use crate::transport::{InboundMessage, MediaKind};

/// File extensions accepted for image documents sent without an image mime type
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

// Magic bytes needed before format detection is meaningful
const MIN_FORMAT_BYTES: usize = 8;

/// Whether the message carries an acceptable image payload
///
/// Native images always qualify. Documents qualify when their mime type is
/// `image/*` or their filename has a known image extension (case-insensitive).
/// Missing mime type or filename simply does not match.
pub fn is_acceptable_image(msg: &InboundMessage) -> bool {
    match msg.media_kind {
        MediaKind::Image => true,
        MediaKind::Document => {
            let mime_matches = msg
                .mime_type
                .as_deref()
                .map(|mime| mime.trim().to_lowercase().starts_with("image/"))
                .unwrap_or(false);

            let name_matches = msg
                .filename
                .as_deref()
                .map(|name| {
                    let lowered = name.trim().to_lowercase();
                    IMAGE_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
                })
                .unwrap_or(false);

            mime_matches || name_matches
        }
        MediaKind::Other | MediaKind::None => false,
    }
}

/// Validate downloaded bytes by sniffing their format with `image::guess_format`
pub fn validate_image_payload(bytes: &[u8], max_bytes: usize) -> Result<ImageFormat, TransportError> {
    if bytes.len() < MIN_FORMAT_BYTES {
        return Err(TransportError::UnsupportedMedia(format!(
            "payload too small ({} bytes)",
            bytes.len()
        )));
    }

    if bytes.len() > max_bytes {
        return Err(TransportError::UnsupportedMedia(format!(
            "payload of {} bytes exceeds limit of {max_bytes}",
            bytes.len()
        )));
    }

    let format = image::guess_format(bytes)
        .map_err(|e| TransportError::UnsupportedMedia(format!("unknown image format: {e}")))?;

    let supported = matches!(
        format,
        ImageFormat::Png
            | ImageFormat::Jpeg
            | ImageFormat::WebP
            | ImageFormat::Bmp
            | ImageFormat::Gif
            | ImageFormat::Tiff
    );

    if supported {
        info!("Detected supported image format: {format:?} ({} bytes)", bytes.len());
        Ok(format)
    } else {
        Err(TransportError::UnsupportedMedia(format!(
            "unsupported image format {format:?}"
        )))
    }
}
