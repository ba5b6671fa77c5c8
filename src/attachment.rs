//! Staged image attachments for chat and analysis.
//!
//! Shells hand over raw bytes picked by the user; the core sniffs the
//! format, enforces the size cap, and produces the base64 payload the
//! backend expects. Validation is magic-byte only, the image is never
//! decoded on this side.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind, MAX_IMAGE_BYTES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("image is {actual} bytes, limit is {limit}")]
    TooLarge { actual: usize, limit: usize },
    #[error("unrecognized image data")]
    NotAnImage,
    #[error("unsupported image format {0:?}")]
    UnsupportedFormat(ImageFormat),
    #[error("empty file")]
    Empty,
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        let kind = match err {
            AttachmentError::TooLarge { .. } => ErrorKind::ImageTooLarge,
            AttachmentError::NotAnImage
            | AttachmentError::UnsupportedFormat(_)
            | AttachmentError::Empty => ErrorKind::ImageFormatUnsupported,
        };
        AppError::new(kind, err.to_string())
    }
}

/// An image the user attached but has not sent yet. Held in the model until
/// the send that consumes it, then cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedImage {
    pub file_name: String,
    pub mime_type: String,
    data: Vec<u8>,
}

impl StagedImage {
    /// Accepts PNG, JPEG and WebP payloads under the size cap. The declared
    /// mime type from the shell is ignored in favor of the sniffed one.
    pub fn from_file(file_name: impl Into<String>, data: Vec<u8>) -> Result<Self, AttachmentError> {
        if data.is_empty() {
            return Err(AttachmentError::Empty);
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(AttachmentError::TooLarge {
                actual: data.len(),
                limit: MAX_IMAGE_BYTES,
            });
        }

        let format = image::guess_format(&data).map_err(|_| AttachmentError::NotAnImage)?;
        match format {
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP => Ok(Self {
                file_name: file_name.into(),
                mime_type: format.to_mime_type().to_owned(),
                data,
            }),
            other => Err(AttachmentError::UnsupportedFormat(other)),
        }
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Raw base64 of the image bytes, standard alphabet, no data-URL prefix.
    #[must_use]
    pub fn payload_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// Transcript line appended after the text content when a message
    /// carried an attachment.
    #[must_use]
    pub fn display_suffix(&self) -> String {
        format!("\n[Uploaded Image: {}]", self.file_name)
    }
}

/// Some shells deliver picked files as `data:<mime>;base64,<payload>` URLs.
/// The backend wants only the payload part.
#[must_use]
pub fn strip_data_url_prefix(input: &str) -> &str {
    if input.starts_with("data:") {
        if let Some((_, payload)) = input.split_once(',') {
            return payload;
        }
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn png_bytes(len: usize) -> Vec<u8> {
        let mut data = PNG_MAGIC.to_vec();
        data.resize(len.max(PNG_MAGIC.len()), 0);
        data
    }

    #[test]
    fn test_accepts_png() {
        let staged = StagedImage::from_file("shot.png", png_bytes(64)).unwrap();
        assert_eq!(staged.mime_type, "image/png");
        assert_eq!(staged.size_bytes(), 64);
    }

    #[test]
    fn test_accepts_jpeg() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.extend_from_slice(b"JFIF-ish padding");
        let staged = StagedImage::from_file("photo.jpg", data).unwrap();
        assert_eq!(staged.mime_type, "image/jpeg");
    }

    #[test]
    fn test_rejects_non_image_bytes() {
        let err = StagedImage::from_file("doc.pdf", b"%PDF-1.7 ...".to_vec()).unwrap_err();
        assert_matches!(err, AttachmentError::NotAnImage);
    }

    #[test]
    fn test_rejects_empty_file() {
        assert_matches!(
            StagedImage::from_file("x.png", vec![]),
            Err(AttachmentError::Empty)
        );
    }

    #[test]
    fn test_rejects_oversized_file() {
        let err = StagedImage::from_file("big.png", png_bytes(MAX_IMAGE_BYTES + 1)).unwrap_err();
        assert_matches!(err, AttachmentError::TooLarge { .. });
    }

    #[test]
    fn test_error_maps_into_taxonomy() {
        let err: AppError = AttachmentError::NotAnImage.into();
        assert_eq!(err.kind, ErrorKind::ImageFormatUnsupported);

        let err: AppError = AttachmentError::TooLarge { actual: 1, limit: 0 }.into();
        assert_eq!(err.kind, ErrorKind::ImageTooLarge);
    }

    #[test]
    fn test_display_suffix_format() {
        let staged = StagedImage::from_file("evidence.png", png_bytes(16)).unwrap();
        assert_eq!(staged.display_suffix(), "\n[Uploaded Image: evidence.png]");
    }

    #[test]
    fn test_strip_data_url_prefix() {
        assert_eq!(
            strip_data_url_prefix("data:image/png;base64,iVBORw0KGgo="),
            "iVBORw0KGgo="
        );
        assert_eq!(strip_data_url_prefix("iVBORw0KGgo="), "iVBORw0KGgo=");
        assert_eq!(strip_data_url_prefix("data:broken-no-comma"), "data:broken-no-comma");
    }

    proptest! {
        #[test]
        fn prop_payload_base64_round_trips(tail in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut data = PNG_MAGIC.to_vec();
            data.extend(tail);
            let staged = StagedImage::from_file("f.png", data.clone()).unwrap();
            let decoded = BASE64.decode(staged.payload_base64()).unwrap();
            prop_assert_eq!(decoded, data);
        }

        #[test]
        fn prop_strip_prefix_recovers_payload(payload in "[A-Za-z0-9+/=]{0,128}") {
            let url = format!("data:image/png;base64,{payload}");
            prop_assert_eq!(strip_data_url_prefix(&url), payload.as_str());
        }
    }
}
