//! Image intake: `data:image/<fmt>;base64,<payload>` strings in, opaque
//! `/api/images/<uuid>` references out.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use diesel::prelude::*;
use foodgram_core::StoreResult;
use image::{ImageFormat, ImageReader};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{ImageRow, NewImage};
use crate::schema::images;
use crate::store::PgStore;

pub const ALLOWED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

pub const IMAGE_URL_PREFIX: &str = "/api/images/";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image must be a data URL: data:image/<format>;base64,<payload>")]
    NotDataUrl,

    #[error("Image payload must be base64 encoded")]
    NotBase64,

    #[error("Image payload is not valid base64")]
    InvalidBase64,

    #[error("Image too large. Maximum size is {max} bytes")]
    TooLarge { max: usize },

    #[error("{0}")]
    Unsupported(String),
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn decode_data_url(input: &str, max_bytes: usize) -> Result<DecodedImage, ImageError> {
    let rest = input
        .trim()
        .strip_prefix("data:")
        .ok_or(ImageError::NotDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(ImageError::NotDataUrl)?;
    let mime = meta.strip_suffix(";base64").ok_or(ImageError::NotBase64)?;
    if !mime.starts_with("image/") {
        return Err(ImageError::NotDataUrl);
    }

    // Reject oversized payloads before allocating for them.
    if payload.len() / 4 * 3 > max_bytes + 3 {
        return Err(ImageError::TooLarge { max: max_bytes });
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| ImageError::InvalidBase64)?;
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge { max: max_bytes });
    }

    let reader = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Unsupported(format!("Failed to read image: {e}")))?;
    let format = reader
        .format()
        .ok_or_else(|| ImageError::Unsupported("Could not detect image format".to_string()))?;
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::Unsupported(format!(
            "Unsupported image format: {format:?}. Allowed: JPEG, PNG, GIF, WebP"
        )));
    }
    reader
        .into_dimensions()
        .map_err(|e| ImageError::Unsupported(format!("Failed to decode image: {e}")))?;

    Ok(DecodedImage {
        content_type: format.to_mime_type(),
        bytes,
    })
}

pub fn image_ref(id: Uuid) -> String {
    format!("{IMAGE_URL_PREFIX}{id}")
}

pub fn image_id(reference: &str) -> Option<Uuid> {
    reference.strip_prefix(IMAGE_URL_PREFIX)?.parse().ok()
}

pub fn save_image(store: &PgStore, image: &DecodedImage) -> StoreResult<Uuid> {
    store.run("save_image", |conn| {
        diesel::insert_into(images::table)
            .values(&NewImage {
                content_type: image.content_type,
                data: &image.bytes,
            })
            .returning(images::id)
            .get_result(conn)
    })
}

pub fn load_image(store: &PgStore, id: Uuid) -> StoreResult<Option<ImageRow>> {
    store.run("load_image", |conn| {
        images::table
            .find(id)
            .select(ImageRow::as_select())
            .first(conn)
            .optional()
    })
}

/// Decode, validate and store an image, returning its reference.
pub fn intake(store: &PgStore, data_url: &str, max_bytes: usize) -> Result<String, ApiError> {
    let decoded = decode_data_url(data_url, max_bytes)?;
    let id = save_image(store, &decoded)?;
    tracing::debug!(image_id = %id, content_type = decoded.content_type, bytes = decoded.bytes.len(), "stored image");
    Ok(image_ref(id))
}

/// Drop the image behind `reference` once nothing points at it any more.
/// Failures are logged, not returned: the owning write already succeeded.
pub fn release(store: &PgStore, reference: &str) {
    let Some(id) = image_id(reference) else {
        return;
    };
    if let Err(e) = store.run("release_image", |conn| {
        diesel::delete(images::table.find(id)).execute(conn)
    }) {
        tracing::warn!(image_id = %id, error = %e, "failed to delete image");
    }
}
