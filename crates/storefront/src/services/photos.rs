//! Image uploads: product photos and profile avatars.
//!
//! The backend stores images as base64 text. Product photos are sent bare;
//! avatars are sent as data URIs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use o2_shop_core::ProductId;
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{ApiError, BackendCredentials, ShopClient};

/// Largest accepted upload, per file.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Errors from photo uploads.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Please select at least one photo.")]
    NoPhotos,

    #[error("{name} is larger than 5 MB")]
    TooLarge { name: String },

    #[error("{name} is not an image")]
    NotAnImage { name: String },

    /// A backend call failed after `uploaded` photos were stored.
    #[error("Upload failed after {uploaded} photo(s): {source}")]
    Api {
        uploaded: usize,
        #[source]
        source: ApiError,
    },
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Photo {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Photo {
    /// Check type and size.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoError::NotAnImage`] or [`PhotoError::TooLarge`].
    pub fn validate(&self) -> Result<(), PhotoError> {
        if !self.content_type.starts_with("image/") {
            return Err(PhotoError::NotAnImage {
                name: self.name.clone(),
            });
        }
        if self.bytes.len() > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Bare base64 payload.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:<type>;base64,<payload>`.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.to_base64())
    }
}

/// Upload photos for a product one after another.
///
/// Stops at the first failure; photos before it stay uploaded.
///
/// # Errors
///
/// Returns [`PhotoError::NoPhotos`] for an empty selection, a validation
/// error before anything is sent, or the first backend failure.
#[instrument(skip(client, credentials, photos), fields(product_id = %product_id, count = photos.len()))]
pub async fn upload_product_photos(
    client: &ShopClient,
    credentials: &BackendCredentials,
    product_id: ProductId,
    photos: &[Photo],
) -> Result<usize, PhotoError> {
    if photos.is_empty() {
        return Err(PhotoError::NoPhotos);
    }
    for photo in photos {
        photo.validate()?;
    }

    for (uploaded, photo) in photos.iter().enumerate() {
        client
            .add_product_photo(credentials, product_id, photo.to_base64())
            .await
            .map_err(|source| PhotoError::Api { uploaded, source })?;
    }

    info!("Photos uploaded");
    Ok(photos.len())
}
