//! Uploaded image handling.
//!
//! Decoding and re-encoding pixels is left to an [`ImageResizer`]
//! implementation; the geometry and naming rules live here.

use std::path::Path;

use chrono::NaiveDate;
use deunicode::deunicode;
use tracing::debug;

use crate::error::{Result, TimeWindowError};

/// Capability that re-encodes an image so its longer side is `max_dimension` pixels.
pub trait ImageResizer {
    fn resize(&self, image: &[u8], max_dimension: u32, quality: u8) -> Result<Vec<u8>>;
}

/// JPEG-style quality used when the caller has no preference.
pub const DEFAULT_QUALITY: u8 = 85;

/// Dimensions after scaling the longer side of `width` x `height` to `max_dimension`.
///
/// Landscape images get width `max_dimension`; square and portrait images get
/// height `max_dimension`. The other side keeps the aspect ratio, truncated.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width > height {
        let ratio = f64::from(max_dimension) / f64::from(width);
        (max_dimension, (f64::from(height) * ratio) as u32)
    } else if height == 0 {
        (0, 0)
    } else {
        let ratio = f64::from(max_dimension) / f64::from(height);
        ((f64::from(width) * ratio) as u32, max_dimension)
    }
}

/// Resize `image` through `resizer` after validating the request.
pub fn resize_image<R: ImageResizer + ?Sized>(
    resizer: &R,
    image: &[u8],
    max_dimension: u32,
    quality: u8,
) -> Result<Vec<u8>> {
    if max_dimension == 0 {
        return Err(TimeWindowError::Image(
            "maximum dimension must be positive".to_string(),
        ));
    }
    if image.is_empty() {
        return Err(TimeWindowError::Image("empty image".to_string()));
    }
    let resized = resizer.resize(image, max_dimension, quality)?;
    debug!(
        before = image.len(),
        after = resized.len(),
        max_dimension,
        "resized image"
    );
    Ok(resized)
}

/// Django-style slug: transliterated to ASCII, then alphanumerics, `_` and
/// `-`, lowercased, with whitespace and hyphen runs collapsed to a single `-`.
pub fn slugify(value: &str) -> String {
    let ascii = deunicode(value);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        }
    }
    slug.trim_matches('_').to_string()
}

/// Storage path for an uploaded task image:
/// `task_images/{YYYY}/{tool}/{YYYY-MM-DD}_{tool}_{NN}{ext}`, where `NN` is
/// one more than the number of images already uploaded for the tool that day.
pub fn task_image_filename(
    tool_name: &str,
    uploaded_on: NaiveDate,
    existing_same_day: usize,
    original_filename: &str,
) -> String {
    let tool = slugify(tool_name);
    let extension = Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!(
        "task_images/{year}/{tool}/{date}_{tool}_{number:02}{extension}",
        year = uploaded_on.format("%Y"),
        date = uploaded_on.format("%Y-%m-%d"),
        number = existing_same_day + 1,
    )
}
