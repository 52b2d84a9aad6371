//! Conversion of raw feed/API items into draft articles.
//!
//! Everything in here is pure: no network, no storage.

pub mod date;
pub mod entry;
pub mod image;

pub use date::{parse_date, try_parse_date, DateFormat};
pub use entry::{normalize, SourceContext, DEFAULT_CATEGORY};
pub use image::{extract_image, first_img_src, sanitize_image, PLACEHOLDER_IMAGE_URL};
