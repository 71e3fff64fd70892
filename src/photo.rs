//! Photo records as they come from the source, and size selection.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// One resolution a photo is offered in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoVariant {
    pub width: u32,
    pub height: u32,
    pub url: String,
    /// VK size letter ("s", "m", "x", "z", "w", ...)
    pub size_tag: String,
}

impl PhotoVariant {
    pub fn new(width: u32, height: u32, url: &str, size_tag: &str) -> Self {
        Self {
            width,
            height,
            url: url.to_string(),
            size_tag: size_tag.to_string(),
        }
    }

    /// Pixel area, computed wide enough that it cannot overflow
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// A profile photo as seen at export time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub like_count: u64,
    pub variants: Vec<PhotoVariant>,
}

impl Photo {
    pub fn new(like_count: u64, variants: Vec<PhotoVariant>) -> Self {
        Self {
            like_count,
            variants,
        }
    }
}

/// A file that should exist in the destination folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub file_name: String,
    pub source_url: String,
    pub size_tag: String,
}

/// Picks the variant with the largest pixel area.
///
/// Ties go to the variant that comes first. `position` is only used to
/// identify the photo when there is nothing to choose from.
pub fn select_best(
    variants: &[PhotoVariant],
    position: usize,
) -> Result<&PhotoVariant, ExportError> {
    let mut best: Option<&PhotoVariant> = None;
    for variant in variants {
        match best {
            Some(current) if variant.area() <= current.area() => {}
            _ => best = Some(variant),
        }
    }
    let best = best.ok_or(ExportError::InvalidInput { position })?;
    if best.area() == 0 && variants.len() > 1 {
        debug!(
            "Photo #{position} reports no dimensions for any size; using {} as listed first",
            best.size_tag
        );
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_best_picks_largest_area() {
        let variants = vec![
            PhotoVariant::new(10, 20, "a", "m"),
            PhotoVariant::new(30, 10, "b", "x"),
        ];

        let best = select_best(&variants, 0).unwrap();
        assert_eq!(best.url, "b");
        assert_eq!(best.size_tag, "x");
    }

    #[test]
    fn test_select_best_tie_keeps_first() {
        let variants = vec![
            PhotoVariant::new(10, 10, "small", "s"),
            PhotoVariant::new(20, 50, "wide", "x"),
            PhotoVariant::new(50, 20, "tall", "y"),
            PhotoVariant::new(25, 40, "square-ish", "z"),
        ];

        let best = select_best(&variants, 0).unwrap();
        assert_eq!(best.url, "wide");
    }

    #[test]
    fn test_select_best_without_dimensions_keeps_first() {
        let variants = vec![
            PhotoVariant::new(0, 0, "small", "s"),
            PhotoVariant::new(0, 0, "large", "w"),
        ];

        let best = select_best(&variants, 3).unwrap();

        assert_eq!(best.url, "small");
        assert_eq!(best.area(), 0);
    }

    #[test]
    fn test_select_best_single_variant() {
        let variants = vec![PhotoVariant::new(604, 403, "only", "x")];
        assert_eq!(select_best(&variants, 0).unwrap().url, "only");
    }

    #[test]
    fn test_select_best_empty_is_invalid_input() {
        let err = select_best(&[], 7).unwrap_err();
        assert_eq!(err, ExportError::InvalidInput { position: 7 });
    }

    #[test]
    fn test_area_does_not_overflow() {
        let variant = PhotoVariant::new(u32::MAX, u32::MAX, "huge", "w");
        assert_eq!(variant.area(), u64::from(u32::MAX) * u64::from(u32::MAX));
    }
}
