//! Crop-box geometry in source pixel space.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner of the original, unrotated source
//! - Units are source pixels, independent of the on-screen zoom
//! - Rotation is carried alongside the box and does not change its bounds
//!
//! During interaction a box may temporarily extend past the source edges or
//! have a negative origin; [`CropRequest::from_box`] clamps it to the source
//! rectangle before anything is sent to the backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::SourceDimensions;

/// Geometry errors raised when building a crop request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The box does not overlap the source image at all.
    #[error("Crop region {width}x{height} at ({x}, {y}) lies outside the {source_width}x{source_height} image")]
    OutsideSource {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        source_width: u32,
        source_height: u32,
    },

    /// The box has no area.
    #[error("Crop region must have a positive width and height")]
    EmptyRegion,
}

/// Interactive crop rectangle, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CropBox {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box covering `fraction` of each source dimension, centered.
    ///
    /// Each side is at least one pixel and at most the full source side.
    pub fn centered(source: SourceDimensions, fraction: f64) -> Self {
        let side = |full: u32| {
            let full = full as i64;
            let len = ((full as f64) * fraction.clamp(0.0, 1.0)).round() as i64;
            let len = len.clamp(1, full);
            ((full - len) / 2, len)
        };
        let (x, width) = side(source.width);
        let (y, height) = side(source.height);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Move by a delta, keeping the box inside the source when it fits.
    ///
    /// A box larger than the source on an axis is pinned to the origin on
    /// that axis.
    pub fn translate_within(&self, dx: i64, dy: i64, source: SourceDimensions) -> Self {
        let pin = |pos: i64, delta: i64, len: i64, full: u32| {
            let max = (full as i64 - len).max(0);
            pos.saturating_add(delta).clamp(0, max)
        };
        Self {
            x: pin(self.x, dx, self.width, source.width),
            y: pin(self.y, dy, self.height, source.height),
            width: self.width,
            height: self.height,
        }
    }

    /// Whether the box satisfies the request invariant for `source`.
    pub fn fits_within(&self, source: SourceDimensions) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.x.saturating_add(self.width) <= source.width as i64
            && self.y.saturating_add(self.height) <= source.height as i64
    }

    /// Intersection of the box with the source rectangle.
    pub fn clamp_to(&self, source: SourceDimensions) -> Result<CropBox, GeometryError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(GeometryError::EmptyRegion);
        }

        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.x.saturating_add(self.width).min(source.width as i64);
        let bottom = self.y.saturating_add(self.height).min(source.height as i64);

        if right <= left || bottom <= top {
            return Err(GeometryError::OutsideSource {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                source_width: source.width,
                source_height: source.height,
            });
        }

        Ok(CropBox {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }
}

/// A committed crop, in original source pixel space.
///
/// Built only through [`CropRequest::from_box`], which guarantees
/// `x + width <= source width` and `y + height <= source height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRequest {
    /// Backend identifier of the source file.
    pub file_id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Rotation in degrees, normalized to `[0, 360)`.
    pub rotation_degrees: i32,
}

impl CropRequest {
    /// Clamp `crop_box` to the source and build a request from it.
    pub fn from_box(
        file_id: impl Into<String>,
        crop_box: CropBox,
        rotation_degrees: i32,
        source: SourceDimensions,
    ) -> Result<Self, GeometryError> {
        let clamped = crop_box.clamp_to(source)?;
        // clamp_to bounds every value by the u32 source dimensions
        Ok(Self {
            file_id: file_id.into(),
            x: clamped.x as u32,
            y: clamped.y as u32,
            width: clamped.width as u32,
            height: clamped.height as u32,
            rotation_degrees: normalize_degrees(rotation_degrees),
        })
    }

    /// Whether the request lies inside `source`.
    pub fn is_within(&self, source: SourceDimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= source.width as u64
            && self.y as u64 + self.height as u64 <= source.height as u64
    }
}

/// Normalize an angle to `[0, 360)`.
pub fn normalize_degrees(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// Dimensions of the bounding box of a rotated `width` x `height` rectangle.
///
/// Quarter turns are exact; other angles round to the nearest pixel.
pub fn rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let angle_normalized = angle_degrees.rem_euclid(360.0);

    if angle_normalized < 0.001 || (360.0 - angle_normalized) < 0.001 {
        return (width, height);
    }
    if (angle_normalized - 90.0).abs() < 0.001 || (angle_normalized - 270.0).abs() < 0.001 {
        return (height, width);
    }
    if (angle_normalized - 180.0).abs() < 0.001 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // new_w = |w*cos| + |h*sin|, new_h = |w*sin| + |h*cos|
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Zoom that fits the rotated source into a viewport, bounded to `[min, max]`.
pub fn fit_zoom(
    source: SourceDimensions,
    rotation_degrees: i32,
    viewport_width: f64,
    viewport_height: f64,
    min: f64,
    max: f64,
) -> f64 {
    let (w, h) = rotated_bounds(source.width, source.height, rotation_degrees as f64);
    let zoom = (viewport_width / w as f64).min(viewport_height / h as f64);
    if zoom.is_finite() && zoom > 0.0 {
        zoom.clamp(min, max)
    } else {
        min
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dims_strategy() -> impl Strategy<Value = SourceDimensions> {
        (1u32..=8000, 1u32..=8000).prop_map(|(w, h)| SourceDimensions::new(w, h).unwrap())
    }

    fn box_strategy() -> impl Strategy<Value = CropBox> {
        (
            -10_000i64..=10_000,
            -10_000i64..=10_000,
            -100i64..=12_000,
            -100i64..=12_000,
        )
            .prop_map(|(x, y, w, h)| CropBox::new(x, y, w, h))
    }

    proptest! {
        /// Property: every request built from any box satisfies the bounds invariant.
        #[test]
        fn prop_request_always_within_source(
            source in dims_strategy(),
            crop_box in box_strategy(),
            rotation in -1000i32..1000,
        ) {
            if let Ok(req) = CropRequest::from_box("f", crop_box, rotation, source) {
                prop_assert!(req.is_within(source));
                prop_assert!((0..360).contains(&req.rotation_degrees));
            }
        }

        /// Property: a box already inside the source is not altered by clamping.
        #[test]
        fn prop_clamp_is_identity_inside(
            source in dims_strategy(),
            fx in 0.0f64..1.0, fy in 0.0f64..1.0,
            fw in 0.0f64..1.0, fh in 0.0f64..1.0,
        ) {
            let x = (fx * source.width as f64) as i64;
            let y = (fy * source.height as f64) as i64;
            let w = ((fw * (source.width as i64 - x) as f64) as i64).max(1);
            let h = ((fh * (source.height as i64 - y) as f64) as i64).max(1);
            let b = CropBox::new(x, y, w, h);
            prop_assume!(b.fits_within(source));

            prop_assert_eq!(b.clamp_to(source).unwrap(), b);
        }

        /// Property: the default box fits the source.
        #[test]
        fn prop_centered_fits(source in dims_strategy(), fraction in 0.01f64..=1.0) {
            prop_assert!(CropBox::centered(source, fraction).fits_within(source));
        }

        /// Property: translating a fitting box keeps it fitting.
        #[test]
        fn prop_translate_keeps_fit(
            source in dims_strategy(),
            fraction in 0.01f64..=1.0,
            dx in -20_000i64..20_000,
            dy in -20_000i64..20_000,
        ) {
            let b = CropBox::centered(source, fraction);
            prop_assert!(b.translate_within(dx, dy, source).fits_within(source));
        }
    }
}
