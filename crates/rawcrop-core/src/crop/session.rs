//! Interactive crop session.
//!
//! A session exists only while the user is editing one file. It owns the
//! transient geometry (box, rotation, zoom) and never talks to the backend;
//! the workflow controller turns it into a [`CropRequest`] on commit.

use crate::config::ClientConfig;
use crate::crop::geometry::{fit_zoom, normalize_degrees, CropBox, CropRequest, GeometryError};
use crate::record::SourceDimensions;

/// Crop-box state for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSession {
    file_id: String,
    source: SourceDimensions,
    default_box: CropBox,
    crop_box: CropBox,
    rotation: i32,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl CropSession {
    /// Start a session with the default centered box and no rotation.
    pub fn begin(file_id: impl Into<String>, source: SourceDimensions, config: &ClientConfig) -> Self {
        let default_box = CropBox::centered(source, config.default_crop_fraction);
        Self {
            file_id: file_id.into(),
            source,
            default_box,
            crop_box: default_box,
            rotation: 0,
            zoom: 1.0_f64.clamp(config.min_zoom, config.max_zoom),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    /// Backend identifier of the file being cropped.
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Pixel size of the unrotated source; crop requests stay inside it.
    pub fn source(&self) -> SourceDimensions {
        self.source
    }

    /// Current geometry in source pixels, unclamped.
    pub fn crop_box(&self) -> CropBox {
        self.crop_box
    }

    /// The centered box the session started with; [`reset`](Self::reset) returns to it.
    pub fn default_box(&self) -> CropBox {
        self.default_box
    }

    /// Current rotation in degrees, in `[0, 360)`.
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Display zoom factor, within the configured bounds.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Store new geometry from a pointer or keyboard adjustment.
    ///
    /// The box is kept as given; clamping happens when the request is built.
    pub fn update_box(&mut self, crop_box: CropBox) {
        self.crop_box = crop_box;
    }

    /// Move the box by whole source pixels without leaving the source.
    pub fn nudge(&mut self, dx: i64, dy: i64) {
        self.crop_box = self.crop_box.translate_within(dx, dy, self.source);
    }

    /// Move the box by a pointer delta in screen pixels.
    pub fn move_by_screen(&mut self, dx: f64, dy: f64) {
        let to_source = |d: f64| (d / self.zoom).round() as i64;
        self.nudge(to_source(dx), to_source(dy));
    }

    /// Apply a relative rotation.
    pub fn rotate(&mut self, delta_degrees: i32) {
        self.rotation = normalize_degrees(self.rotation.wrapping_add(delta_degrees % 360));
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Multiply the zoom by `factor` (e.g. the configured zoom step or its inverse).
    pub fn zoom_by(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.set_zoom(self.zoom * factor);
        }
    }

    /// Zoom so the rotated source fits the viewport.
    pub fn fit_to_viewport(&mut self, viewport_width: f64, viewport_height: f64) {
        self.zoom = fit_zoom(
            self.source,
            self.rotation,
            viewport_width,
            viewport_height,
            self.min_zoom,
            self.max_zoom,
        );
    }

    /// Restore the default box and zero rotation. Zoom is a view setting and is kept.
    pub fn reset(&mut self) {
        self.crop_box = self.default_box;
        self.rotation = 0;
    }

    /// Build the request for the current geometry, clamped to the source.
    pub fn to_request(&self) -> Result<CropRequest, GeometryError> {
        CropRequest::from_box(self.file_id.clone(), self.crop_box, self.rotation, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CropSession {
        CropSession::begin(
            "abc_photo.nef",
            SourceDimensions::new(6000, 4000).unwrap(),
            &ClientConfig::default(),
        )
    }

    #[test]
    fn test_begin_defaults() {
        let s = session();
        assert_eq!(s.crop_box(), CropBox::new(600, 400, 4800, 3200));
        assert_eq!(s.rotation(), 0);
        assert_eq!(s.zoom(), 1.0);
        assert_eq!(s.file_id(), "abc_photo.nef");
    }

    #[test]
    fn test_update_box_keeps_raw_geometry() {
        let mut s = session();
        s.update_box(CropBox::new(-50, 10, 200, 150));
        assert_eq!(s.crop_box(), CropBox::new(-50, 10, 200, 150));

        let req = s.to_request().unwrap();
        assert_eq!((req.x, req.y, req.width, req.height), (0, 10, 150, 150));
    }

    #[test]
    fn test_rotate_accumulates_and_wraps() {
        let mut s = session();
        s.rotate(90);
        s.rotate(90);
        assert_eq!(s.rotation(), 180);
        s.rotate(-270);
        assert_eq!(s.rotation(), 270);
        s.rotate(i32::MAX);
        assert!((0..360).contains(&s.rotation()));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut s = session();
        s.update_box(CropBox::new(1, 2, 3, 4));
        s.rotate(45);
        s.set_zoom(2.0);
        s.reset();

        assert_eq!(s.crop_box(), s.default_box());
        assert_eq!(s.rotation(), 0);
        assert_eq!(s.zoom(), 2.0);
    }

    #[test]
    fn test_move_by_screen_scales_with_zoom() {
        let mut s = session();
        s.set_zoom(0.5);
        let before = s.crop_box();
        s.move_by_screen(10.0, -20.0);
        assert_eq!(s.crop_box().x, before.x + 20);
        assert_eq!(s.crop_box().y, before.y - 40);
    }

    #[test]
    fn test_zoom_is_bounded() {
        let mut s = session();
        s.set_zoom(100.0);
        assert_eq!(s.zoom(), 8.0);
        s.zoom_by(0.0);
        assert_eq!(s.zoom(), 8.0);
        s.set_zoom(f64::NAN);
        assert_eq!(s.zoom(), 8.0);
        s.set_zoom(0.0001);
        assert_eq!(s.zoom(), 0.05);
    }

    #[test]
    fn test_fit_to_viewport() {
        let mut s = session();
        s.fit_to_viewport(600.0, 600.0);
        assert!((s.zoom() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_to_request_carries_rotation() {
        let mut s = session();
        s.update_box(CropBox::new(10, 10, 200, 150));
        s.rotate(-90);
        let req = s.to_request().unwrap();
        assert_eq!(req.rotation_degrees, 270);
        assert_eq!(req.file_id, "abc_photo.nef");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
