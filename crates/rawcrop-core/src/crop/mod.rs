//! Crop session: interactive crop-box state and request derivation.
//!
//! # Coordinate System
//!
//! - All geometry is in pixels of the original, unrotated source
//! - Zoom only converts screen deltas to source deltas
//! - Rotation is in whole degrees, normalized to `[0, 360)`
//!
//! The session never calls the backend. Committing is the workflow
//! controller's job; it asks the session for a clamped [`CropRequest`].

mod geometry;
mod keyboard;
mod session;

pub use geometry::{
    fit_zoom, normalize_degrees, rotated_bounds, CropBox, CropRequest, GeometryError,
};
pub use keyboard::{command_for, Key, KeyCommand, KeyPress};
pub use session::CropSession;
