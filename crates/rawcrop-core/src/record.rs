//! Data model: uploaded file records and crop results.

use serde::{Deserialize, Serialize};

use crate::probe::CameraInfo;

/// Pixel dimensions of an original, unrotated RAW source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDimensions {
    pub width: u32,
    pub height: u32,
}

impl SourceDimensions {
    /// Create dimensions, returning `None` if either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }
}

/// Where a record's source dimensions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DimensionSource {
    /// Pixel dimension tags of the uploaded file. Some containers describe
    /// an embedded preview there, so the view may correct them.
    Metadata,
    /// Measured by the view.
    View,
}

/// What the backend returns for a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Identifier the backend uses to locate the stored RAW source.
    pub remote_id: String,
    /// Rendered preview of the source.
    pub preview_uri: String,
    /// Download location of the original RAW, if the backend exposes one.
    pub raw_download_uri: Option<String>,
}

/// Result of a successful crop request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropResult {
    pub preview_uri: String,
    pub raw_download_uri: String,
}

/// An uploaded file as seen by the client.
///
/// Only `preview_uri` and `raw_download_uri` change after creation (a crop
/// replaces them). `dimensions` may be corrected once by the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Original file name as selected by the user.
    pub name: String,
    /// Opaque backend identifier.
    pub remote_id: String,
    pub preview_uri: String,
    /// Most recent downloadable RAW: cropped if a crop succeeded, else the original.
    pub raw_download_uri: Option<String>,
    /// Original source dimensions, when known.
    pub dimensions: Option<SourceDimensions>,
    /// Set exactly when `dimensions` is.
    pub dimension_source: Option<DimensionSource>,
    /// Camera make/model read from the source, display only.
    pub camera: Option<CameraInfo>,
}

impl FileRecord {
    /// Build a record from a successful upload.
    pub fn from_receipt(name: impl Into<String>, receipt: UploadReceipt) -> Self {
        Self {
            name: name.into(),
            remote_id: receipt.remote_id,
            preview_uri: receipt.preview_uri,
            raw_download_uri: receipt.raw_download_uri,
            dimensions: None,
            dimension_source: None,
            camera: None,
        }
    }

    /// Attach dimensions read from the file's metadata.
    pub fn with_dimensions(mut self, dimensions: Option<SourceDimensions>) -> Self {
        self.dimension_source = dimensions.map(|_| DimensionSource::Metadata);
        self.dimensions = dimensions;
        self
    }

    pub fn with_camera(mut self, camera: Option<CameraInfo>) -> Self {
        self.camera = camera;
        self
    }

    /// Upper-case extension of the file name, or an empty string if none.
    pub fn extension(&self) -> String {
        file_extension(&self.name)
            .map(|e| e.to_ascii_uppercase())
            .unwrap_or_default()
    }
}

/// The text after the last `.` of a file name, if any.
pub fn file_extension(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt() -> UploadReceipt {
        UploadReceipt {
            remote_id: "0b1e_photo.dng".into(),
            preview_uri: "http://127.0.0.1:8000/processed/0b1e_photo.dng.jpg".into(),
            raw_download_uri: None,
        }
    }

    #[test]
    fn test_from_receipt() {
        let record = FileRecord::from_receipt("photo.dng", receipt());
        assert_eq!(record.name, "photo.dng");
        assert_eq!(record.remote_id, "0b1e_photo.dng");
        assert!(record.raw_download_uri.is_none());
        assert!(record.dimensions.is_none());
    }

    #[test]
    fn test_with_dimensions_marks_metadata() {
        let dims = SourceDimensions::new(6000, 4000);
        let record = FileRecord::from_receipt("photo.dng", receipt()).with_dimensions(dims);
        assert_eq!(record.dimension_source, Some(DimensionSource::Metadata));

        let record = FileRecord::from_receipt("photo.dng", receipt()).with_dimensions(None);
        assert!(record.dimension_source.is_none());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = FileRecord::from_receipt("photo.dng", receipt())
            .with_dimensions(SourceDimensions::new(6000, 4000));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["remoteId"], "0b1e_photo.dng");
        assert_eq!(json["previewUri"], "http://127.0.0.1:8000/processed/0b1e_photo.dng.jpg");
        assert!(json["rawDownloadUri"].is_null());
        assert_eq!(json["dimensionSource"], "metadata");
        assert!(json.get("preview_uri").is_none());
    }

    #[test]
    fn test_extension() {
        let record = FileRecord::from_receipt("DSC_0042.nef", receipt());
        assert_eq!(record.extension(), "NEF");

        let record = FileRecord::from_receipt("noext", receipt());
        assert_eq!(record.extension(), "");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a.b.arw"), Some("arw"));
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("plain"), None);
        assert_eq!(file_extension(".cr2"), Some("cr2"));
    }

    #[test]
    fn test_source_dimensions_rejects_zero() {
        assert!(SourceDimensions::new(0, 10).is_none());
        assert!(SourceDimensions::new(10, 0).is_none());
        assert_eq!(
            SourceDimensions::new(6000, 4000),
            Some(SourceDimensions {
                width: 6000,
                height: 4000
            })
        );
    }
}
