// tierthumb/src/processors/metadata.rs
use crate::core::{Result, ThumbnailError};
use exif::{Exif, In, Reader, Tag};
use image::DynamicImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Orientation recorded in an image's EXIF data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
    /// Mirrored or undefined values. These are not corrected.
    Other(u32),
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Normal,
            3 => Self::Rotate180,
            6 => Self::Rotate90,
            8 => Self::Rotate270,
            other => Self::Other(other),
        }
    }
}

impl Orientation {
    /// Signed rotation applied to the decoded raster. 270 maps to -90.
    pub fn rotation_degrees(self) -> i32 {
        match self {
            Self::Rotate270 => -90,
            Self::Rotate180 => 180,
            Self::Rotate90 => 90,
            _ => 0,
        }
    }
}

/// Rotates a raster by a signed number of degrees, clockwise for positive
/// values. The input is consumed, so the pre-rotation buffer is freed as soon
/// as the rotated one exists.
pub fn apply_rotation(image: DynamicImage, degrees: i32) -> DynamicImage {
    match degrees {
        90 => image.rotate90(),
        180 | -180 => image.rotate180(),
        -90 | 270 => image.rotate270(),
        _ => image,
    }
}

pub struct OrientationReader;

impl OrientationReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_metadata(&self, path: &Path) -> Result<Option<Exif>> {
        let file = File::open(path).map_err(|e| {
            ThumbnailError::MetadataUnavailable(format!("{}: {}", path.display(), e))
        })?;
        let mut bufreader = BufReader::new(&file);

        match Reader::new().read_from_container(&mut bufreader) {
            Ok(exif) => {
                log::debug!("Found EXIF data in {}", path.display());
                Ok(Some(exif))
            }
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found in {}", path.display());
                Ok(None)
            }
            Err(e) => Err(ThumbnailError::MetadataUnavailable(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn has_metadata(&self, path: &Path) -> Result<bool> {
        Ok(self.read_metadata(path)?.is_some())
    }

    /// Reads the orientation tag. A file without EXIF, or without the tag,
    /// is `Normal`.
    pub fn read_orientation(&self, path: &Path) -> Result<Orientation> {
        let orientation = self
            .read_metadata(path)?
            .and_then(|exif| {
                exif.get_field(Tag::Orientation, In::PRIMARY)
                    .and_then(|field| field.value.get_uint(0))
            })
            .map(Orientation::from)
            .unwrap_or_default();

        log::debug!("Orientation of {}: {:?}", path.display(), orientation);
        Ok(orientation)
    }
}

impl Default for OrientationReader {
    fn default() -> Self {
        Self::new()
    }
}
