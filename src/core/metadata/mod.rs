//! # Metadata Module
//!
//! Builds a [`PhotoRecord`] for each candidate file.
//!
//! ## Extracted Fields
//! - Capture time (EXIF DateTimeOriginal, else the file's timestamps)
//! - GPS position (EXIF GPSLatitude/GPSLongitude with their N/S/E/W refs)
//! - Content fingerprint (SHA-256 of the bytes)
//!
//! Unreadable EXIF is not an error: the photo falls back to its file time
//! and no location. Only a file that cannot be read at all fails.

use crate::core::fingerprint::Fingerprint;
use crate::core::geocode::GeoPoint;
use crate::error::MetadataError;
use chrono::{DateTime, Local, NaiveDateTime};
use exif::{Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Everything the pipeline needs to know about one photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// When the photo was taken (camera local time)
    pub taken_at: NaiveDateTime,
    /// Where the photo was taken, if the camera recorded it
    pub location: Option<GeoPoint>,
    /// File name without extension
    pub original_name: String,
    /// Extension as written on disk, including the dot (empty if none)
    pub extension: String,
    /// Content fingerprint
    pub fingerprint: Fingerprint,
}

/// Produces a [`PhotoRecord`] from a file
///
/// Implement this trait to plug in another metadata source (e.g., for
/// testing).
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<PhotoRecord, MetadataError>;
}

/// Reads EXIF with kamadak-exif and fingerprints the file
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifMetadataExtractor;

impl MetadataExtractor for ExifMetadataExtractor {
    fn extract(&self, path: &Path) -> Result<PhotoRecord, MetadataError> {
        let fingerprint = Fingerprint::of_file(path)?;

        let exif = read_exif(path);
        let exif_time = exif.as_ref().and_then(capture_time);
        let location = exif.as_ref().and_then(gps_location);

        let taken_at = match exif_time {
            Some(time) => time,
            None => file_time(path)?,
        };

        Ok(PhotoRecord {
            taken_at,
            location,
            original_name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
            fingerprint,
        })
    }
}

fn read_exif(path: &Path) -> Option<Exif> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Some(exif),
        Err(e) => {
            debug!("No EXIF in {}: {}", path.display(), e);
            None
        }
    }
}

fn capture_time(exif: &Exif) -> Option<NaiveDateTime> {
    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    parse_exif_datetime(ascii_value(&field.value)?)
}

/// Parse an EXIF timestamp ("YYYY:MM:DD HH:MM:SS")
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

fn gps_location(exif: &Exif) -> Option<GeoPoint> {
    let latitude = gps_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S')?;
    let longitude = gps_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W')?;

    // Cameras without a fix often write zeros
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }

    Some(GeoPoint::new(latitude, longitude))
}

fn gps_coordinate(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: char) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let degrees = match field.value {
        Value::Rational(ref parts) => dms_to_degrees(parts)?,
        _ => return None,
    };

    let negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| ascii_value(&f.value))
        .map(|r| r.trim().starts_with(negative_ref))
        .unwrap_or(false);

    Some(if negative { -degrees } else { degrees })
}

/// Convert degrees/minutes/seconds rationals to decimal degrees
fn dms_to_degrees(parts: &[exif::Rational]) -> Option<f64> {
    let mut components = parts.iter().map(|r| {
        if r.denom == 0 {
            None
        } else {
            Some(r.to_f64())
        }
    });

    let degrees = components.next()??;
    let minutes = components.next().flatten().unwrap_or(0.0);
    let seconds = components.next().flatten().unwrap_or(0.0);

    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    value.is_finite().then_some(value)
}

fn ascii_value(value: &Value) -> Option<&str> {
    match value {
        Value::Ascii(vec) => vec.first().and_then(|b| std::str::from_utf8(b).ok()),
        _ => None,
    }
}

/// Creation time, else modification time, in local time
fn file_time(path: &Path) -> Result<NaiveDateTime, MetadataError> {
    let metadata = fs::metadata(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let time = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map_err(|_| MetadataError::NoTimestamp {
            path: path.to_path_buf(),
        })?;

    Ok(DateTime::<Local>::from(time).naive_local())
}
