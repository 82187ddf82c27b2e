//! Photo organization module.
//!
//! Decides where a photo lands in the library: a year folder, optionally
//! suffixed with the place it was taken, and a `YYYY-MM-DD_IMGnnnn` file
//! name that is unique within that folder.

mod allocator;
mod copier;

pub use allocator::DestinationAllocator;
pub use copier::copy_new;

use crate::core::geocode::PlaceName;
use chrono::{Datelike, NaiveDateTime};

/// Characters that cannot appear in a folder name on common filesystems
const FORBIDDEN_IN_FOLDER: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Library folder for a photo: `"{year}"` or `"{year} - {place}"`
pub fn folder_name(taken_at: NaiveDateTime, place: &PlaceName) -> String {
    let year = taken_at.year();
    match place.known() {
        Some(name) => format!("{} - {}", year, sanitize_component(name)),
        None => year.to_string(),
    }
}

/// File name prefix for a photo's capture date
pub fn date_prefix(taken_at: NaiveDateTime) -> String {
    taken_at.format("%Y-%m-%d").to_string()
}

fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FORBIDDEN_IN_FOLDER.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}
