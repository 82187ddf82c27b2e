//! # photo-organize CLI
//!
//! Command-line interface for the photo organizer.
//!
//! ## Usage
//! ```bash
//! photo-organize ~/Pictures/Phone
//! photo-organize ~/Pictures/Phone ~/Library/Photos --workers 8 --output json
//! ```

mod cli;

use photo_organizer::Result;

fn main() -> Result<()> {
    cli::run()
}
