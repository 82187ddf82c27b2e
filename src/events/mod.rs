//! # Events Module
//!
//! Event-driven progress reporting for the organizer pipeline.
//!
//! ## Design
//! The core library emits events through channels, allowing any front end
//! to subscribe and display progress. Workers send events from rayon
//! threads; the receiver usually lives on its own thread.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Ingest(IngestEvent::Progress(p)) = event {
//!             println!("{}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
