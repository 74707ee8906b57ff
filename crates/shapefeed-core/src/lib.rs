//! # shapefeed-core
//!
//! Domain types shared by the shapefeed crates.
//!
//! - [`Sample`]: one reading for the `cube`, `sphere` and `cylinder` channels
//! - [`SampleRange`] / [`SampleGenerator`]: uniform draws from a half-open range
//! - [`WireFormat`]: how a sample is encoded on the socket
//! - [`SessionMode`]: streaming versus listen-only sessions
//! - Branded IDs for sessions

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod mode;
pub mod sample;

pub use errors::{CoreError, Result};
pub use ids::SessionId;
pub use mode::SessionMode;
pub use sample::{Sample, SampleGenerator, SampleRange, WireFormat};
