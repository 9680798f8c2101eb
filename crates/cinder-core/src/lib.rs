//! Shared vocabulary for the cinder crates

mod error;
mod voice;

pub use error::HttpError;
pub use voice::{Voice, VoiceInfo};
