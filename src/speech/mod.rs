//! Question announcement (text-to-speech)
//!
//! This module provides:
//! - The [`Announcer`] seam used by the practice flow
//! - A VITS implementation via sherpa-rs running on a worker thread

pub mod tts;

pub use tts::{normalize_text, SherpaAnnouncer, TTSEngine, VoiceConfig};

use crate::utils::Pending;
use crate::{MockerviewError, Result};

/// Reads text aloud.
///
/// `announce` replaces any announcement in progress. The completion resolves
/// once when the announcement ends, fails, or is cancelled.
pub trait Announcer {
    fn announce(&mut self, text: &str, locale: &str) -> Result<Pending<()>>;

    /// Stop the current announcement; no-op when silent
    fn cancel(&mut self);
}

/// Stand-in used when speech synthesis is unavailable
#[derive(Debug, Default)]
pub struct NoSpeech;

impl Announcer for NoSpeech {
    fn announce(&mut self, _text: &str, _locale: &str) -> Result<Pending<()>> {
        Err(MockerviewError::Unsupported("Speech synthesis".into()))
    }

    fn cancel(&mut self) {}
}
