//! Audio capture, playback and encoding
//!
//! The practice flow and the recordings browser talk to the hardware only
//! through [`Microphone`] and [`AudioSink`], so the cpal backends can be
//! swapped for the in-memory doubles in `crate::testing` (built with the
//! `testing` feature).

pub mod clip;
#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod resampler;
pub mod wav;

pub use clip::AudioClip;
#[cfg(feature = "audio-io")]
pub use input::CpalMicrophone;
#[cfg(feature = "audio-io")]
pub use output::CpalPlayer;
pub use resampler::{match_channels, resample_clip};
pub use wav::{from_data_url, to_data_url};

use crate::utils::Pending;
use crate::{MockerviewError, Result};

/// Microphone capture.
///
/// Implementations own at most one open input stream. `start` while already
/// capturing releases the previous stream first; `stop` releases the stream
/// and is a no-op returning `None` when nothing is being captured.
pub trait Microphone {
    /// Acquire the input device and begin capturing
    fn start(&mut self) -> Result<()>;

    /// Release the input device and hand back what was captured
    fn stop(&mut self) -> Option<AudioClip>;

    fn is_capturing(&self) -> bool;
}

/// Single-slot audio output.
///
/// Starting a clip stops whatever was playing. The returned completion
/// resolves once when the clip finishes or is stopped.
pub trait AudioSink {
    fn play(&mut self, clip: &AudioClip) -> Result<Pending<()>>;

    /// Stop playback; no-op when idle
    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

/// Stand-in used when the capture capability is missing
#[derive(Debug, Default)]
pub struct NoMicrophone;

impl Microphone for NoMicrophone {
    fn start(&mut self) -> Result<()> {
        Err(MockerviewError::Unsupported("Recording".into()))
    }

    fn stop(&mut self) -> Option<AudioClip> {
        None
    }

    fn is_capturing(&self) -> bool {
        false
    }
}

/// Stand-in used when the playback capability is missing
#[derive(Debug, Default)]
pub struct NoAudioSink;

impl AudioSink for NoAudioSink {
    fn play(&mut self, _clip: &AudioClip) -> Result<Pending<()>> {
        Err(MockerviewError::Unsupported("Audio playback".into()))
    }

    fn stop(&mut self) {}

    fn is_playing(&self) -> bool {
        false
    }
}
