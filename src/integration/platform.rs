//! Capability probe and assembly of the platform services
//!
//! The probe runs once at startup. Its result decides which concrete
//! backends are built; anything missing is replaced by an explicit
//! "unavailable" implementation so the rest of the app never has to detect
//! features on its own.

use crate::audio::{AudioSink, Microphone, NoAudioSink, NoMicrophone};
use crate::integration::config::AppConfig;
use crate::speech::{tts::select_voice, Announcer, NoSpeech};
use tracing::{info, warn};

/// What this machine can do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// A voice for the configured locale is installed and can be heard
    pub speech: bool,
    /// An input device exists and capture is enabled
    pub capture: bool,
    /// An output device exists and playback is enabled
    pub playback: bool,
}

impl Capabilities {
    /// Everything available
    pub fn full() -> Self {
        Self {
            speech: true,
            capture: true,
            playback: true,
        }
    }

    /// Nothing available
    pub fn none() -> Self {
        Self {
            speech: false,
            capture: false,
            playback: false,
        }
    }

    /// Probe the configured voices and the default audio devices
    pub fn probe(config: &AppConfig) -> Self {
        let (input_device, output_device) = default_devices();

        let playback = config.audio.enable_playback && output_device;
        let capture = config.audio.enable_capture && input_device;
        let voice_installed = select_voice(&config.speech.voices, &config.speech.locale)
            .map(|v| v.is_installed())
            .unwrap_or(false);
        let speech = playback && voice_installed;

        let caps = Self {
            speech,
            capture,
            playback,
        };
        info!("Capabilities: {:?}", caps);
        if !voice_installed {
            warn!("No installed voice for {}", config.speech.locale);
        }
        caps
    }
}

#[cfg(feature = "audio-io")]
fn default_devices() -> (bool, bool) {
    (
        crate::audio::CpalMicrophone::is_available(),
        crate::audio::CpalPlayer::is_available(),
    )
}

#[cfg(not(feature = "audio-io"))]
fn default_devices() -> (bool, bool) {
    (false, false)
}

/// The platform services consumed by the views
pub struct Services {
    pub capabilities: Capabilities,
    pub announcer: Box<dyn Announcer>,
    pub microphone: Box<dyn Microphone>,
    pub player: Box<dyn AudioSink>,
}

impl Services {
    /// Services that do nothing; used for headless runs and tests
    pub fn unavailable() -> Self {
        Self {
            capabilities: Capabilities::none(),
            announcer: Box::new(NoSpeech),
            microphone: Box::new(NoMicrophone),
            player: Box::new(NoAudioSink),
        }
    }

    /// Build real backends for whatever the probe found. A backend that
    /// fails to open downgrades its capability instead of failing startup.
    pub fn assemble(config: &AppConfig, probed: Capabilities) -> Self {
        let mut services = Self::unavailable();
        services.capabilities = probed;

        if probed.speech {
            match crate::speech::SherpaAnnouncer::start(config.speech.voices.clone()) {
                Ok(announcer) => services.announcer = Box::new(announcer),
                Err(e) => {
                    warn!("Speech disabled: {}", e);
                    services.capabilities.speech = false;
                }
            }
        }

        #[cfg(feature = "audio-io")]
        {
            if probed.capture {
                match crate::audio::CpalMicrophone::new() {
                    Ok(mic) => services.microphone = Box::new(mic),
                    Err(e) => {
                        warn!("Recording disabled: {}", e);
                        services.capabilities.capture = false;
                    }
                }
            }
            if probed.playback {
                match crate::audio::CpalPlayer::new() {
                    Ok(player) => services.player = Box::new(player),
                    Err(e) => {
                        warn!("Playback disabled: {}", e);
                        services.capabilities.playback = false;
                    }
                }
            }
        }

        services
    }
}
