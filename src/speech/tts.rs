//! Text-to-speech with sherpa-rs (VITS models)
//!
//! Synthesis and playback both block, so they run on a dedicated worker
//! thread that owns the engines and its own output device. The UI thread
//! only sends commands and polls completions.

use crate::audio::AudioClip;
use crate::speech::Announcer;
use crate::utils::{pending, Pending, Resolver};
use crate::{MockerviewError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// One VITS voice, selected by locale
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// BCP 47 tag the voice speaks, e.g. "en-US"
    pub locale: String,

    /// Path to the ONNX model file
    pub model_path: String,

    /// Path to the tokens file
    pub tokens_path: String,

    /// Path to the lexicon file (optional for some models)
    pub lexicon_path: Option<String>,

    /// Path to the espeak-ng data directory (optional)
    pub data_dir: Option<String>,

    /// Length scale for speech rate (1.0 = normal, >1.0 = slower)
    pub length_scale: f32,

    /// Speaker ID for multi-speaker models
    pub speaker_id: i32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            model_path: String::new(),
            tokens_path: String::new(),
            lexicon_path: None,
            data_dir: None,
            length_scale: 1.0,
            speaker_id: 0,
        }
    }
}

impl VoiceConfig {
    pub fn new(
        locale: impl Into<String>,
        model_path: impl Into<String>,
        tokens_path: impl Into<String>,
    ) -> Self {
        Self {
            locale: locale.into(),
            model_path: model_path.into(),
            tokens_path: tokens_path.into(),
            ..Default::default()
        }
    }

    /// Whether the model and tokens files are present
    pub fn is_installed(&self) -> bool {
        !self.model_path.is_empty()
            && !self.tokens_path.is_empty()
            && Path::new(&self.model_path).exists()
            && Path::new(&self.tokens_path).exists()
    }

    /// Case-insensitive match on the locale tag, falling back to the language
    pub fn speaks(&self, locale: &str) -> bool {
        if self.locale.eq_ignore_ascii_case(locale) {
            return true;
        }
        let language = |tag: &str| tag.split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase();
        language(&self.locale) == language(locale)
    }
}

/// Pick the best installed voice for a locale: exact tag first, then language
pub fn select_voice<'a>(voices: &'a [VoiceConfig], locale: &str) -> Option<&'a VoiceConfig> {
    voices
        .iter()
        .find(|v| v.locale.eq_ignore_ascii_case(locale))
        .or_else(|| voices.iter().find(|v| v.speaks(locale)))
}

/// Wrapper around a loaded sherpa-rs VITS model
pub struct TTSEngine {
    tts: VitsTts,
    voice: VoiceConfig,
}

impl TTSEngine {
    pub fn new(voice: VoiceConfig) -> Result<Self> {
        if voice.model_path.is_empty() || voice.tokens_path.is_empty() {
            return Err(MockerviewError::ConfigError(format!(
                "voice {} needs a model and a tokens path",
                voice.locale
            )));
        }
        if !voice.is_installed() {
            return Err(MockerviewError::Unsupported(format!(
                "Speech synthesis for {} (model files missing)",
                voice.locale
            )));
        }

        info!("Loading VITS voice {} from {}", voice.locale, voice.model_path);

        let vits_config = VitsTtsConfig {
            model: voice.model_path.clone(),
            tokens: voice.tokens_path.clone(),
            lexicon: voice.lexicon_path.clone().unwrap_or_default(),
            data_dir: voice.data_dir.clone().unwrap_or_default(),
            length_scale: voice.length_scale,
            ..Default::default()
        };

        Ok(Self {
            tts: VitsTts::new(vits_config),
            voice,
        })
    }

    pub fn synthesize(&mut self, text: &str) -> Result<AudioClip> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(MockerviewError::EmptyInput("nothing to announce".into()));
        }

        debug!("Synthesizing: {}", normalized);

        let audio = self
            .tts
            .create(&normalized, self.voice.speaker_id, 1.0)
            .map_err(|e| MockerviewError::TTSError(format!("Synthesis failed: {}", e)))?;

        Ok(AudioClip::mono(audio.samples, audio.sample_rate as u32))
    }
}

/// Collapse whitespace runs so line breaks in a question don't become pauses
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

enum SpeechCommand {
    Announce {
        text: String,
        locale: String,
        generation: u64,
        resolver: Resolver<()>,
    },
    Shutdown,
}

/// [`Announcer`] backed by sherpa-rs voices and the default output device
pub struct SherpaAnnouncer {
    command_tx: Sender<SpeechCommand>,
    /// Bumped on every announce/cancel; the worker drops stale work
    generation: Arc<AtomicU64>,
}

impl SherpaAnnouncer {
    /// Spawn the speech worker. Voices load lazily on first use.
    pub fn start(voices: Vec<VoiceConfig>) -> Result<Self> {
        let (command_tx, command_rx) = unbounded();
        let generation = Arc::new(AtomicU64::new(0));
        let worker_generation = Arc::clone(&generation);

        thread::Builder::new()
            .name("speech".into())
            .spawn(move || run_worker(voices, command_rx, worker_generation))?;

        Ok(Self {
            command_tx,
            generation,
        })
    }
}

impl Announcer for SherpaAnnouncer {
    fn announce(&mut self, text: &str, locale: &str) -> Result<Pending<()>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (resolver, done) = pending();

        self.command_tx
            .send(SpeechCommand::Announce {
                text: text.to_string(),
                locale: locale.to_string(),
                generation,
                resolver,
            })
            .map_err(|_| MockerviewError::ChannelError("speech worker is gone".into()))?;

        Ok(done)
    }

    fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for SherpaAnnouncer {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.command_tx.send(SpeechCommand::Shutdown);
    }
}

fn run_worker(voices: Vec<VoiceConfig>, command_rx: Receiver<SpeechCommand>, generation: Arc<AtomicU64>) {
    info!("Speech worker starting with {} voice(s)", voices.len());

    let mut engines: HashMap<String, TTSEngine> = HashMap::new();
    #[cfg(feature = "audio-io")]
    let mut player = crate::audio::CpalPlayer::new();

    while let Ok(command) = command_rx.recv() {
        let (text, locale, ticket, resolver) = match command {
            SpeechCommand::Announce {
                text,
                locale,
                generation,
                resolver,
            } => (text, locale, generation, resolver),
            SpeechCommand::Shutdown => break,
        };

        let is_stale = || generation.load(Ordering::SeqCst) != ticket;
        if is_stale() {
            resolver.succeed(());
            continue;
        }

        let Some(voice) = select_voice(&voices, &locale) else {
            warn!("No voice configured for {}", locale);
            resolver.fail(MockerviewError::Unsupported(format!(
                "Speech synthesis for {}",
                locale
            )));
            continue;
        };

        let engine = match engines.entry(voice.locale.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => match TTSEngine::new(voice.clone()) {
                Ok(engine) => slot.insert(engine),
                Err(e) => {
                    error!("Failed to load voice {}: {}", voice.locale, e);
                    resolver.fail(e);
                    continue;
                }
            },
        };

        let clip = match engine.synthesize(&text) {
            Ok(clip) => clip,
            Err(e) => {
                resolver.fail(e);
                continue;
            }
        };

        if is_stale() {
            debug!("Announcement cancelled before playback");
            resolver.succeed(());
            continue;
        }

        #[cfg(feature = "audio-io")]
        let outcome = match player.as_mut() {
            Ok(player) => player.play_blocking(&clip, is_stale),
            Err(e) => Err(e.clone()),
        };
        #[cfg(not(feature = "audio-io"))]
        let outcome: Result<()> = Err(MockerviewError::Unsupported(format!(
            "Audio playback ({:.1}s announcement dropped)",
            clip.duration_seconds()
        )));

        resolver.resolve(outcome);
    }

    info!("Speech worker stopped");
}
