//! In-memory doubles for the platform seams
//!
//! Each double is a cheap handle over shared state, so a test can keep one
//! clone for inspection and hand the other to the code under test.

use crate::audio::{AudioClip, AudioSink, Microphone};
use crate::speech::Announcer;
use crate::utils::{pending, Pending, Resolver};
use crate::{MockerviewError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Half a second of a quiet 440 Hz tone at 16 kHz
pub fn tone_clip() -> AudioClip {
    let rate = 16000;
    let samples = (0..rate / 2)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / rate as f32).sin() * 0.2)
        .collect();
    AudioClip::mono(samples, rate)
}

#[derive(Default)]
struct AnnouncerState {
    announced: Vec<(String, String)>,
    current: Option<Resolver<()>>,
    cancels: usize,
    failure: Option<MockerviewError>,
}

/// Announcer whose announcements finish only when the test says so
#[derive(Clone, Default)]
pub struct FakeAnnouncer {
    state: Arc<Mutex<AnnouncerState>>,
}

impl FakeAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `announce` fail with `error`
    pub fn fail_with(&self, error: MockerviewError) {
        self.state.lock().failure = Some(error);
    }

    /// Complete the current announcement
    pub fn finish(&self) {
        if let Some(resolver) = self.state.lock().current.take() {
            resolver.succeed(());
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.state.lock().current.is_some()
    }

    /// Every `(text, locale)` pair announced so far
    pub fn announced(&self) -> Vec<(String, String)> {
        self.state.lock().announced.clone()
    }

    pub fn cancels(&self) -> usize {
        self.state.lock().cancels
    }
}

impl Announcer for FakeAnnouncer {
    fn announce(&mut self, text: &str, locale: &str) -> Result<Pending<()>> {
        let mut state = self.state.lock();
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }
        if let Some(previous) = state.current.take() {
            previous.succeed(());
        }

        let (resolver, done) = pending();
        state.announced.push((text.to_string(), locale.to_string()));
        state.current = Some(resolver);
        Ok(done)
    }

    fn cancel(&mut self) {
        let mut state = self.state.lock();
        state.cancels += 1;
        if let Some(current) = state.current.take() {
            current.succeed(());
        }
    }
}

struct MicrophoneState {
    open: bool,
    denied: bool,
    clip: AudioClip,
    starts: usize,
    stops: usize,
}

/// Microphone that "captures" a preset clip
#[derive(Clone)]
pub struct FakeMicrophone {
    state: Arc<Mutex<MicrophoneState>>,
}

impl Default for FakeMicrophone {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MicrophoneState {
                open: false,
                denied: false,
                clip: tone_clip(),
                starts: 0,
                stops: 0,
            })),
        }
    }
}

impl FakeMicrophone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse access from now on
    pub fn deny(&self) {
        self.state.lock().denied = true;
    }

    /// Clip returned by the next `stop`
    pub fn set_clip(&self, clip: AudioClip) {
        self.state.lock().clip = clip;
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Successful acquisitions
    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    /// Releases of an open device
    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }
}

impl Microphone for FakeMicrophone {
    fn start(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.denied {
            return Err(MockerviewError::PermissionDenied(
                "microphone access denied".into(),
            ));
        }
        if state.open {
            state.stops += 1;
        }
        state.open = true;
        state.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Option<AudioClip> {
        let mut state = self.state.lock();
        if !state.open {
            return None;
        }
        state.open = false;
        state.stops += 1;
        Some(state.clip.clone())
    }

    fn is_capturing(&self) -> bool {
        self.state.lock().open
    }
}

#[derive(Default)]
struct SinkState {
    current: Option<Resolver<()>>,
    played: Vec<usize>,
    stops: usize,
    failure: Option<MockerviewError>,
}

/// Audio output that plays until the test finishes the clip
#[derive(Clone, Default)]
pub struct FakeAudioSink {
    state: Arc<Mutex<SinkState>>,
}

impl FakeAudioSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: MockerviewError) {
        self.state.lock().failure = Some(error);
    }

    /// Let the current clip run to its end
    pub fn finish(&self) {
        if let Some(resolver) = self.state.lock().current.take() {
            resolver.succeed(());
        }
    }

    /// Sample counts of every clip started so far
    pub fn played(&self) -> Vec<usize> {
        self.state.lock().played.clone()
    }

    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }
}

impl AudioSink for FakeAudioSink {
    fn play(&mut self, clip: &AudioClip) -> Result<Pending<()>> {
        let mut state = self.state.lock();
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }
        if let Some(previous) = state.current.take() {
            previous.succeed(());
        }

        let (resolver, done) = pending();
        state.played.push(clip.samples.len());
        state.current = Some(resolver);
        Ok(done)
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        if let Some(current) = state.current.take() {
            state.stops += 1;
            current.succeed(());
        }
    }

    fn is_playing(&self) -> bool {
        self.state.lock().current.is_some()
    }
}
