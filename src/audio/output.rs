use crate::audio::{match_channels, resample_clip, AudioClip, AudioSink};
use crate::utils::{pending, Pending, Resolver};
use crate::{MockerviewError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Playback state shared with the output callback
struct Track {
    samples: Vec<f32>,
    position: usize,
    finished: Arc<AtomicBool>,
    resolver: Option<Resolver<()>>,
}

impl Track {
    fn finish(&mut self) {
        self.finished.store(true, Ordering::SeqCst);
        if let Some(resolver) = self.resolver.take() {
            resolver.succeed(());
        }
    }
}

/// Single-slot player on the default cpal output device
pub struct CpalPlayer {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    track: Option<Arc<Mutex<Track>>>,
    finished: Arc<AtomicBool>,
}

impl CpalPlayer {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or_else(|| {
            MockerviewError::Unsupported("Audio playback (no output device)".into())
        })?;

        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_output_config()
            .map_err(|e| {
                MockerviewError::AudioDeviceError(format!("Failed to get output config: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            track: None,
            finished: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Whether a default output device exists
    pub fn is_available() -> bool {
        cpal::default_host().default_output_device().is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Play a clip and block the calling thread until it ends or `cancelled`
    /// turns true. Used by the speech worker, which owns its own player.
    pub fn play_blocking(&mut self, clip: &AudioClip, cancelled: impl Fn() -> bool) -> Result<()> {
        let mut done = self.play(clip)?;
        loop {
            if done.poll().is_some() {
                return Ok(());
            }
            if cancelled() {
                self.stop();
                return Ok(());
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
    }
}

impl AudioSink for CpalPlayer {
    fn play(&mut self, clip: &AudioClip) -> Result<Pending<()>> {
        self.stop();

        let prepared = match_channels(&resample_clip(clip, self.sample_rate())?, self.config.channels);
        let (resolver, done) = pending();

        let finished = Arc::new(AtomicBool::new(false));
        let track = Arc::new(Mutex::new(Track {
            samples: prepared.samples,
            position: 0,
            finished: Arc::clone(&finished),
            resolver: Some(resolver),
        }));
        let feed = Arc::clone(&track);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut track = feed.lock();
                    let available = track.samples.len() - track.position;
                    let take = available.min(data.len());

                    let start = track.position;
                    data[..take].copy_from_slice(&track.samples[start..start + take]);
                    data[take..].fill(0.0);
                    track.position += take;

                    if track.position >= track.samples.len() {
                        track.finish();
                    }
                },
                |err| error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| {
                MockerviewError::AudioDeviceError(format!("Failed to build output stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            MockerviewError::AudioDeviceError(format!("Failed to start output stream: {}", e))
        })?;

        debug!("Playing {:.1}s clip", clip.duration_seconds());
        self.stream = Some(stream);
        self.track = Some(track);
        self.finished = finished;
        Ok(done)
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
            drop(stream);
            debug!("Stopped playback");
        }
        if let Some(track) = self.track.take() {
            track.lock().finish();
        }
    }

    fn is_playing(&self) -> bool {
        self.stream.is_some() && !self.finished.load(Ordering::SeqCst)
    }
}

impl Drop for CpalPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
