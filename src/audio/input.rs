use crate::audio::{AudioClip, Microphone};
use crate::{MockerviewError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Microphone backed by the default cpal input device.
///
/// Samples are folded to mono and accumulated for the whole session; there
/// is no length limit since a session only ends when the user stops it.
pub struct CpalMicrophone {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    captured: Arc<Mutex<Vec<f32>>>,
}

impl CpalMicrophone {
    /// Open the default input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host.default_input_device().ok_or_else(|| {
            MockerviewError::Unsupported("Recording (no input device)".into())
        })?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| {
                MockerviewError::AudioDeviceError(format!("Failed to get input config: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            captured: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Whether a default input device exists
    pub fn is_available() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(stream) => {
                let _ = stream.pause();
                drop(stream);
                true
            }
            None => false,
        }
    }
}

impl Microphone for CpalMicrophone {
    fn start(&mut self) -> Result<()> {
        if self.release() {
            warn!("Microphone was still open, released the previous stream");
        }

        self.captured.lock().clear();
        let channels = self.config.channels as usize;
        let captured = Arc::clone(&self.captured);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mut buf = captured.lock();
                    if channels == 1 {
                        buf.extend_from_slice(data);
                    } else {
                        buf.extend(
                            data.chunks(channels)
                                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                        );
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| match e {
                BuildStreamError::DeviceNotAvailable => {
                    MockerviewError::PermissionDenied("input device not available".into())
                }
                other => MockerviewError::AudioDeviceError(format!(
                    "Failed to build input stream: {}",
                    other
                )),
            })?;

        stream.play().map_err(|e| {
            MockerviewError::AudioDeviceError(format!("Failed to start input stream: {}", e))
        })?;

        self.stream = Some(stream);
        info!("Started microphone capture at {} Hz", self.sample_rate());
        Ok(())
    }

    fn stop(&mut self) -> Option<AudioClip> {
        if !self.release() {
            return None;
        }

        let samples = std::mem::take(&mut *self.captured.lock());
        let clip = AudioClip::mono(samples, self.sample_rate());
        info!(
            "Stopped microphone capture ({:.1}s captured)",
            clip.duration_seconds()
        );
        Some(clip)
    }

    fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        self.release();
    }
}
