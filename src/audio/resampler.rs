use crate::audio::AudioClip;
use crate::{MockerviewError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

const CHUNK_FRAMES: usize = 1024;

/// Convert a clip to `target_rate`, keeping its channel layout.
///
/// Recordings are captured at the input device rate and played back on an
/// output device that usually runs at a different one.
pub fn resample_clip(clip: &AudioClip, target_rate: u32) -> Result<AudioClip> {
    if target_rate == 0 || clip.sample_rate == 0 {
        return Err(MockerviewError::AudioDeviceError(
            "Sample rates must be greater than 0".into(),
        ));
    }
    if clip.channels == 0 {
        return Err(MockerviewError::AudioDeviceError(
            "Number of channels must be greater than 0".into(),
        ));
    }
    if clip.sample_rate == target_rate || clip.is_empty() {
        return Ok(AudioClip::new(clip.samples.clone(), target_rate, clip.channels));
    }

    let channels = clip.channels as usize;
    let ratio = target_rate as f64 / clip.sample_rate as f64;

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, channels)
        .map_err(|e| {
            MockerviewError::AudioDeviceError(format!("Failed to create resampler: {}", e))
        })?;

    let frames = clip.frames();
    let expected_frames = (frames as f64 * ratio).round() as usize;
    // The sinc filter shifts its output; those leading frames are discarded
    let delay = resampler.output_delay();
    let wanted = delay + expected_frames;
    let mut planar_out: Vec<Vec<f32>> = vec![Vec::with_capacity(wanted + CHUNK_FRAMES); channels];

    // SincFixedIn wants exactly CHUNK_FRAMES per call; past the clip it is
    // fed silence until the delayed tail has come out
    let mut start = 0;
    while start < frames || planar_out[0].len() < wanted {
        let mut chunk = vec![vec![0.0f32; CHUNK_FRAMES]; channels];
        let end = (start + CHUNK_FRAMES).min(frames);
        for (offset, frame) in (start.min(end)..end).enumerate() {
            for (ch, lane) in chunk.iter_mut().enumerate() {
                lane[offset] = clip.samples[frame * channels + ch];
            }
        }

        let processed = resampler.process(&chunk, None).map_err(|e| {
            MockerviewError::AudioDeviceError(format!("Resampling failed: {}", e))
        })?;
        for (lane, out) in planar_out.iter_mut().zip(processed) {
            lane.extend(out);
        }
        start += CHUNK_FRAMES;
    }

    let kept = expected_frames.min(planar_out[0].len().saturating_sub(delay));
    let mut samples = Vec::with_capacity(kept * channels);
    for frame in delay..delay + kept {
        for lane in &planar_out {
            samples.push(lane[frame]);
        }
    }

    debug!(
        "Resampled {} frames at {} Hz into {} frames at {} Hz",
        frames, clip.sample_rate, kept, target_rate
    );

    Ok(AudioClip::new(samples, target_rate, clip.channels))
}

/// Duplicate or fold channels so the clip matches the device layout
pub fn match_channels(clip: &AudioClip, channels: u16) -> AudioClip {
    if clip.channels == channels || channels == 0 {
        return clip.clone();
    }

    let mono = clip.to_mono();
    let mut samples = Vec::with_capacity(mono.samples.len() * channels as usize);
    for sample in mono.samples {
        for _ in 0..channels {
            samples.push(sample);
        }
    }
    AudioClip::new(samples, clip.sample_rate, channels)
}
