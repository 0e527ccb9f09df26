//! In-memory WAV encoding and the self-contained data URL form persisted with
//! every recording.

use crate::audio::AudioClip;
use crate::{MockerviewError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// MIME type of the encoded recordings
pub const WAV_MIME: &str = "audio/wav";

/// Encode a clip as 16-bit PCM WAV bytes
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>> {
    if clip.sample_rate == 0 || clip.channels == 0 {
        return Err(MockerviewError::EncodeError(format!(
            "invalid clip format: {} Hz, {} channels",
            clip.sample_rate, clip.channels
        )));
    }

    let spec = WavSpec {
        channels: clip.channels,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in &clip.samples {
            let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(sample_i16)?;
        }
        writer.finalize()?;
    }

    let bytes = cursor.into_inner();
    debug!(
        "Encoded {} samples into {} WAV bytes",
        clip.samples.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Decode WAV bytes (16/24/32-bit int or float) into a clip
pub fn decode_wav(bytes: &[u8]) -> Result<AudioClip> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_608.0)) // 2^23
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
            .collect::<std::result::Result<_, _>>()?,
        (_, bits) => {
            return Err(MockerviewError::EncodeError(format!(
                "unsupported bit depth: {}",
                bits
            )))
        }
    };

    Ok(AudioClip::new(samples, spec.sample_rate, spec.channels))
}

/// Encode a clip into a `data:audio/wav;base64,...` URL
pub fn to_data_url(clip: &AudioClip) -> Result<String> {
    let bytes = encode_wav(clip)?;
    Ok(format!("data:{};base64,{}", WAV_MIME, BASE64.encode(bytes)))
}

/// Decode a data URL produced by [`to_data_url`]
pub fn from_data_url(url: &str) -> Result<AudioClip> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| MockerviewError::EncodeError("not a data URL".into()))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MockerviewError::EncodeError("data URL has no payload".into()))?;

    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default();
    if !parts.any(|p| p == "base64") {
        return Err(MockerviewError::EncodeError(
            "data URL payload is not base64".into(),
        ));
    }
    if mime != WAV_MIME && mime != "audio/x-wav" && mime != "audio/wave" {
        return Err(MockerviewError::EncodeError(format!(
            "unsupported audio type: {}",
            mime
        )));
    }

    let bytes = BASE64.decode(payload.trim())?;
    decode_wav(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(sample_rate: u32, seconds: f32) -> AudioClip {
        let samples = (0..(sample_rate as f32 * seconds) as usize)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect();
        AudioClip::mono(samples, sample_rate)
    }

    #[test]
    fn test_data_url_shape() {
        let url = to_data_url(&sine(16000, 0.1)).unwrap();
        assert!(url.starts_with("data:audio/wav;base64,"));
    }

    #[test]
    fn test_data_url_preserves_audio() {
        let clip = sine(16000, 0.25);
        let decoded = from_data_url(&to_data_url(&clip).unwrap()).unwrap();

        assert_eq!(decoded.sample_rate, 16000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), clip.samples.len());
        // Some precision loss from the i16 conversion is expected
        for (original, read) in clip.samples.iter().zip(decoded.samples.iter()) {
            assert!((original - read).abs() < 0.001);
        }
    }

    #[test]
    fn test_rejects_foreign_payloads() {
        assert!(from_data_url("https://example.com/a.wav").is_err());
        assert!(from_data_url("data:audio/webm;base64,AAAA").is_err());
        assert!(from_data_url("data:audio/wav,plain").is_err());
        assert!(from_data_url("data:audio/wav;base64,!!!").is_err());
    }

    #[test]
    fn test_invalid_format_is_encode_error() {
        let clip = AudioClip::new(vec![0.0; 4], 0, 1);
        assert!(matches!(
            encode_wav(&clip),
            Err(MockerviewError::EncodeError(_))
        ));
    }
}
