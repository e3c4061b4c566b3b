//! Channel mixing and sample-rate conversion to Whisper's 16 kHz mono input.
//!
//! Linear interpolation is good enough for dictated speech; short questions
//! do not benefit from a windowed-sinc resampler.

/// Sample rate expected by the STT engine and the endpoint detector.
pub const SPEECH_RATE: u32 = 16_000;

/// Average interleaved channels down to one.
///
/// ```rust
/// use resonance_oracle::audio::stereo_to_mono;
///
/// let mono = stereo_to_mono(&[0.5, -0.5, 0.3, 0.1], 2);
/// assert_eq!(mono.len(), 2);
/// assert!(mono[0].abs() < 1e-6);
/// assert!((mono[1] - 0.2).abs() < 1e-6);
/// ```
///
/// A trailing partial frame is dropped; `channels == 0` yields nothing.
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let width = usize::from(channels);
    match width {
        0 => Vec::new(),
        1 => samples.to_vec(),
        _ => samples
            .chunks_exact(width)
            .map(|frame| frame.iter().sum::<f32>() / width as f32)
            .collect(),
    }
}

/// Convert mono `samples` at `source_rate` Hz to [`SPEECH_RATE`].
///
/// ```rust
/// use resonance_oracle::audio::resample_to_16k;
///
/// assert_eq!(resample_to_16k(&[0.5; 480], 48_000).len(), 160);
/// assert_eq!(resample_to_16k(&[0.5; 80], 8_000).len(), 160);
/// ```
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == SPEECH_RATE || source_rate == 0 {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let step = f64::from(source_rate) / f64::from(SPEECH_RATE);
    let out_len = (samples.len() as f64 / step).ceil() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            samples[idx] + (samples[next] - samples[idx]) * frac
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_passes_through() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(stereo_to_mono(&input, 1), input);
    }

    #[test]
    fn zero_channels_is_empty() {
        assert!(stereo_to_mono(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn partial_trailing_frame_is_dropped() {
        let out = stereo_to_mono(&[1.0, 1.0, 0.5], 2);
        assert_eq!(out, vec![1.0]);
    }

    #[test]
    fn speech_rate_is_a_no_op() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        assert_eq!(resample_to_16k(&input, SPEECH_RATE), input);
    }

    #[test]
    fn one_second_at_44100_is_about_16000_samples() {
        let out = resample_to_16k(&vec![0.0_f32; 44_100], 44_100);
        assert!(out.len().abs_diff(16_000) <= 1, "got {}", out.len());
    }

    #[test]
    fn dc_level_survives_resampling() {
        let out = resample_to_16k(&[0.5_f32; 441], 44_100);
        assert!(out.iter().all(|s| (s - 0.5).abs() < 1e-5));
    }

    #[test]
    fn ramp_is_interpolated_when_upsampling() {
        let out = resample_to_16k(&[0.0, 1.0], 8_000);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }
}
