use crate::error::AlertResult;
use crate::models::Urgency;
use std::f32::consts::PI;
use std::time::Duration;

const TONE_LENGTH: Duration = Duration::from_millis(180);
const TONE_GAP: Duration = Duration::from_millis(90);
const ENVELOPE: Duration = Duration::from_millis(10);
const AMPLITUDE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
}

/// A short pitch pattern played with an alert. Louder urgencies get more tones.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCue {
    pub tones: Vec<Tone>,
    pub gap: Duration,
}

impl AudioCue {
    pub fn for_urgency(urgency: Urgency) -> Self {
        let pitches: &[f32] = match urgency {
            Urgency::Critical => &[880.0, 660.0, 880.0],
            Urgency::High => &[660.0, 880.0],
            Urgency::Medium => &[660.0],
            Urgency::Low => &[520.0],
        };

        Self {
            tones: pitches
                .iter()
                .map(|&frequency_hz| Tone {
                    frequency_hz,
                    duration: TONE_LENGTH,
                })
                .collect(),
            gap: TONE_GAP,
        }
    }

    pub fn total_duration(&self) -> Duration {
        let tones: Duration = self.tones.iter().map(|t| t.duration).sum();
        let gaps = self.gap * self.tones.len().saturating_sub(1) as u32;
        tones + gaps
    }

    /// Synthesize mono samples: sine tones with a linear fade in and out, silence between.
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let rate = sample_rate as f32;
        let gap_samples = (self.gap.as_secs_f32() * rate) as usize;
        let fade_samples = (ENVELOPE.as_secs_f32() * rate).max(1.0);
        let mut samples = Vec::with_capacity((self.total_duration().as_secs_f32() * rate) as usize);

        for (index, tone) in self.tones.iter().enumerate() {
            if index > 0 {
                samples.extend(std::iter::repeat_n(0.0, gap_samples));
            }

            let count = (tone.duration.as_secs_f32() * rate) as usize;
            for n in 0..count {
                let remaining = (count - n) as f32;
                let envelope = (n as f32 / fade_samples).min(remaining / fade_samples).min(1.0);
                let phase = 2.0 * PI * tone.frequency_hz * n as f32 / rate;
                samples.push(AMPLITUDE * envelope * phase.sin());
            }
        }

        samples
    }
}

/// Plays synthesized cues. Implementations must not block the caller for the
/// length of the cue.
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: &AudioCue) -> AlertResult<()>;
}

/// Renders nothing. Used when sound is disabled or no audio backend is compiled in.
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&self, cue: &AudioCue) -> AlertResult<()> {
        tracing::debug!(tones = cue.tones.len(), "Audio cue (silent)");
        Ok(())
    }
}

#[cfg(feature = "audio")]
pub use device::DevicePlayer;

#[cfg(feature = "audio")]
mod device {
    use super::{AudioCue, CuePlayer};
    use crate::error::{AlertError, AlertResult};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    /// Plays cues on the default output device through cpal.
    #[derive(Debug, Default)]
    pub struct DevicePlayer;

    impl CuePlayer for DevicePlayer {
        fn play(&self, cue: &AudioCue) -> AlertResult<()> {
            let cue = cue.clone();
            // cpal streams are not Send on every platform, so the whole
            // stream lives and dies on its own thread.
            std::thread::Builder::new()
                .name("donorwatch-cue".to_string())
                .spawn(move || {
                    if let Err(e) = play_blocking(&cue) {
                        tracing::warn!("Audio cue failed: {e}");
                    }
                })
                .map_err(|e| AlertError::Desktop(format!("failed to spawn audio thread: {e}")))?;
            Ok(())
        }
    }

    fn play_blocking(cue: &AudioCue) -> Result<(), String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "no default output device".to_string())?;
        let supported = device
            .default_output_config()
            .map_err(|e| e.to_string())?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(format!("unsupported sample format {:?}", supported.sample_format()));
        }

        let channels = supported.channels() as usize;
        let samples = cue.render(supported.sample_rate());
        let mut cursor = 0usize;

        let stream = device
            .build_output_stream(
                &supported.config(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let value = samples.get(cursor).copied().unwrap_or(0.0);
                        cursor += 1;
                        frame.iter_mut().for_each(|s| *s = value);
                    }
                },
                |e| tracing::warn!("Audio stream error: {e}"),
                None,
            )
            .map_err(|e| e.to_string())?;

        stream.play().map_err(|e| e.to_string())?;
        std::thread::sleep(cue.total_duration() + std::time::Duration::from_millis(100));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_count_by_urgency() {
        assert_eq!(AudioCue::for_urgency(Urgency::Critical).tones.len(), 3);
        assert_eq!(AudioCue::for_urgency(Urgency::High).tones.len(), 2);
        assert_eq!(AudioCue::for_urgency(Urgency::Medium).tones.len(), 1);
        assert_eq!(AudioCue::for_urgency(Urgency::Low).tones.len(), 1);
    }

    #[test]
    fn test_total_duration() {
        let cue = AudioCue::for_urgency(Urgency::Critical);
        assert_eq!(cue.total_duration(), TONE_LENGTH * 3 + TONE_GAP * 2);

        let cue = AudioCue::for_urgency(Urgency::Low);
        assert_eq!(cue.total_duration(), TONE_LENGTH);
    }

    #[test]
    fn test_render_length_and_bounds() {
        let cue = AudioCue::for_urgency(Urgency::High);
        let samples = cue.render(8_000);

        let expected = 2 * (TONE_LENGTH.as_secs_f32() * 8_000.0) as usize
            + (TONE_GAP.as_secs_f32() * 8_000.0) as usize;
        assert_eq!(samples.len(), expected);
        assert!(samples.iter().all(|s| s.abs() <= AMPLITUDE + f32::EPSILON));
        assert!(samples.iter().any(|s| s.abs() > AMPLITUDE / 2.0));
    }

    #[test]
    fn test_render_fades_in_and_out() {
        let cue = AudioCue::for_urgency(Urgency::Low);
        let samples = cue.render(44_100);
        assert_eq!(samples[0], 0.0);
        assert!(samples.last().unwrap().abs() < 0.01);
    }

    #[test]
    fn test_silent_player() {
        assert!(SilentPlayer.play(&AudioCue::for_urgency(Urgency::High)).is_ok());
    }
}
