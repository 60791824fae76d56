use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rodio::Source;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44_100;
/// Largest random step per sample.
const STEP: f32 = 0.02;
/// Leak back towards zero so the walk never settles on a DC offset.
const LEAK: f32 = 0.9999;
/// Output gain; the loop sits under the narration, never over it.
const GAIN: f32 = 0.3;
/// Length of the fade-in when the loop starts, in samples.
const FADE_IN: u32 = SAMPLE_RATE / 2;

/// Endless brown noise, the low rumble used as the breathing session's
/// ambient loop. Power falls 6 dB per octave.
pub struct BrownNoise {
    level: f32,
    emitted: u32,
    rng: StdRng,
}

impl BrownNoise {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            level: 0.0,
            emitted: 0,
            rng,
        }
    }

    fn fade(&mut self) -> f32 {
        if self.emitted >= FADE_IN {
            return 1.0;
        }
        self.emitted += 1;
        self.emitted as f32 / FADE_IN as f32
    }
}

impl Default for BrownNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for BrownNoise {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let white: f32 = self.rng.gen_range(-1.0..1.0);
        self.level = (self.level + white * STEP).clamp(-1.0, 1.0) * LEAK;
        let fade = self.fade();

        Some(self.level * GAIN * fade)
    }
}

impl Source for BrownNoise {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
