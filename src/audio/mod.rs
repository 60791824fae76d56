//! Audio side effects of a breathing session: spoken phase cues and the
//! ambient loop. The session logic only talks to the two traits here, so
//! sessions run the same with real audio, a log, or nothing at all.

#[cfg(feature = "ambient-audio")]
pub mod brown_noise;
#[cfg(feature = "ambient-audio")]
pub mod engine;

use anyhow::Result;
use log::info;

#[cfg(feature = "ambient-audio")]
pub use engine::AudioEngineHandle;

/// Speaks short phase labels asynchronously.
pub trait NarrationSink: Send + Sync {
    /// Queue `label` for speaking. Must not block.
    fn speak(&self, label: &str) -> Result<()>;

    /// Drop anything queued or being spoken.
    fn cancel_all(&self) -> Result<()>;
}

/// Ambient loop played for the duration of a session.
pub trait MediaPlayback: Send + Sync {
    /// Load the loop from the top, paused.
    fn start(&self) -> Result<()>;
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    /// Stop and release the output device.
    fn stop(&self) -> Result<()>;
    fn set_volume(&self, volume: f32) -> Result<()>;
}

/// Narrator for headless runs: every cue goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNarrator;

impl NarrationSink for LogNarrator {
    fn speak(&self, label: &str) -> Result<()> {
        info!("narration: {}", label);
        Ok(())
    }

    fn cancel_all(&self) -> Result<()> {
        Ok(())
    }
}

/// No ambient audio device.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMedia;

impl MediaPlayback for NullMedia {
    fn start(&self) -> Result<()> {
        Ok(())
    }

    fn play(&self) -> Result<()> {
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn set_volume(&self, _volume: f32) -> Result<()> {
        Ok(())
    }
}
