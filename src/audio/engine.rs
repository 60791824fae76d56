use std::sync::{
    mpsc::{self, Sender},
    Mutex,
};
use std::thread;

use anyhow::{anyhow, Result};
use log::{error, warn};
use rodio::{OutputStream, Sink};

use super::brown_noise::BrownNoise;
use super::MediaPlayback;

enum AudioCommand {
    Start,
    Play,
    Pause,
    Stop,
    SetVolume(f32),
}

/// rodio-backed ambient loop. rodio's output stream is not `Send`, so it lives
/// on a dedicated thread fed by a command channel.
pub struct AudioEngineHandle {
    tx: Mutex<Option<Sender<AudioCommand>>>,
}

impl Default for AudioEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("audio engine lock poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;
                let mut volume = 1.0f32;

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::Start => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            _stream = None;
                            match open_sink() {
                                Ok((new_stream, new_sink)) => {
                                    new_sink.pause();
                                    new_sink.set_volume(volume);
                                    new_sink.append(BrownNoise::new());
                                    _stream = Some(new_stream);
                                    sink = Some(new_sink);
                                }
                                Err(err) => warn!("ambient audio unavailable: {err:#}"),
                            }
                        }
                        AudioCommand::Play => {
                            if let Some(ref s) = sink {
                                s.play();
                            }
                        }
                        AudioCommand::Pause => {
                            if let Some(ref s) = sink {
                                s.pause();
                            }
                        }
                        AudioCommand::Stop => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            _stream = None;
                        }
                        AudioCommand::SetVolume(v) => {
                            volume = v.clamp(0.0, 1.0);
                            if let Some(ref s) = sink {
                                s.set_volume(volume);
                            }
                        }
                    }
                }
            })
            .map_err(|e| anyhow!("failed to spawn audio thread: {e}"))?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn send(&self, cmd: AudioCommand) -> Result<()> {
        let tx = self.ensure_thread()?;
        tx.send(cmd).map_err(|e| {
            error!("audio thread is gone: {e}");
            anyhow!("audio thread is gone")
        })
    }
}

fn open_sink() -> Result<(OutputStream, Sink)> {
    let (stream, handle) = OutputStream::try_default()
        .map_err(|e| anyhow!("Failed to create audio output stream: {e}"))?;
    let sink = Sink::try_new(&handle).map_err(|e| anyhow!("Failed to create audio sink: {e}"))?;
    Ok((stream, sink))
}

impl MediaPlayback for AudioEngineHandle {
    fn start(&self) -> Result<()> {
        self.send(AudioCommand::Start)
    }

    fn play(&self) -> Result<()> {
        self.send(AudioCommand::Play)
    }

    fn pause(&self) -> Result<()> {
        self.send(AudioCommand::Pause)
    }

    fn stop(&self) -> Result<()> {
        // Never spin up the thread just to stop it
        if let Ok(guard) = self.tx.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(AudioCommand::Stop);
            }
        }
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        self.send(AudioCommand::SetVolume(volume))
    }
}
