use tracing::{error, info};

use super::state::{AudioState, PlaybackEvent, PlaybackMachine};
use crate::{
    error::Result,
    media::{DecodedAudio, SourceSpec},
};

/// Output of the load stage.
#[derive(Debug)]
pub enum LoadedMedia {
    /// Encoded file contents, still to be decoded.
    Bytes(Vec<u8>),
    /// A live stream (microphone) that plays without decoding.
    Stream,
}

/// The side-effecting steps of bringing a source up, one per stage.
///
/// The player binary implements these against cpal and the engine; tests
/// inject outcomes directly.
pub trait PipelineStages {
    fn load(&mut self, source: &SourceSpec) -> Result<LoadedMedia>;

    fn decode(&mut self, bytes: Vec<u8>) -> Result<DecodedAudio>;

    /// Wire the source into the graph. `None` means a live stream.
    fn connect(&mut self, audio: Option<DecodedAudio>) -> Result<()>;

    /// Begin rendering the connected source.
    fn start(&mut self) -> Result<()>;

    fn set_paused(&mut self, paused: bool) -> Result<()>;
}

/// Drives a [`PlaybackMachine`] through the stages in order.
///
/// A stage error moves the machine to `failed`, is kept for display and is
/// returned; nothing is retried.
pub struct Pipeline<S> {
    stages: S,
    machine: PlaybackMachine,
    source: SourceSpec,
    last_error: Option<String>,
}

impl<S: PipelineStages> Pipeline<S> {
    pub fn new(stages: S, source: SourceSpec, gesture_gated: bool, loop_playback: bool) -> Self {
        Self {
            stages,
            machine: PlaybackMachine::new(gesture_gated, loop_playback),
            source,
            last_error: None,
        }
    }

    /// Load, decode, connect and start the source.
    pub fn run(&mut self) -> Result<AudioState> {
        self.machine.apply(PlaybackEvent::Load)?;
        self.last_error = None;
        self.bring_up()
    }

    /// The user gesture for a gated player.
    pub fn play(&mut self) -> Result<AudioState> {
        self.machine.apply(PlaybackEvent::Play)?;
        self.guard(|stages| stages.start())?;
        Ok(self.machine.state())
    }

    /// Play/pause.
    pub fn toggle(&mut self) -> Result<AudioState> {
        let state = self.machine.apply(PlaybackEvent::Toggle)?;
        self.guard(|stages| stages.set_paused(state == AudioState::Paused))?;
        Ok(state)
    }

    /// The source ran out. Restarts from loading when looping.
    pub fn ended(&mut self) -> Result<AudioState> {
        match self.machine.apply(PlaybackEvent::Ended)? {
            AudioState::Loading => {
                info!(source = %self.source, "looping");
                self.bring_up()
            }
            state => Ok(state),
        }
    }

    fn bring_up(&mut self) -> Result<AudioState> {
        let source = self.source.clone();
        let media = self.guard(|stages| stages.load(&source))?;
        self.machine.apply(PlaybackEvent::Loaded)?;

        let audio = match media {
            LoadedMedia::Bytes(bytes) => {
                self.machine.apply(PlaybackEvent::Decode)?;
                let audio = self.guard(|stages| stages.decode(bytes))?;
                self.machine.apply(PlaybackEvent::Decoded)?;
                Some(audio)
            }
            LoadedMedia::Stream => None,
        };

        self.guard(|stages| stages.connect(audio))?;
        self.machine.apply(PlaybackEvent::Connect)?;

        if self.machine.apply(PlaybackEvent::Start)? == AudioState::Playing {
            self.guard(|stages| stages.start())?;
        }
        Ok(self.machine.state())
    }

    /// Run one stage; on failure record the error and fail the machine.
    fn guard<T>(&mut self, stage: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        stage(&mut self.stages).inspect_err(|err| {
            error!(state = %self.machine.state(), "playback failed: {err}");
            self.last_error = Some(err.to_string());
            // Fail is accepted from every non-terminal state.
            let _ = self.machine.apply(PlaybackEvent::Fail);
        })
    }

    pub fn state(&self) -> AudioState {
        self.machine.state()
    }

    pub fn machine(&self) -> &PlaybackMachine {
        &self.machine
    }

    pub fn source(&self) -> &SourceSpec {
        &self.source
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn stages(&self) -> &S {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut S {
        &mut self.stages
    }
}
