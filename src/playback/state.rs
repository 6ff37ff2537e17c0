use std::fmt;

use tracing::info;

use crate::error::{Error, Result};

/// Lifecycle of one playback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioState {
    Init,
    Loading,
    Loaded,
    Decoding,
    Decoded,
    Connected,
    /// Connected, waiting for an explicit user gesture before starting.
    UserStartPlay,
    Playing,
    Paused,
    /// The source ran out and looping is off.
    Ended,
    /// A fatal error stopped this attempt.
    Failed,
}

impl AudioState {
    pub fn label(self) -> &'static str {
        match self {
            AudioState::Init => "init",
            AudioState::Loading => "loading",
            AudioState::Loaded => "loaded",
            AudioState::Decoding => "decoding",
            AudioState::Decoded => "decoded",
            AudioState::Connected => "connected",
            AudioState::UserStartPlay => "userstartplay",
            AudioState::Playing => "playing",
            AudioState::Paused => "paused",
            AudioState::Ended => "ended",
            AudioState::Failed => "failed",
        }
    }

    /// States in which the engine is rendering the source.
    pub fn is_active(self) -> bool {
        matches!(self, AudioState::Playing | AudioState::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AudioState::Ended | AudioState::Failed)
    }
}

impl fmt::Display for AudioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Begin fetching the source.
    Load,
    Loaded,
    Decode,
    Decoded,
    /// The source is wired into the graph.
    Connect,
    /// Start after connecting; gated players wait for `Play`.
    Start,
    /// The user gesture that unlocks a gated player.
    Play,
    Toggle,
    /// The source ran out.
    Ended,
    Fail,
}

impl fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/*
  init ─▶ loading ─▶ loaded ─▶ decoding ─▶ decoded ─▶ connected
                        │                               ▲   │
                        └──────── (stream) ─────────────┘   │
                                                            ├─(gated)─▶ userstartplay ─play─▶ playing
                                                            └─────────────────────────────────▶ playing
  playing ⇄ paused                     (toggle)
  playing ─ended─▶ loading (loop) | ended
  any non-terminal ─fail─▶ failed
  ended | failed ─load─▶ loading       (a new attempt, never automatic)
*/

/// The playback state machine. Refused events leave the state untouched.
#[derive(Debug, Clone)]
pub struct PlaybackMachine {
    state: AudioState,
    gesture_gated: bool,
    loop_playback: bool,
    history: Vec<AudioState>,
}

impl PlaybackMachine {
    pub fn new(gesture_gated: bool, loop_playback: bool) -> Self {
        Self {
            state: AudioState::Init,
            gesture_gated,
            loop_playback,
            history: vec![AudioState::Init],
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    /// Every state entered so far, starting with `init`.
    pub fn history(&self) -> &[AudioState] {
        &self.history
    }

    pub fn is_gesture_gated(&self) -> bool {
        self.gesture_gated
    }

    pub fn loop_playback(&self) -> bool {
        self.loop_playback
    }

    pub fn set_loop_playback(&mut self, enabled: bool) {
        self.loop_playback = enabled;
    }

    fn next(&self, event: PlaybackEvent) -> Option<AudioState> {
        use AudioState as S;
        use PlaybackEvent as E;

        let next = match (self.state, event) {
            (S::Init | S::Ended | S::Failed, E::Load) => S::Loading,
            (S::Loading, E::Loaded) => S::Loaded,
            (S::Loaded, E::Decode) => S::Decoding,
            (S::Decoding, E::Decoded) => S::Decoded,
            (S::Loaded | S::Decoded, E::Connect) => S::Connected,
            (S::Connected, E::Start) if self.gesture_gated => S::UserStartPlay,
            (S::Connected, E::Start) => S::Playing,
            (S::UserStartPlay, E::Play) => S::Playing,
            (S::Playing, E::Toggle) => S::Paused,
            (S::Paused, E::Toggle) => S::Playing,
            (S::Playing | S::Paused, E::Ended) if self.loop_playback => S::Loading,
            (S::Playing | S::Paused, E::Ended) => S::Ended,
            (state, E::Fail) if !state.is_terminal() => S::Failed,
            _ => return None,
        };
        Some(next)
    }

    /// Apply `event`, returning the new state.
    pub fn apply(&mut self, event: PlaybackEvent) -> Result<AudioState> {
        let Some(next) = self.next(event) else {
            return Err(Error::InvalidTransition {
                from: self.state.to_string(),
                event: event.to_string(),
            });
        };
        info!(from = %self.state, to = %next, %event, "playback state");
        self.state = next;
        self.history.push(next);
        Ok(next)
    }
}
