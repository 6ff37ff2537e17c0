//! Error taxonomy shared by the pipeline, graph and media layers.
//!
//! Buffer overruns and underruns are not errors: they are counted in
//! [`CaptureStats`](crate::capture::CaptureStats) and never interrupt capture.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The audio engine (host, device or stream) could not be brought up.
    #[error("audio engine unavailable: {0}")]
    SourceUnavailable(String),

    /// Reading the source bytes failed.
    #[error("failed to load {location}: {reason}")]
    LoadFailure { location: String, reason: String },

    /// The loaded bytes are not decodable audio.
    #[error("failed to decode audio: {0}")]
    DecodeFailure(String),

    /// Unknown node, illegal direction or a refused engine route.
    #[error("graph wiring: {0}")]
    GraphWiring(String),

    /// An event arrived that the playback state machine does not accept.
    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Fatal errors halt the current playback attempt and are shown to the user.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SourceUnavailable(_) | Error::LoadFailure { .. } | Error::DecodeFailure(_)
        )
    }
}
