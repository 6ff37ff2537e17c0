//! Where audio comes from: source parsing, byte loading and decoding.

mod decode;

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use tracing::debug;

use crate::error::{Error, Result};

pub use decode::{decode, DecodedAudio};

/// A playable source, parsed from the single source string the player takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A local audio file.
    File(PathBuf),
    /// The default input device, played live.
    Microphone,
}

impl SourceSpec {
    pub fn is_stream(&self) -> bool {
        matches!(self, SourceSpec::Microphone)
    }
}

impl FromStr for SourceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Config("empty source".into()));
        }
        if s.eq_ignore_ascii_case("mic") || s.eq_ignore_ascii_case("microphone") {
            return Ok(SourceSpec::Microphone);
        }
        if let Some(path) = s.strip_prefix("file://") {
            return Ok(SourceSpec::File(PathBuf::from(path)));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Err(Error::LoadFailure {
                location: s.to_owned(),
                reason: "remote sources are not supported".into(),
            });
        }
        Ok(SourceSpec::File(PathBuf::from(s)))
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::File(path) => write!(f, "{}", path.display()),
            SourceSpec::Microphone => f.write_str("mic"),
        }
    }
}

/// Read the whole file into memory.
pub fn load(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).map_err(|err| Error::LoadFailure {
        location: path.display().to_string(),
        reason: err.to_string(),
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "source loaded");
    Ok(bytes)
}
