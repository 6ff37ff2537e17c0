//! Player configuration, read from TOML and overridden from the command line.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    buffer::ReadOrder,
    error::{Error, Result},
    graph::VisualizationMode,
    MAX_BLOCK_SIZE,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// File path, `file://` URL or `mic`.
    pub source: Option<String>,
    /// Frames per capture block.
    pub block_size: usize,
    /// Sample pool slots; at least 2.
    pub pool_size: usize,
    pub read_order: ReadOrder,
    pub fft_size: usize,
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub smoothing: f32,
    pub gain: f32,
    pub trigger_level: f32,
    /// Compressor threshold in dB.
    pub envelope_threshold: f32,
    pub envelope_window_seconds: f32,
    pub loop_playback: bool,
    /// Wait for an explicit play before starting.
    pub gesture_gated: bool,
    pub mode: VisualizationMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            source: None,
            block_size: crate::DEFAULT_BLOCK_SIZE,
            pool_size: 2,
            read_order: ReadOrder::Oldest,
            fft_size: 2048,
            min_decibels: -110.0,
            max_decibels: -10.0,
            smoothing: 0.3,
            gain: 1.0,
            trigger_level: 0.0,
            envelope_threshold: -24.0,
            envelope_window_seconds: 15.0,
            loop_playback: false,
            gesture_gated: false,
            mode: VisualizationMode::Spectrum,
        }
    }
}

impl PlayerConfig {
    /// Read and validate a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            Error::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml(&text)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size < 2 {
            return Err(Error::Config(format!(
                "pool_size must be at least 2, got {}",
                self.pool_size
            )));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::Config(format!(
                "block_size must be in 1..={MAX_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            return Err(Error::Config(format!(
                "fft_size must be a power of two >= 32, got {}",
                self.fft_size
            )));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(Error::Config(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(Error::Config(format!(
                "smoothing must be in [0, 1], got {}",
                self.smoothing
            )));
        }
        if !(self.envelope_window_seconds > 0.0) {
            return Err(Error::Config(
                "envelope_window_seconds must be positive".into(),
            ));
        }
        Ok(())
    }
}
