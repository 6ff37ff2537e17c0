//! User-adjustable parameters.
//!
//! The player shows one parameter at a time; arrow keys pick which one and
//! nudge its value. Values are integers in `0..=max_range` so the control
//! behaves like a knob, and each change maps to a [`ParamEffect`] in real
//! units that the app applies to the engine or the session.

use crate::config::PlayerConfig;

/// What a parameter controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamTarget {
    /// Master gain in percent.
    Gain,
    /// Analyser floor, in dB below zero.
    NoiseFloor,
    /// Analyser smoothing in percent.
    Smoothing,
    /// Oscilloscope trigger in hundredths of full scale.
    TriggerLevel,
    /// Compressor threshold, in dB below zero.
    EnvelopeThreshold,
}

impl ParamTarget {
    pub fn max_range(self) -> u32 {
        match self {
            ParamTarget::Gain => 200,
            ParamTarget::NoiseFloor => 150,
            ParamTarget::Smoothing => 100,
            ParamTarget::TriggerLevel => 100,
            ParamTarget::EnvelopeThreshold => 60,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamTarget::Gain => "gain",
            ParamTarget::NoiseFloor => "noise floor",
            ParamTarget::Smoothing => "smoothing",
            ParamTarget::TriggerLevel => "trigger",
            ParamTarget::EnvelopeThreshold => "threshold",
        }
    }

    /// Map a knob value onto its effect.
    pub fn effect(self, value: u32) -> ParamEffect {
        let v = value.min(self.max_range()) as f32;
        match self {
            ParamTarget::Gain => ParamEffect::Gain(v / 100.0),
            ParamTarget::NoiseFloor => ParamEffect::NoiseFloor(-v),
            ParamTarget::Smoothing => ParamEffect::Smoothing(v / 100.0),
            ParamTarget::TriggerLevel => ParamEffect::TriggerLevel(v / 100.0),
            ParamTarget::EnvelopeThreshold => ParamEffect::EnvelopeThreshold(-v),
        }
    }

    /// Inverse of [`effect`](Self::effect), rounded and clamped.
    pub fn value_for(self, amount: f32) -> u32 {
        let raw = match self {
            ParamTarget::Gain | ParamTarget::Smoothing | ParamTarget::TriggerLevel => {
                amount * 100.0
            }
            ParamTarget::NoiseFloor | ParamTarget::EnvelopeThreshold => -amount,
        };
        (raw.round().max(0.0) as u32).min(self.max_range())
    }
}

/// A parameter change in real units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEffect {
    /// Linear gain.
    Gain(f32),
    /// Analyser `min_decibels`.
    NoiseFloor(f32),
    /// Analyser smoothing constant in `[0, 1]`.
    Smoothing(f32),
    TriggerLevel(f32),
    /// Compressor threshold in dB.
    EnvelopeThreshold(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub target: ParamTarget,
    pub initial: u32,
    /// Lowest value the knob reaches. 0 unless a limit elsewhere makes the
    /// bottom of the range meaningless.
    pub min_value: u32,
    pub max_range: u32,
}

impl ParamDescriptor {
    pub fn new(target: ParamTarget, initial: u32) -> Self {
        let max_range = target.max_range();
        Self {
            name: target.label(),
            target,
            initial: initial.min(max_range),
            min_value: 0,
            max_range,
        }
    }

    /// Raise the bottom of the range to `min_value`.
    pub fn with_floor(mut self, min_value: u32) -> Self {
        self.min_value = min_value.min(self.max_range);
        self.initial = self.initial.max(self.min_value);
        self
    }

    fn clamp(&self, value: i64) -> u32 {
        value.clamp(self.min_value as i64, self.max_range as i64) as u32
    }
}

/// The player's parameters with their current values and the selection.
#[derive(Debug, Clone)]
pub struct ParamBank {
    params: Vec<ParamDescriptor>,
    values: Vec<u32>,
    selected: usize,
}

impl ParamBank {
    pub fn new(params: Vec<ParamDescriptor>) -> Self {
        let values = params.iter().map(|p| p.initial).collect();
        Self {
            params,
            values,
            selected: 0,
        }
    }

    /// One parameter per target, starting from the configured values.
    ///
    /// The noise floor stops 1 dB below `max_decibels`, the highest lower
    /// edge the analyser accepts.
    pub fn from_config(config: &PlayerConfig) -> Self {
        let at = |target: ParamTarget, amount: f32| {
            ParamDescriptor::new(target, target.value_for(amount))
        };
        let floor = (-config.max_decibels).floor() + 1.0;
        Self::new(vec![
            at(ParamTarget::Gain, config.gain),
            at(ParamTarget::NoiseFloor, config.min_decibels).with_floor(floor.max(0.0) as u32),
            at(ParamTarget::Smoothing, config.smoothing),
            at(ParamTarget::TriggerLevel, config.trigger_level),
            at(ParamTarget::EnvelopeThreshold, config.envelope_threshold),
        ])
    }

    pub fn selected(&self) -> Option<(&ParamDescriptor, u32)> {
        self.params
            .get(self.selected)
            .map(|p| (p, self.values[self.selected]))
    }

    pub fn next(&mut self) {
        if !self.params.is_empty() {
            self.selected = (self.selected + 1) % self.params.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.params.is_empty() {
            self.selected = (self.selected + self.params.len() - 1) % self.params.len();
        }
    }

    /// Nudge the selected parameter by `delta`, clamped to its range.
    pub fn adjust(&mut self, delta: i32) -> Option<ParamEffect> {
        let param = self.params.get(self.selected)?;
        let current = self.values[self.selected] as i64;
        let value = param.clamp(current + delta as i64);
        self.values[self.selected] = value;
        Some(param.target.effect(value))
    }

    /// Set a parameter directly by target.
    pub fn set(&mut self, target: ParamTarget, value: u32) -> Option<ParamEffect> {
        let idx = self.params.iter().position(|p| p.target == target)?;
        let value = self.params[idx].clamp(value as i64);
        self.values[idx] = value;
        Some(target.effect(value))
    }

    pub fn value(&self, target: ParamTarget) -> Option<u32> {
        let idx = self.params.iter().position(|p| p.target == target)?;
        Some(self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamDescriptor, u32)> {
        self.params.iter().zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::Analyser;

    #[test]
    fn effects_map_to_real_units() {
        assert_eq!(ParamTarget::Gain.effect(150), ParamEffect::Gain(1.5));
        assert_eq!(ParamTarget::NoiseFloor.effect(110), ParamEffect::NoiseFloor(-110.0));
        assert_eq!(ParamTarget::Smoothing.effect(30), ParamEffect::Smoothing(0.3));
        assert_eq!(ParamTarget::TriggerLevel.effect(500), ParamEffect::TriggerLevel(1.0));
        assert_eq!(
            ParamTarget::EnvelopeThreshold.effect(24),
            ParamEffect::EnvelopeThreshold(-24.0)
        );
    }

    #[test]
    fn bank_starts_from_config() {
        let bank = ParamBank::from_config(&PlayerConfig::default());
        assert_eq!(bank.value(ParamTarget::Gain), Some(100));
        assert_eq!(bank.value(ParamTarget::NoiseFloor), Some(110));
        assert_eq!(bank.value(ParamTarget::Smoothing), Some(30));
        assert_eq!(bank.value(ParamTarget::EnvelopeThreshold), Some(24));
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut bank = ParamBank::from_config(&PlayerConfig::default());
        bank.previous();
        assert_eq!(bank.selected().unwrap().0.target, ParamTarget::EnvelopeThreshold);
        bank.next();
        assert_eq!(bank.selected().unwrap().0.target, ParamTarget::Gain);
    }

    #[test]
    fn adjust_clamps_to_range() {
        let mut bank = ParamBank::from_config(&PlayerConfig::default());
        assert_eq!(bank.adjust(500), Some(ParamEffect::Gain(2.0)));
        assert_eq!(bank.adjust(-1000), Some(ParamEffect::Gain(0.0)));
        assert_eq!(
            bank.set(ParamTarget::TriggerLevel, 25),
            Some(ParamEffect::TriggerLevel(0.25))
        );
    }

    #[test]
    fn empty_bank_is_inert() {
        let mut bank = ParamBank::new(Vec::new());
        bank.next();
        bank.previous();
        assert!(bank.selected().is_none());
        assert!(bank.adjust(1).is_none());
    }

    #[test]
    fn noise_floor_stays_below_max_decibels() {
        let config = PlayerConfig::default();
        let mut bank = ParamBank::from_config(&config);
        bank.next();
        assert_eq!(bank.selected().unwrap().0.target, ParamTarget::NoiseFloor);

        assert_eq!(bank.adjust(-1_000), Some(ParamEffect::NoiseFloor(-11.0)));
        assert_eq!(bank.set(ParamTarget::NoiseFloor, 0), Some(ParamEffect::NoiseFloor(-11.0)));
        assert_eq!(bank.value(ParamTarget::NoiseFloor), Some(11));

        let mut analyser = Analyser::new(16, config.min_decibels, config.max_decibels, 0.3);
        analyser.set_min_decibels(-11.0);
        assert_eq!(analyser.min_decibels(), -11.0);
    }
}
