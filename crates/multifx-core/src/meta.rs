//! Static effect metadata for remote discovery.
//!
//! Every effect type publishes one [`EffectMeta`] describing its display
//! names and the parameters it accepts. The frame loop never reads this;
//! it is consumed by the control plane (editors, SysEx metadata announcement,
//! the CLI `effects` listing).
//!
//! Parameters travel as normalized values in `[0, 1]` (or `0..=127` on the
//! wire). A [`NumberRange`] documents how an effect maps that normalized value
//! onto plain units, so a host can show "-20.0 dB" instead of "64".
//!
//! # Example
//!
//! ```rust
//! use multifx_core::{EffectMeta, NumberRange, ParamInfo, ParamKind, ParamUnit};
//!
//! const RANGE: NumberRange = NumberRange::new(-40.0, 0.0, 0.5);
//! const PARAMS: &[ParamInfo] = &[ParamInfo::number(0, "Threshold", "Threshold (dB)", RANGE)
//!     .with_unit(ParamUnit::Decibels)];
//! const META: EffectMeta = EffectMeta::new("Compressor", "CMP", "Dynamics compressor.", PARAMS);
//!
//! assert_eq!(META.param(0).map(|p| p.name), Some("Threshold"));
//! assert!((RANGE.denormalize(0.5) - -20.0).abs() < 1e-6);
//! ```

/// Channel layouts an effect can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// Single channel; stereo input is expected to be summed first.
    Mono,
    /// Genuine two-channel processing (independent or cross-coupled channels).
    Stereo,
    /// Works either way.
    MonoOrStereo,
}

impl ChannelMode {
    /// Short lowercase label used in listings.
    pub const fn label(self) -> &'static str {
        match self {
            ChannelMode::Mono => "mono",
            ChannelMode::Stereo => "stereo",
            ChannelMode::MonoOrStereo => "mono/stereo",
        }
    }
}

/// Display unit for a numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ParamUnit {
    /// Decibels.
    Decibels,
    /// Hertz.
    Hertz,
    /// Milliseconds.
    Milliseconds,
    /// Ratio (n:1).
    Ratio,
    /// Dimensionless.
    #[default]
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use multifx_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Ratio => ":1",
            ParamUnit::None => "",
        }
    }
}

/// Plain-unit range a normalized parameter maps onto (linear).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRange {
    /// Value at normalized 0.0.
    pub min: f32,
    /// Value at normalized 1.0.
    pub max: f32,
    /// Suggested encoder increment in plain units.
    pub step: f32,
}

impl NumberRange {
    /// Creates a range.
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Normalized `[0, 1]` to plain units. Input is clamped.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min)
    }

    /// Plain units to normalized `[0, 1]`. Degenerate ranges map to 0.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span.abs() < f32::EPSILON {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// One choice of an enumerated parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumOption {
    /// Wire value (0..=127).
    pub value: u8,
    /// Display label.
    pub name: &'static str,
}

/// Value kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Continuous number with a declared plain range.
    Number(NumberRange),
    /// Number without a declared range (the effect maps it internally).
    Free,
    /// Discrete choice.
    Enum(&'static [EnumOption]),
}

/// Describes a single parameter of an effect type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamInfo {
    /// Parameter id used by `set_param` and patch descriptors.
    pub id: u8,
    /// Display name.
    pub name: &'static str,
    /// One-line help text.
    pub description: &'static str,
    /// Value kind.
    pub kind: ParamKind,
    /// Display unit.
    pub unit: ParamUnit,
}

impl ParamInfo {
    /// Numeric parameter with a declared range.
    pub const fn number(
        id: u8,
        name: &'static str,
        description: &'static str,
        range: NumberRange,
    ) -> Self {
        Self {
            id,
            name,
            description,
            kind: ParamKind::Number(range),
            unit: ParamUnit::None,
        }
    }

    /// Numeric parameter whose mapping is internal to the effect.
    pub const fn free(id: u8, name: &'static str, description: &'static str) -> Self {
        Self {
            id,
            name,
            description,
            kind: ParamKind::Free,
            unit: ParamUnit::None,
        }
    }

    /// Enumerated parameter.
    pub const fn choice(
        id: u8,
        name: &'static str,
        description: &'static str,
        options: &'static [EnumOption],
    ) -> Self {
        Self {
            id,
            name,
            description,
            kind: ParamKind::Enum(options),
            unit: ParamUnit::None,
        }
    }

    /// Sets the display unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Declared range, if this is a ranged number.
    pub const fn range(&self) -> Option<NumberRange> {
        match self.kind {
            ParamKind::Number(range) => Some(range),
            _ => None,
        }
    }
}

/// Static description of an effect type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectMeta {
    /// Display name.
    pub name: &'static str,
    /// Short name for small displays.
    pub short_name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Parameters in id order.
    pub params: &'static [ParamInfo],
}

impl EffectMeta {
    /// Creates a metadata record.
    pub const fn new(
        name: &'static str,
        short_name: &'static str,
        description: &'static str,
        params: &'static [ParamInfo],
    ) -> Self {
        Self {
            name,
            short_name,
            description,
            params,
        }
    }

    /// Looks a parameter up by id.
    pub fn param(&self, id: u8) -> Option<&'static ParamInfo> {
        self.params.iter().find(|p| p.id == id)
    }

    /// Finds a parameter id by name (case-insensitive).
    pub fn find_param(&self, name: &str) -> Option<u8> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESH: NumberRange = NumberRange::new(-80.0, -20.0, 0.1);
    const PARAMS: &[ParamInfo] = &[
        ParamInfo::number(0, "Threshold", "Gate open level", THRESH).with_unit(ParamUnit::Decibels),
        ParamInfo::free(1, "Division", "Beat division index"),
    ];
    const META: EffectMeta = EffectMeta::new("Noise Gate", "GTE", "Cuts hum.", PARAMS);

    #[test]
    fn range_round_trip_is_clamped() {
        assert_eq!(THRESH.denormalize(0.0), -80.0);
        assert_eq!(THRESH.denormalize(1.0), -20.0);
        assert_eq!(THRESH.denormalize(2.0), -20.0);
        assert!((THRESH.normalize(-50.0) - 0.5).abs() < 1e-6);
        assert_eq!(THRESH.normalize(10.0), 1.0);
    }

    #[test]
    fn degenerate_range_normalizes_to_zero() {
        let r = NumberRange::new(1.0, 1.0, 0.1);
        assert_eq!(r.normalize(1.0), 0.0);
    }

    #[test]
    fn lookup_by_id_and_name() {
        assert_eq!(META.param(1).map(|p| p.name), Some("Division"));
        assert!(META.param(7).is_none());
        assert_eq!(META.find_param("threshold"), Some(0));
        assert_eq!(META.find_param("nope"), None);
        assert!(META.params[1].range().is_none());
        assert_eq!(META.params[0].unit.suffix(), " dB");
    }
}
