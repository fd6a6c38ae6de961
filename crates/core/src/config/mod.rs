use std::{fmt, path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{PulseWaveError, Result};

/// Straight (non-premultiplied) 8-bit RGBA color.
///
/// Serialized as a hex string, either `#RRGGBB` or `#AARRGGBB` with the alpha
/// channel first, which is the form color attributes take in layout markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Replaces the alpha channel with `alpha` scaled from `[0, 1]`. Values
    /// outside that range are clamped first.
    pub fn with_alpha(self, alpha: f64) -> Self {
        let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        Self {
            a: (alpha * 255.0).round() as u8,
            ..self
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02X}{:02X}{:02X}{:02X}",
                self.a, self.r, self.g, self.b
            )
        }
    }
}

impl FromStr for Rgba {
    type Err = PulseWaveError;

    fn from_str(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PulseWaveError::invalid(
                "color",
                format!("`{value}` is not a hex color"),
            ));
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        let parsed = match hex.len() {
            6 => (channel(0), channel(2), channel(4), Ok(255)),
            8 => (channel(2), channel(4), channel(6), channel(0)),
            _ => {
                return Err(PulseWaveError::invalid(
                    "color",
                    format!("`{value}` must be #RRGGBB or #AARRGGBB"),
                ))
            }
        };

        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Self { r, g, b, a }),
            _ => Err(PulseWaveError::invalid(
                "color",
                format!("`{value}` is not a hex color"),
            )),
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = PulseWaveError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_string()
    }
}

/// How many times a ring's cycle repeats after the first play.
///
/// `Times(0)` plays each ring once; `Times(n)` plays it `n + 1` times. In a
/// configuration document this is an integer, with `-1` or the string
/// `"infinite"` selecting [`RepeatCount::Infinite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RepeatRepr", into = "RepeatRepr")]
pub enum RepeatCount {
    #[default]
    Infinite,
    Times(u32),
}

impl RepeatCount {
    /// Total number of cycles played, or `None` when the animation never ends.
    pub fn total_cycles(self) -> Option<u64> {
        match self {
            Self::Infinite => None,
            Self::Times(n) => Some(u64::from(n) + 1),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RepeatRepr {
    Count(i64),
    Keyword(String),
}

impl TryFrom<RepeatRepr> for RepeatCount {
    type Error = PulseWaveError;

    fn try_from(value: RepeatRepr) -> Result<Self> {
        match value {
            RepeatRepr::Count(-1) => Ok(Self::Infinite),
            RepeatRepr::Count(n) => u32::try_from(n).map(Self::Times).map_err(|_| {
                PulseWaveError::invalid("repeat_count", format!("{n} is out of range"))
            }),
            RepeatRepr::Keyword(word) if word.eq_ignore_ascii_case("infinite") => {
                Ok(Self::Infinite)
            }
            RepeatRepr::Keyword(word) => Err(PulseWaveError::invalid(
                "repeat_count",
                format!("unknown keyword `{word}`"),
            )),
        }
    }
}

impl From<RepeatCount> for RepeatRepr {
    fn from(value: RepeatCount) -> Self {
        match value {
            RepeatCount::Infinite => Self::Keyword("infinite".to_string()),
            RepeatCount::Times(n) => Self::Count(i64::from(n)),
        }
    }
}

/// Upper bound on `ring_count`; rings are allocated eagerly.
pub const MAX_RING_COUNT: u32 = 1024;

/// Cycle length in a configuration document: whole milliseconds, or a
/// fractional number of milliseconds for sub-millisecond precision.
mod cycle_millis {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Whole(u64),
        Fractional(f64),
    }

    pub fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        if duration.subsec_nanos() % 1_000_000 == 0 {
            if let Ok(millis) = u64::try_from(duration.as_millis()) {
                return serializer.serialize_u64(millis);
            }
        }
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Duration, D::Error> {
        match Millis::deserialize(deserializer)? {
            Millis::Whole(millis) => Ok(Duration::from_millis(millis)),
            Millis::Fractional(millis) => {
                let nanos = (millis * 1_000_000.0).round();
                if nanos.is_finite() && (0.0..u64::MAX as f64).contains(&nanos) {
                    Ok(Duration::from_nanos(nanos as u64))
                } else {
                    Err(D::Error::custom(format!(
                        "cycle_duration_ms {millis} is out of range"
                    )))
                }
            }
        }
    }
}

/// Immutable configuration of a pulse wave.
///
/// Obtain one from [`WaveConfig::default`], [`WaveConfig::builder`] or a JSON
/// document via [`WaveConfig::from_json_str`]. Every constructor except
/// `default` validates before returning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveConfig {
    ring_count: u32,
    #[serde(rename = "cycle_duration_ms", with = "cycle_millis")]
    cycle_duration: Duration,
    repeat_count: RepeatCount,
    start_alpha: f64,
    end_alpha: f64,
    color: Rgba,
    max_ring_growth: u32,
    corner_radius: f64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            ring_count: 4,
            cycle_duration: Duration::from_millis(1000),
            repeat_count: RepeatCount::Infinite,
            start_alpha: 1.0,
            end_alpha: 0.0,
            color: Rgba::BLACK,
            max_ring_growth: 50,
            corner_radius: 50.0,
        }
    }
}

impl WaveConfig {
    pub fn builder() -> WaveConfigBuilder {
        WaveConfigBuilder::default()
    }

    /// Parses a configuration document. Missing fields take their defaults.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ring_count > MAX_RING_COUNT {
            return Err(PulseWaveError::invalid(
                "ring_count",
                format!("{} exceeds the limit of {MAX_RING_COUNT}", self.ring_count),
            ));
        }
        if self.cycle_duration.is_zero() {
            return Err(PulseWaveError::invalid(
                "cycle_duration_ms",
                "must be greater than zero",
            ));
        }
        if self.cycle_duration.as_nanos() < u128::from(self.ring_count) {
            return Err(PulseWaveError::invalid(
                "cycle_duration_ms",
                format!(
                    "{:?} is too short to stagger {} rings",
                    self.cycle_duration, self.ring_count
                ),
            ));
        }
        check_unit_interval("start_alpha", self.start_alpha)?;
        check_unit_interval("end_alpha", self.end_alpha)?;
        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 {
            return Err(PulseWaveError::invalid(
                "corner_radius",
                format!("{} must be finite and non-negative", self.corner_radius),
            ));
        }
        Ok(())
    }

    pub fn ring_count(&self) -> u32 {
        self.ring_count
    }

    pub fn cycle_duration(&self) -> Duration {
        self.cycle_duration
    }

    pub fn repeat_count(&self) -> RepeatCount {
        self.repeat_count
    }

    pub fn start_alpha(&self) -> f64 {
        self.start_alpha
    }

    pub fn end_alpha(&self) -> f64 {
        self.end_alpha
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn max_ring_growth(&self) -> u32 {
        self.max_ring_growth
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    /// Delay before ring `index` begins its first cycle: `index / ring_count`
    /// of a cycle, so the rings are evenly staggered.
    pub fn start_delay(&self, index: u32) -> Duration {
        if self.ring_count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.cycle_duration().as_nanos() * u128::from(index)
            / u128::from(self.ring_count);
        // Seconds always fit in a u64: the delay never exceeds the cycle.
        Duration::new(
            (nanos / 1_000_000_000) as u64,
            (nanos % 1_000_000_000) as u32,
        )
    }
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PulseWaveError::invalid(
            field,
            format!("{value} must lie in [0, 1]"),
        ))
    }
}

/// Fluent construction of a [`WaveConfig`]; unset fields keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct WaveConfigBuilder {
    config: WaveConfig,
}

impl WaveConfigBuilder {
    pub fn ring_count(mut self, ring_count: u32) -> Self {
        self.config.ring_count = ring_count;
        self
    }

    pub fn cycle_duration(mut self, duration: Duration) -> Self {
        self.config.cycle_duration = duration;
        self
    }

    pub fn repeat_count(mut self, repeat_count: RepeatCount) -> Self {
        self.config.repeat_count = repeat_count;
        self
    }

    pub fn start_alpha(mut self, alpha: f64) -> Self {
        self.config.start_alpha = alpha;
        self
    }

    pub fn end_alpha(mut self, alpha: f64) -> Self {
        self.config.end_alpha = alpha;
        self
    }

    pub fn color(mut self, color: Rgba) -> Self {
        self.config.color = color;
        self
    }

    pub fn max_ring_growth(mut self, growth: u32) -> Self {
        self.config.max_ring_growth = growth;
        self
    }

    pub fn corner_radius(mut self, radius: f64) -> Self {
        self.config.corner_radius = radius;
        self
    }

    pub fn build(self) -> Result<WaveConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
