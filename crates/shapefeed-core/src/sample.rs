//! Samples, their value range, and their wire encoding.

use rand::distr::{Distribution, Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};

/// One reading for the three shape channels.
///
/// Field order is the serialization order: `cube`, `sphere`, `cylinder`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Value for the cube channel.
    pub cube: f64,
    /// Value for the sphere channel.
    pub sphere: f64,
    /// Value for the cylinder channel.
    pub cylinder: f64,
}

impl Sample {
    /// The channel values in serialization order.
    pub fn values(&self) -> [f64; 3] {
        [self.cube, self.sphere, self.cylinder]
    }

    /// Whether every channel is finite and inside `range`.
    pub fn is_within(&self, range: &SampleRange) -> bool {
        self.values().iter().all(|v| v.is_finite() && range.contains(*v))
    }
}

/// Half-open value range `[min, max)` for generated samples.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleRange {
    /// Inclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

impl SampleRange {
    /// `[0.0, 1.0)`, the default range.
    pub const CANONICAL: Self = Self { min: 0.0, max: 1.0 };

    /// `[0.2, 1.2)`, kept for clients tuned to the older feed.
    pub const LEGACY: Self = Self { min: 0.2, max: 1.2 };

    /// Build a validated range.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Both bounds must be finite and `min < max`.
    pub fn validate(&self) -> Result<()> {
        if self.min.is_finite() && self.max.is_finite() && self.min < self.max {
            Ok(())
        } else {
            Err(CoreError::InvalidRange {
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Whether `value` lies in `[min, max)`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }
}

impl Default for SampleRange {
    fn default() -> Self {
        Self::CANONICAL
    }
}

/// Draws samples uniformly from a fixed range.
///
/// The generator itself is immutable; callers supply the RNG so every session
/// can own its own instance.
#[derive(Clone, Debug)]
pub struct SampleGenerator {
    range: SampleRange,
    uniform: Uniform<f64>,
}

impl SampleGenerator {
    /// Create a generator over a validated range.
    pub fn new(range: SampleRange) -> Result<Self> {
        range.validate()?;
        let uniform = Uniform::new(range.min, range.max).map_err(|_| CoreError::InvalidRange {
            min: range.min,
            max: range.max,
        })?;
        Ok(Self { range, uniform })
    }

    /// The range values are drawn from.
    pub fn range(&self) -> SampleRange {
        self.range
    }

    /// Draw three independent values, each strictly below `range().max`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Sample {
        Sample {
            cube: self.uniform.sample(rng),
            sphere: self.uniform.sample(rng),
            cylinder: self.uniform.sample(rng),
        }
    }
}

impl PartialEq for SampleGenerator {
    fn eq(&self, other: &Self) -> bool {
        self.range == other.range
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        let SampleRange { min, max } = SampleRange::CANONICAL;
        Self {
            range: SampleRange::CANONICAL,
            uniform: Uniform::new(min, max).expect("valid range"),
        }
    }
}

/// How a sample is written to the socket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireFormat {
    /// `{"cube":0.1,"sphere":0.2,"cylinder":0.3}`
    #[default]
    Object,
    /// The object above serialized once more as a JSON string literal.
    /// Only for clients that parse the payload twice.
    EncodedString,
}

impl WireFormat {
    /// Encode `sample` as the text frame payload.
    pub fn encode(self, sample: &Sample) -> Result<String> {
        let object = serde_json::to_string(sample)?;
        match self {
            Self::Object => Ok(object),
            Self::EncodedString => Ok(serde_json::to_string(&object)?),
        }
    }

    /// Parse a payload produced by [`WireFormat::encode`].
    pub fn decode(self, payload: &str) -> Result<Sample> {
        match self {
            Self::Object => Ok(serde_json::from_str(payload)?),
            Self::EncodedString => {
                let inner: String = serde_json::from_str(payload)?;
                Ok(serde_json::from_str(&inner)?)
            }
        }
    }
}

impl std::str::FromStr for WireFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "object" => Ok(Self::Object),
            "encodedstring" | "encoded-string" => Ok(Self::EncodedString),
            _ => Err(CoreError::UnknownWireFormat(s.to_owned())),
        }
    }
}
