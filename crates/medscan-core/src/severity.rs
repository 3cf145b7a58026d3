//! Severity tiers derived from the top classification confidence.
//!
//! There is exactly one threshold table in the workspace. Both the scan
//! result and anything else that needs a tier from a confidence go through
//! [`SeverityThresholds`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse risk tier attached to a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Normal,
    Moderate,
    High,
}

const DISCLAIMER: &str = "This is an AI analysis using CNN — not a medical diagnosis";

const HIGH_RECOMMENDATIONS: [&str; 4] = [
    "High confidence classification detected — consult a specialist",
    "Schedule a follow-up examination within 1 week",
    "Monitor for any changes in the affected area",
    DISCLAIMER,
];

const MODERATE_RECOMMENDATIONS: [&str; 4] = [
    "Moderate confidence — further evaluation recommended",
    "Consult your doctor for professional assessment",
    "Consider retaking the scan with better image quality",
    DISCLAIMER,
];

const NORMAL_RECOMMENDATIONS: [&str; 4] = [
    "Low confidence classification — results may vary",
    "Try uploading a clearer or higher resolution image",
    "Consult a healthcare professional for accurate diagnosis",
    DISCLAIMER,
];

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Human-facing badge text.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
        }
    }

    /// Static recommendation lines for this tier. The last line is always the
    /// CNN disclaimer.
    pub fn recommendations(&self) -> &'static [&'static str; 4] {
        match self {
            Self::Normal => &NORMAL_RECOMMENDATIONS,
            Self::Moderate => &MODERATE_RECOMMENDATIONS,
            Self::High => &HIGH_RECOMMENDATIONS,
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            other => Err(format!("unknown severity tier: {other}")),
        }
    }
}

/// Strict lower bounds (exclusive) for each tier above `normal`.
///
/// A confidence must be strictly greater than `high_above` to be `high`, and
/// strictly greater than `moderate_above` to be `moderate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub high_above: u8,
    pub moderate_above: u8,
}

impl SeverityThresholds {
    pub const DEFAULT: Self = Self {
        high_above: 80,
        moderate_above: 50,
    };

    pub fn tier(&self, confidence: u8) -> SeverityTier {
        if confidence > self.high_above {
            SeverityTier::High
        } else if confidence > self.moderate_above {
            SeverityTier::Moderate
        } else {
            SeverityTier::Normal
        }
    }
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}
