//! Manually entered vitals: per-kind reference ranges, status, and trend.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalKind {
    HeartRate,
    BloodPressure,
    BloodSugar,
    Temperature,
    Oxygen,
    Weight,
    Sleep,
    Medication,
}

/// Inclusive normal band for a numeric vital.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

const BP_SYSTOLIC_HIGH: f64 = 140.0;
const BP_SYSTOLIC_LOW: f64 = 90.0;
const BP_DIASTOLIC_HIGH: f64 = 90.0;
const BP_DIASTOLIC_LOW: f64 = 60.0;

impl VitalKind {
    pub const ALL: [VitalKind; 8] = [
        Self::HeartRate,
        Self::BloodPressure,
        Self::BloodSugar,
        Self::Temperature,
        Self::Oxygen,
        Self::Weight,
        Self::Sleep,
        Self::Medication,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::HeartRate => "heart-rate",
            Self::BloodPressure => "blood-pressure",
            Self::BloodSugar => "blood-sugar",
            Self::Temperature => "temperature",
            Self::Oxygen => "oxygen",
            Self::Weight => "weight",
            Self::Sleep => "sleep",
            Self::Medication => "medication",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::HeartRate => "Heart Rate",
            Self::BloodPressure => "Blood Pressure",
            Self::BloodSugar => "Blood Sugar",
            Self::Temperature => "Temperature",
            Self::Oxygen => "Oxygen Level",
            Self::Weight => "Weight",
            Self::Sleep => "Sleep",
            Self::Medication => "Medication",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::HeartRate => "bpm",
            Self::BloodPressure => "mmHg",
            Self::BloodSugar => "mg/dL",
            Self::Temperature => "°F",
            Self::Oxygen => "%",
            Self::Weight => "kg",
            Self::Sleep => "hrs",
            Self::Medication => "",
        }
    }

    /// Normal band for the primary value. `None` for text-only kinds.
    pub fn range(&self) -> Option<Range> {
        let (min, max) = match self {
            Self::HeartRate => (60.0, 100.0),
            Self::BloodPressure => (90.0, 120.0),
            Self::BloodSugar => (70.0, 140.0),
            Self::Temperature => (97.0, 99.0),
            Self::Oxygen => (95.0, 100.0),
            Self::Weight => (0.0, 999.0),
            Self::Sleep => (7.0, 9.0),
            Self::Medication => return None,
        };
        Some(Range { min, max })
    }

    /// Normal band for the secondary (diastolic) value.
    pub fn secondary_range(&self) -> Option<Range> {
        match self {
            Self::BloodPressure => Some(Range {
                min: 60.0,
                max: 80.0,
            }),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Medication)
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary_range().is_some()
    }
}

impl fmt::Display for VitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for VitalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.id() == needle)
            .ok_or_else(|| format!("unknown vital kind: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VitalStatus {
    Normal,
    High,
    Low,
    /// Text-only entries carry no status.
    Logged,
}

impl VitalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::High => "High",
            Self::Low => "Low",
            Self::Logged => "Logged",
        }
    }
}

/// Classify a reading against its kind's range.
///
/// Blood pressure uses clinical cut points (systolic 140/90, diastolic
/// 90/60) rather than its display range. A missing diastolic value never
/// triggers high or low on its own.
pub fn status(kind: VitalKind, value: f64, secondary: Option<f64>) -> VitalStatus {
    if kind == VitalKind::BloodPressure {
        let dia_high = secondary.is_some_and(|d| d > BP_DIASTOLIC_HIGH);
        let dia_low = secondary.is_some_and(|d| d < BP_DIASTOLIC_LOW);
        if value > BP_SYSTOLIC_HIGH || dia_high {
            return VitalStatus::High;
        }
        if value < BP_SYSTOLIC_LOW || dia_low {
            return VitalStatus::Low;
        }
        return VitalStatus::Normal;
    }

    let Some(range) = kind.range() else {
        return VitalStatus::Logged;
    };
    if value > range.max {
        VitalStatus::High
    } else if value < range.min {
        VitalStatus::Low
    } else {
        VitalStatus::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    pub id: u64,
    pub kind: VitalKind,
    /// Zero for text-only kinds.
    pub value: f64,
    pub secondary: Option<f64>,
    pub recorded_at: NaiveDateTime,
    /// Free text; for medication this is the entry itself.
    pub notes: String,
}

impl VitalReading {
    pub fn status(&self) -> VitalStatus {
        status(self.kind, self.value, self.secondary)
    }

    /// `120/80 mmHg`, `72 bpm`, or the note text for medication.
    pub fn display_value(&self) -> String {
        if self.kind.is_text() {
            return self.notes.clone();
        }
        let unit = self.kind.unit();
        match self.secondary {
            Some(s) => format!("{}/{} {unit}", self.value, s),
            None => format!("{} {unit}", self.value),
        }
    }
}

/// New entry as typed in by the user.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub kind: VitalKind,
    pub value: f64,
    pub secondary: Option<f64>,
    pub recorded_at: NaiveDateTime,
    pub notes: String,
}

/// In-memory reading log, newest first.
#[derive(Debug, Default)]
pub struct VitalLog {
    entries: Vec<VitalReading>,
    next_id: u64,
}

impl VitalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reading at the front of the log and return it.
    pub fn record(&mut self, reading: NewReading) -> &VitalReading {
        self.next_id += 1;
        let value = if reading.kind.is_text() {
            0.0
        } else {
            reading.value
        };
        let entry = VitalReading {
            id: self.next_id,
            kind: reading.kind,
            value,
            secondary: reading.secondary.filter(|_| reading.kind.has_secondary()),
            recorded_at: reading.recorded_at,
            notes: reading.notes,
        };
        debug!(id = entry.id, kind = %entry.kind, "vital reading recorded");
        self.entries.insert(0, entry);
        &self.entries[0]
    }

    pub fn latest(&self, kind: VitalKind) -> Option<&VitalReading> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Readings of one kind, newest first.
    pub fn of_kind(&self, kind: VitalKind) -> impl Iterator<Item = &VitalReading> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Direction of the two newest readings of `kind`.
    pub fn trend(&self, kind: VitalKind) -> Trend {
        let mut recent = self.of_kind(kind);
        let (Some(last), Some(prev)) = (recent.next(), recent.next()) else {
            return Trend::Stable;
        };
        if last.value > prev.value {
            Trend::Up
        } else if last.value < prev.value {
            Trend::Down
        } else {
            Trend::Stable
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VitalReading> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(kind: VitalKind, value: f64) -> NewReading {
        NewReading {
            kind,
            value,
            secondary: None,
            recorded_at: at(15, 8),
            notes: String::new(),
        }
    }

    #[test]
    fn heart_rate_status() {
        assert_eq!(status(VitalKind::HeartRate, 72.0, None), VitalStatus::Normal);
        assert_eq!(status(VitalKind::HeartRate, 100.0, None), VitalStatus::Normal);
        assert_eq!(status(VitalKind::HeartRate, 101.0, None), VitalStatus::High);
        assert_eq!(status(VitalKind::HeartRate, 59.0, None), VitalStatus::Low);
    }

    #[test]
    fn blood_pressure_uses_clinical_cut_points() {
        let bp = VitalKind::BloodPressure;
        assert_eq!(status(bp, 120.0, Some(80.0)), VitalStatus::Normal);
        // Above display max (120) but within clinical limits.
        assert_eq!(status(bp, 135.0, Some(85.0)), VitalStatus::Normal);
        assert_eq!(status(bp, 145.0, Some(92.0)), VitalStatus::High);
        assert_eq!(status(bp, 130.0, Some(91.0)), VitalStatus::High);
        assert_eq!(status(bp, 85.0, Some(70.0)), VitalStatus::Low);
        assert_eq!(status(bp, 110.0, Some(55.0)), VitalStatus::Low);
    }

    #[test]
    fn blood_pressure_without_diastolic() {
        let bp = VitalKind::BloodPressure;
        assert_eq!(status(bp, 120.0, None), VitalStatus::Normal);
        assert_eq!(status(bp, 150.0, None), VitalStatus::High);
    }

    #[test]
    fn medication_is_logged() {
        assert_eq!(status(VitalKind::Medication, 0.0, None), VitalStatus::Logged);
    }

    #[test]
    fn temperature_fractional() {
        assert_eq!(status(VitalKind::Temperature, 98.4, None), VitalStatus::Normal);
        assert_eq!(status(VitalKind::Temperature, 99.5, None), VitalStatus::High);
    }

    #[test]
    fn log_is_newest_first_with_increasing_ids() {
        let mut log = VitalLog::new();
        let first = log.record(reading(VitalKind::HeartRate, 88.0)).id;
        let second = log.record(reading(VitalKind::HeartRate, 72.0)).id;
        assert!(second > first);
        assert_eq!(log.latest(VitalKind::HeartRate).unwrap().value, 72.0);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn trend_compares_two_newest() {
        let mut log = VitalLog::new();
        assert_eq!(log.trend(VitalKind::HeartRate), Trend::Stable);

        log.record(reading(VitalKind::HeartRate, 88.0));
        assert_eq!(log.trend(VitalKind::HeartRate), Trend::Stable);

        log.record(reading(VitalKind::Oxygen, 98.0));
        log.record(reading(VitalKind::HeartRate, 72.0));
        assert_eq!(log.trend(VitalKind::HeartRate), Trend::Down);

        log.record(reading(VitalKind::HeartRate, 80.0));
        assert_eq!(log.trend(VitalKind::HeartRate), Trend::Up);

        log.record(reading(VitalKind::HeartRate, 80.0));
        assert_eq!(log.trend(VitalKind::HeartRate), Trend::Stable);
    }

    #[test]
    fn medication_value_is_zeroed() {
        let mut log = VitalLog::new();
        let entry = log.record(NewReading {
            kind: VitalKind::Medication,
            value: 12.0,
            secondary: Some(3.0),
            recorded_at: at(14, 20),
            notes: "Ibuprofen 200mg".into(),
        });
        assert_eq!(entry.value, 0.0);
        assert_eq!(entry.secondary, None);
        assert_eq!(entry.status(), VitalStatus::Logged);
        assert_eq!(entry.display_value(), "Ibuprofen 200mg");
    }

    #[test]
    fn display_value_formats() {
        let mut log = VitalLog::new();
        let bp = log.record(NewReading {
            secondary: Some(80.0),
            ..reading(VitalKind::BloodPressure, 120.0)
        });
        assert_eq!(bp.display_value(), "120/80 mmHg");
        let hr = log.record(reading(VitalKind::HeartRate, 72.0));
        assert_eq!(hr.display_value(), "72 bpm");
    }

    #[test]
    fn parse_kind() {
        assert_eq!("blood-sugar".parse::<VitalKind>(), Ok(VitalKind::BloodSugar));
        assert!("cholesterol".parse::<VitalKind>().is_err());
        for kind in VitalKind::ALL {
            assert_eq!(kind.id().parse::<VitalKind>(), Ok(kind));
        }
    }
}
