//! Scan categories offered to the user.
//!
//! The category is informational: it is recorded with the result and shown
//! in the UI, but the classifier is the same generic model for all of them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanType {
    SkinLesion,
    ChestXray,
    EyeDisease,
}

impl ScanType {
    pub const ALL: [ScanType; 3] = [Self::SkinLesion, Self::ChestXray, Self::EyeDisease];

    pub fn id(&self) -> &'static str {
        match self {
            Self::SkinLesion => "skin-lesion",
            Self::ChestXray => "chest-xray",
            Self::EyeDisease => "eye-disease",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SkinLesion => "Skin Lesion",
            Self::ChestXray => "Chest X-Ray",
            Self::EyeDisease => "Eye Disease",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SkinLesion => "Detect melanoma, carcinoma & other skin conditions",
            Self::ChestXray => "Pneumonia detection from chest radiographs",
            Self::EyeDisease => "Screen for retinopathy, glaucoma & cataracts",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.id() == needle)
            .ok_or_else(|| {
                let ids: Vec<&str> = Self::ALL.iter().map(|t| t.id()).collect();
                format!("unknown scan type '{s}', expected one of: {}", ids.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids() {
        assert_eq!("skin-lesion".parse::<ScanType>(), Ok(ScanType::SkinLesion));
        assert_eq!("Chest-Xray".parse::<ScanType>(), Ok(ScanType::ChestXray));
        assert_eq!(" eye-disease ".parse::<ScanType>(), Ok(ScanType::EyeDisease));
    }

    #[test]
    fn parse_unknown_lists_choices() {
        let err = "brain-mri".parse::<ScanType>().unwrap_err();
        assert!(err.contains("skin-lesion, chest-xray, eye-disease"));
    }

    #[test]
    fn serde_uses_ids() {
        for t in ScanType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.id()));
        }
    }
}
