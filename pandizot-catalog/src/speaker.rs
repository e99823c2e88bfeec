use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Speaker layout a panel is cut for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeakerType {
    #[serde(rename = "4x20")]
    FourByTwenty,
    #[serde(rename = "4x16")]
    FourBySixteen,
    #[serde(rename = "4-oval")]
    FourOval,
}

impl SpeakerType {
    pub const ALL: [SpeakerType; 3] = [
        SpeakerType::FourByTwenty,
        SpeakerType::FourBySixteen,
        SpeakerType::FourOval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerType::FourByTwenty => "4x20",
            SpeakerType::FourBySixteen => "4x16",
            SpeakerType::FourOval => "4-oval",
        }
    }

    /// Multiplier a new rule gets when the admin leaves this type unspecified.
    pub fn default_multiplier(&self) -> f64 {
        match self {
            SpeakerType::FourByTwenty => 1.0,
            SpeakerType::FourBySixteen => 0.95,
            SpeakerType::FourOval => 1.1,
        }
    }
}

impl fmt::Display for SpeakerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown speaker type: {0}")]
pub struct UnknownSpeakerType(pub String);

impl FromStr for SpeakerType {
    type Err = UnknownSpeakerType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpeakerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownSpeakerType(s.to_string()))
    }
}
