use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How missing price cells are handled before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    ForwardFill,
    BackwardFill,
    /// Linear interpolation weighted by the distance in days.
    Interpolate,
    Drop,
}

impl FillPolicy {
    pub const ALL: [FillPolicy; 4] = [
        FillPolicy::ForwardFill,
        FillPolicy::BackwardFill,
        FillPolicy::Interpolate,
        FillPolicy::Drop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FillPolicy::ForwardFill => "forward_fill",
            FillPolicy::BackwardFill => "backward_fill",
            FillPolicy::Interpolate => "interpolate",
            FillPolicy::Drop => "drop",
        }
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FillPolicy::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::UnknownFillPolicy(s.to_string()))
    }
}

/// Sampling frequency of a loaded price table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    #[default]
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "W")]
    Weekly,
    #[serde(rename = "M")]
    Monthly,
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" | "daily" => Ok(Frequency::Daily),
            "W" | "weekly" => Ok(Frequency::Weekly),
            "M" | "monthly" => Ok(Frequency::Monthly),
            other => Err(CoreError::UnknownFrequency(other.to_string())),
        }
    }
}

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DataSource {
    File(PathBuf),
    /// Generated in-process because no candidate file existed.
    Synthetic,
}

impl DataSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Synthetic => f.write_str("synthetic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_policy_round_trips_through_its_name() {
        for policy in FillPolicy::ALL {
            assert_eq!(policy.as_str().parse::<FillPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn unknown_fill_policy_is_rejected() {
        let err = "mean".parse::<FillPolicy>().unwrap_err();
        assert_eq!(err, CoreError::UnknownFillPolicy("mean".into()));
        assert!(err.to_string().contains("forward_fill"));
    }

    #[test]
    fn frequency_accepts_short_codes() {
        assert_eq!("W".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert_eq!("monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!("Q".parse::<Frequency>().is_err());
    }
}
