use serde::{Deserialize, Serialize};

/// Lifecycle of a tracked business. New records always start in `Planning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessStatus {
    Planning,
    Developing,
    Active,
    Paused,
    Closed,
}

impl std::fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusinessStatus::Planning => write!(f, "PLANNING"),
            BusinessStatus::Developing => write!(f, "DEVELOPING"),
            BusinessStatus::Active => write!(f, "ACTIVE"),
            BusinessStatus::Paused => write!(f, "PAUSED"),
            BusinessStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

impl std::str::FromStr for BusinessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLANNING" => Ok(BusinessStatus::Planning),
            "DEVELOPING" => Ok(BusinessStatus::Developing),
            "ACTIVE" => Ok(BusinessStatus::Active),
            "PAUSED" => Ok(BusinessStatus::Paused),
            "CLOSED" => Ok(BusinessStatus::Closed),
            _ => Err(format!("unknown business status: {s}")),
        }
    }
}

impl BusinessStatus {
    pub const ALL: [BusinessStatus; 5] = [
        BusinessStatus::Planning,
        BusinessStatus::Developing,
        BusinessStatus::Active,
        BusinessStatus::Paused,
        BusinessStatus::Closed,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Draft,
    Running,
    Paused,
    Finished,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "DRAFT"),
            CampaignStatus::Running => write!(f, "RUNNING"),
            CampaignStatus::Paused => write!(f, "PAUSED"),
            CampaignStatus::Finished => write!(f, "FINISHED"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(CampaignStatus::Draft),
            "RUNNING" => Ok(CampaignStatus::Running),
            "PAUSED" => Ok(CampaignStatus::Paused),
            "FINISHED" => Ok(CampaignStatus::Finished),
            _ => Err(format!("unknown campaign status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_roundtrip() {
        for status in BusinessStatus::ALL {
            let parsed = BusinessStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(BusinessStatus::from_str("active").unwrap(), BusinessStatus::Active);
        assert!(BusinessStatus::from_str("LAUNCHED").is_err());
    }
}
