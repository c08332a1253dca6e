use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// External systems a connection can pull metrics from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Figma,
    Jira,
    GoogleAnalytics,
    AzureAnalytics,
    PowerBi,
    Csv,
}

impl SourceType {
    pub const ALL: [SourceType; 6] = [
        SourceType::Figma,
        SourceType::Jira,
        SourceType::GoogleAnalytics,
        SourceType::AzureAnalytics,
        SourceType::PowerBi,
        SourceType::Csv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Figma => "figma",
            SourceType::Jira => "jira",
            SourceType::GoogleAnalytics => "google_analytics",
            SourceType::AzureAnalytics => "azure_analytics",
            SourceType::PowerBi => "power_bi",
            SourceType::Csv => "csv",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "figma" => Ok(SourceType::Figma),
            "jira" => Ok(SourceType::Jira),
            "google_analytics" => Ok(SourceType::GoogleAnalytics),
            "azure_analytics" => Ok(SourceType::AzureAnalytics),
            "power_bi" => Ok(SourceType::PowerBi),
            "csv" => Ok(SourceType::Csv),
            other => Err(Error::UnsupportedSourceType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for source in SourceType::ALL {
            assert_eq!(source.as_str().parse::<SourceType>().unwrap(), source);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "sketch".parse::<SourceType>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedSourceType(tag) if tag == "sketch"));
    }

    #[test]
    fn serde_tags_match_wire_format() {
        let json = serde_json::to_string(&SourceType::GoogleAnalytics).unwrap();
        assert_eq!(json, "\"google_analytics\"");

        let parsed: SourceType = serde_json::from_str("\"power_bi\"").unwrap();
        assert_eq!(parsed, SourceType::PowerBi);
    }
}
