use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Dei,
    Ahs,
    Ubs,
    Srs,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Dei, Metric::Ahs, Metric::Ubs, Metric::Srs];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Dei => "dei",
            Self::Ahs => "ahs",
            Self::Ubs => "ubs",
            Self::Srs => "srs",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Self::Dei => "Digital Equity Index",
            Self::Ahs => "Access Health Score",
            Self::Ubs => "Update Load Score",
            Self::Srs => "Stability Score",
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Dei => "DEI",
            Self::Ahs => "Access",
            Self::Ubs => "Update Load",
            Self::Srs => "Stability",
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            Self::Dei => {
                "Overall score measuring digital service equity. Combines access, \
                 responsiveness, inclusion, stability, and visibility. Higher is better."
            }
            Self::Ahs => {
                "Measures how easily citizens can access enrollment services. Low scores \
                 indicate strained infrastructure. Higher is better."
            }
            Self::Ubs => {
                "Measures burden of update requests on the system. High scores indicate \
                 heavy biometric update activity. Lower is better."
            }
            Self::Srs => {
                "Measures consistency of service delivery. High scores indicate \
                 unpredictable activity or downtime. Lower is better."
            }
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Dei | Self::Ahs => Direction::HigherIsBetter,
            Self::Ubs | Self::Srs => Direction::LowerIsBetter,
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_label())
    }
}

#[derive(Debug, Error)]
#[error("unknown metric: {0}")]
pub struct MetricParseError(pub String);

impl FromStr for Metric {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "dei" => Ok(Self::Dei),
            // "ass" is the pre-rename header of the same column
            "ahs" | "ass" | "access" => Ok(Self::Ahs),
            "ubs" | "update_load" => Ok(Self::Ubs),
            "srs" | "stability" => Ok(Self::Srs),
            _ => Err(MetricParseError(s.to_string())),
        }
    }
}

/// One row of the master dataset. Scores are precomputed upstream and land
/// here already normalized to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistrictRecord {
    pub state: String,
    pub district: String,
    pub dei: f64,
    pub ahs: f64,
    pub ubs: f64,
    pub srs: f64,
}

impl DistrictRecord {
    pub fn score(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Dei => self.dei,
            Metric::Ahs => self.ahs,
            Metric::Ubs => self.ubs,
            Metric::Srs => self.srs,
        }
    }

    pub fn display_name(&self) -> String {
        title_case(&self.district)
    }
}

/// Title-case a name the way the source dataset stores districts lowercased.
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BadgeLabel {
    Excellent,
    Good,
    NeedsAttention,
    Critical,
}

impl Display for BadgeLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsAttention => "Needs Attention",
            Self::Critical => "Critical",
        };
        write!(f, "{display}")
    }
}

/// Plain display data; the presentation layer decides what to do with the
/// color and icon.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Badge {
    pub label: BadgeLabel,
    pub color: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Healthy,
    AccessStress,
    UpdateBurden,
    StabilityRisk,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Healthy,
        RiskCategory::AccessStress,
        RiskCategory::UpdateBurden,
        RiskCategory::StabilityRisk,
    ];
}

impl Display for RiskCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Healthy => "Healthy",
            Self::AccessStress => "Access Stress",
            Self::UpdateBurden => "Update Burden",
            Self::StabilityRisk => "Stability Risk",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Critical,
    AccessStress,
    UpdateBurden,
    StabilityRisk,
    Healthy,
}

impl IssueType {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::AccessStress => "access_stress",
            Self::UpdateBurden => "update_burden",
            Self::StabilityRisk => "stability_risk",
            Self::Healthy => "healthy",
        }
    }
}

impl Display for IssueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    Critical,
    Warning,
    Good,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Recommendation {
    pub level: RecommendationLevel,
    pub title: &'static str,
    pub message: &'static str,
    pub action: &'static str,
}

/// Rollup grading for state and national mean DEI. Uses coarser breakpoints
/// than per-metric badges; the two scales are separate product rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeiCategory {
    Good,
    Warning,
    Critical,
}

impl Display for DeiCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Good => "Good",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Intervention {
    pub dominant_risk: &'static str,
    pub action: &'static str,
}
