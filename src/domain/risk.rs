use serde::{Deserialize, Serialize};

/// WHO ART coverage target, in percent
pub const WHO_TARGET_COVERAGE: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Critical,
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    pub fn from_coverage(coverage: f64) -> Self {
        if coverage < 30.0 {
            RiskLevel::Critical
        } else if coverage < 50.0 {
            RiskLevel::High
        } else if coverage < WHO_TARGET_COVERAGE {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Critical Risk",
            RiskLevel::High => "High Risk",
            RiskLevel::Moderate => "Moderate Risk",
            RiskLevel::Low => "Low Risk",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Immediate intervention required",
            RiskLevel::High => "Needs urgent improvement",
            RiskLevel::Moderate => "Recommended improvements",
            RiskLevel::Low => "Meeting WHO targets",
        }
    }
}

/// Interpretation of a coverage prediction for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub coverage: f64,
    /// Coverage rounded to one decimal, e.g. `84.5%`
    pub display: String,
    pub level: RiskLevel,
    pub label: String,
    pub action: String,
    pub meets_who_target: bool,
}

impl RiskAssessment {
    pub fn from_coverage(coverage: f64) -> Self {
        let level = RiskLevel::from_coverage(coverage);
        Self {
            coverage,
            display: format!("{:.1}%", coverage),
            level,
            label: level.label().to_string(),
            action: level.action().to_string(),
            meets_who_target: coverage >= WHO_TARGET_COVERAGE,
        }
    }
}
