//! Profile and onboarding data (single objects, not collections).

use super::record::{check_not_blank, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileData {
    pub name: String,
    pub age: u32,
    pub occupation: String,
    pub industry: String,
    pub income: f64,
    pub health_goals: Vec<String>,
    pub financial_goals: Vec<String>,
    pub personal_goals: Vec<String>,
    pub values: Vec<String>,
    pub five_year_vision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    pub hobbies: Vec<String>,
    pub skills: Vec<String>,
    pub achievements: Vec<String>,
}

/// Answers collected by the first-run form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingData {
    pub name: String,
    pub age: u32,
    pub occupation: String,
}

impl OnboardingData {
    /// Only the name is mandatory.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_not_blank("name", &self.name)
    }
}
