//! Well-known storage keys.

use std::fmt::{Display, Formatter};

/// Every key the journal reads or writes. Names are case-sensitive on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    JournalEntries,
    Goals,
    HealthData,
    FinanceData,
    ProfileData,
    OnboardingData,
    OnboardingCompleted,
}

impl StorageKey {
    pub const ALL: [StorageKey; 7] = [
        Self::JournalEntries,
        Self::Goals,
        Self::HealthData,
        Self::FinanceData,
        Self::ProfileData,
        Self::OnboardingData,
        Self::OnboardingCompleted,
    ];

    /// Keys holding record lists, counted in storage statistics.
    pub const COLLECTIONS: [StorageKey; 4] = [
        Self::JournalEntries,
        Self::Goals,
        Self::HealthData,
        Self::FinanceData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::JournalEntries => "journal_entries",
            Self::Goals => "goals",
            Self::HealthData => "health_data",
            Self::FinanceData => "finance_data",
            Self::ProfileData => "profile_data",
            Self::OnboardingData => "onboarding_data",
            Self::OnboardingCompleted => "onboardingCompleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    /// File name used by the desktop backend.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
