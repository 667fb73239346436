//! Finance records stored in the `finance_data` collection.

use super::id::RecordId;
use super::optional_date;
use super::record::{check_amount, check_id, check_not_blank, Record, RecordKind, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Cash,
    Bank,
    Investment,
    Property,
    Vehicle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiabilityType {
    CreditCard,
    Loan,
    Mortgage,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub value: f64,
    pub currency: String,
    #[serde(default)]
    pub notes: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liability {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub liability_type: LiabilityType,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub notes: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    pub id: RecordId,
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub currency: String,
    #[serde(
        default,
        with = "optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// One element of the `finance_data` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinanceRecord {
    Asset(Asset),
    Liability(Liability),
    Transaction(Transaction),
    Goal(FinancialGoal),
}

impl FinanceRecord {
    pub fn set_id(&mut self, id: RecordId) {
        match self {
            Self::Asset(asset) => asset.id = id,
            Self::Liability(liability) => liability.id = id,
            Self::Transaction(transaction) => transaction.id = id,
            Self::Goal(goal) => goal.id = id,
        }
    }
}

impl Record for FinanceRecord {
    fn record_id(&self) -> RecordId {
        match self {
            Self::Asset(asset) => asset.id,
            Self::Liability(liability) => liability.id,
            Self::Transaction(transaction) => transaction.id,
            Self::Goal(goal) => goal.id,
        }
    }

    fn kind(&self) -> RecordKind {
        match self {
            Self::Asset(_) => RecordKind::Asset,
            Self::Liability(_) => RecordKind::Liability,
            Self::Transaction(_) => RecordKind::Transaction,
            Self::Goal(_) => RecordKind::FinancialGoal,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_id(self.record_id())?;
        match self {
            Self::Asset(asset) => {
                check_not_blank("name", &asset.name)?;
                check_not_blank("currency", &asset.currency)?;
                check_amount("value", asset.value)
            }
            Self::Liability(liability) => {
                check_not_blank("name", &liability.name)?;
                check_not_blank("currency", &liability.currency)?;
                check_amount("amount", liability.amount)
            }
            Self::Transaction(transaction) => {
                check_not_blank("currency", &transaction.currency)?;
                check_amount("amount", transaction.amount)
            }
            Self::Goal(goal) => {
                check_not_blank("title", &goal.title)?;
                check_amount("targetAmount", goal.target_amount)?;
                check_amount("currentAmount", goal.current_amount)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liability_type_uses_snake_case_labels() {
        let record: FinanceRecord = serde_json::from_str(
            r#"{"kind":"liability","id":5,"name":"visa","type":"credit_card","amount":120.5,
                "currency":"USD","notes":"","date":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(matches!(
            record,
            FinanceRecord::Liability(Liability { liability_type: LiabilityType::CreditCard, .. })
        ));
        assert!(record.validate().is_ok());
    }

    #[test]
    fn set_id_rewrites_inner_record() {
        let mut record: FinanceRecord = serde_json::from_str(
            r#"{"kind":"transaction","id":0,"type":"expense","category":"food","amount":12,
                "currency":"EUR","description":"lunch","date":"2024-01-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.validate(), Err(ValidationError::InvalidId(0)));

        record.set_id(42);
        assert_eq!(record.record_id(), 42);
        assert_eq!(record.kind(), RecordKind::Transaction);
    }
}
