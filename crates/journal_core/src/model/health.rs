//! Health tracking records stored in the `health_data` collection.
//!
//! Each element carries a `kind` tag so one collection can hold goals,
//! workouts, meals and metric snapshots.

use super::id::RecordId;
use super::optional_date;
use super::record::{check_amount, check_id, check_not_blank, Record, RecordKind, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGoalCategory {
    Weight,
    Fitness,
    Nutrition,
    Sleep,
    Mental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthGoal {
    pub id: RecordId,
    pub title: String,
    pub category: HealthGoalCategory,
    pub target: f64,
    pub current: f64,
    pub unit: String,
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

impl HealthGoal {
    /// `current / target` as a percentage, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (self.current / self.target * 100.0).min(100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: RecordId,
    /// Free label such as "running" or "yoga".
    #[serde(rename = "type")]
    pub workout_type: String,
    /// Minutes.
    pub duration: f64,
    pub calories: f64,
    #[serde(default)]
    pub notes: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub notes: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetricSnapshot {
    pub id: RecordId,
    pub weight: f64,
    pub body_fat: f64,
    pub muscle_mass: f64,
    pub water_intake: f64,
    pub sleep_hours: f64,
    pub stress_level: f64,
    pub date: DateTime<Utc>,
}

/// One element of the `health_data` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthRecord {
    Goal(HealthGoal),
    Workout(Workout),
    Meal(Meal),
    Metrics(HealthMetricSnapshot),
}

impl HealthRecord {
    /// Replaces the id; used when the session assigns a fresh one on insert.
    pub fn set_id(&mut self, id: RecordId) {
        match self {
            Self::Goal(goal) => goal.id = id,
            Self::Workout(workout) => workout.id = id,
            Self::Meal(meal) => meal.id = id,
            Self::Metrics(metrics) => metrics.id = id,
        }
    }
}

impl Record for HealthRecord {
    fn record_id(&self) -> RecordId {
        match self {
            Self::Goal(goal) => goal.id,
            Self::Workout(workout) => workout.id,
            Self::Meal(meal) => meal.id,
            Self::Metrics(metrics) => metrics.id,
        }
    }

    fn kind(&self) -> RecordKind {
        match self {
            Self::Goal(_) => RecordKind::HealthGoal,
            Self::Workout(_) => RecordKind::Workout,
            Self::Meal(_) => RecordKind::Meal,
            Self::Metrics(_) => RecordKind::HealthMetrics,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_id(self.record_id())?;
        match self {
            Self::Goal(goal) => {
                check_not_blank("title", &goal.title)?;
                check_amount("target", goal.target)?;
                check_amount("current", goal.current)
            }
            Self::Workout(workout) => {
                check_not_blank("type", &workout.workout_type)?;
                check_amount("duration", workout.duration)?;
                check_amount("calories", workout.calories)
            }
            Self::Meal(meal) => {
                check_not_blank("name", &meal.name)?;
                check_amount("calories", meal.calories)?;
                check_amount("protein", meal.protein)?;
                check_amount("carbs", meal.carbs)?;
                check_amount("fat", meal.fat)
            }
            Self::Metrics(metrics) => {
                check_amount("weight", metrics.weight)?;
                check_amount("bodyFat", metrics.body_fat)?;
                check_amount("muscleMass", metrics.muscle_mass)?;
                check_amount("waterIntake", metrics.water_intake)?;
                check_amount("sleepHours", metrics.sleep_hours)?;
                check_amount("stressLevel", metrics.stress_level)
            }
        }
    }
}
