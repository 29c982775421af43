use chrono::{DateTime, Utc};
use liftlog_domain as domain;
use serde_json::Value;
use uuid::Uuid;

use crate::document::Document;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub name: String,
    pub date: DateTime<Utc>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub muscle_group: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    pub workout_id: Uuid,
    pub exercise_id: Uuid,
    pub order: u32,
    pub sets: Vec<Set>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    pub id: Uuid,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub order: u32,
}

fn record<T: serde::de::DeserializeOwned>(document: &Document) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(document.fields.clone()))
}

impl TryFrom<&Document> for domain::Workout {
    type Error = DocumentError;

    fn try_from(value: &Document) -> Result<Self, Self::Error> {
        let record: Workout = record(value)?;
        Ok(Self {
            id: Uuid::parse_str(&value.id)?.into(),
            name: domain::Name::new(&record.name)?,
            date: record.date,
        })
    }
}

impl TryFrom<&Document> for domain::Exercise {
    type Error = DocumentError;

    fn try_from(value: &Document) -> Result<Self, Self::Error> {
        let record: Exercise = record(value)?;
        Ok(Self {
            id: Uuid::parse_str(&value.id)?.into(),
            name: domain::Name::new(&record.name)?,
            muscle_group: domain::MuscleGroup::try_from(record.muscle_group.as_str())?,
        })
    }
}

impl TryFrom<&Document> for domain::WorkoutExercise {
    type Error = DocumentError;

    fn try_from(value: &Document) -> Result<Self, Self::Error> {
        let record: WorkoutExercise = record(value)?;
        Ok(Self {
            id: Uuid::parse_str(&value.id)?.into(),
            workout_id: record.workout_id.into(),
            exercise_id: record.exercise_id.into(),
            order: record.order,
            sets: record
                .sets
                .into_iter()
                .map(domain::Set::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            created: value.created,
        })
    }
}

impl TryFrom<Set> for domain::Set {
    type Error = DocumentError;

    fn try_from(value: Set) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            reps: value.reps.map(domain::Reps::new).transpose()?,
            weight: value.weight.map(domain::Weight::new).transpose()?,
            order: value.order,
        })
    }
}

impl From<&domain::Set> for Set {
    fn from(value: &domain::Set) -> Self {
        Self {
            id: *value.id,
            reps: value.reps.map(|reps| *reps),
            weight: value.weight.map(|weight| *weight),
            order: value.order,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("invalid id: {0}")]
    InvalidId(#[from] uuid::Error),
    #[error(transparent)]
    InvalidFields(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidName(#[from] domain::NameError),
    #[error(transparent)]
    InvalidMuscleGroup(#[from] domain::MuscleGroupError),
    #[error(transparent)]
    InvalidReps(#[from] domain::RepsError),
    #[error(transparent)]
    InvalidWeight(#[from] domain::WeightError),
}

impl From<DocumentError> for domain::ReadError {
    fn from(value: DocumentError) -> Self {
        domain::StorageError::InvalidDocument(Box::new(value)).into()
    }
}

impl From<DocumentError> for domain::CreateError {
    fn from(value: DocumentError) -> Self {
        domain::StorageError::InvalidDocument(Box::new(value)).into()
    }
}

impl From<DocumentError> for domain::UpdateError {
    fn from(value: DocumentError) -> Self {
        domain::StorageError::InvalidDocument(Box::new(value)).into()
    }
}
