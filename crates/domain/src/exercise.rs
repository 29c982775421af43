use std::fmt;

use derive_more::Deref;
use uuid::Uuid;

use crate::{Name, ReadError};

#[allow(async_fn_in_trait)]
pub trait ExerciseService: Send + Sync + 'static {
    async fn get_exercises(&self) -> Result<Vec<Exercise>, ReadError>;
    async fn get_exercises_by_muscle_group(
        &self,
        muscle_group: MuscleGroup,
    ) -> Result<Vec<Exercise>, ReadError>;
}

#[allow(async_fn_in_trait)]
pub trait ExerciseRepository: Send + Sync + 'static {
    async fn read_exercises(&self) -> Result<Vec<Exercise>, ReadError>;
    async fn read_exercises_by_muscle_group(
        &self,
        muscle_group: MuscleGroup,
    ) -> Result<Vec<Exercise>, ReadError>;
    async fn read_exercises_by_ids(&self, ids: &[ExerciseID]) -> Result<Vec<Exercise>, ReadError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub muscle_group: MuscleGroup,
}

#[derive(Deref, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(Uuid);

impl ExerciseID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ExerciseID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ExerciseID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Shoulders,
    Biceps,
    Triceps,
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MuscleGroup::Chest => "Chest",
                MuscleGroup::Back => "Back",
                MuscleGroup::Legs => "Legs",
                MuscleGroup::Shoulders => "Shoulders",
                MuscleGroup::Biceps => "Biceps",
                MuscleGroup::Triceps => "Triceps",
            }
        )
    }
}

impl TryFrom<&str> for MuscleGroup {
    type Error = MuscleGroupError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Chest" => Ok(MuscleGroup::Chest),
            "Back" => Ok(MuscleGroup::Back),
            "Legs" => Ok(MuscleGroup::Legs),
            "Shoulders" => Ok(MuscleGroup::Shoulders),
            "Biceps" => Ok(MuscleGroup::Biceps),
            "Triceps" => Ok(MuscleGroup::Triceps),
            _ => Err(MuscleGroupError(value.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown muscle group: {0}")]
pub struct MuscleGroupError(pub String);
