use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use derive_more::Deref;
use uuid::Uuid;

use crate::{
    CreateError, DeleteError, ExerciseID, ReadError, UpdateError, ValidationError, WorkoutID,
};

#[allow(async_fn_in_trait)]
pub trait WorkoutExerciseService: Send + Sync + 'static {
    async fn get_workout_exercises(
        &self,
        workout_id: WorkoutID,
    ) -> Result<Vec<WorkoutExercise>, ReadError>;
    async fn add_exercise_to_workout(
        &self,
        workout_id: WorkoutID,
        exercise_id: ExerciseID,
    ) -> Result<WorkoutExercise, CreateError>;
    async fn modify_workout_exercise(
        &self,
        id: WorkoutExerciseID,
        sets: Vec<Set>,
    ) -> Result<WorkoutExercise, UpdateError>;
    async fn delete_workout_exercise(
        &self,
        id: WorkoutExerciseID,
    ) -> Result<WorkoutExerciseID, DeleteError>;
    async fn add_set(
        &self,
        id: WorkoutExerciseID,
        reps: Option<Reps>,
        weight: Option<Weight>,
    ) -> Result<WorkoutExercise, UpdateError>;
    async fn delete_set(&self, id: WorkoutExerciseID, set_id: SetID) -> Result<SetID, DeleteError>;

    /// Most recently recorded entry for the given exercise across all
    /// workouts. Only the newest entry is considered: if that entry is the
    /// one given as `excluding`, the result is `None`.
    async fn get_last_performance(
        &self,
        exercise_id: ExerciseID,
        excluding: WorkoutExerciseID,
    ) -> Result<Option<WorkoutExercise>, ReadError>;

    /// Newest entry per exercise, resolved with a single batched fetch. The
    /// exclusion rule of [`get_last_performance`](Self::get_last_performance)
    /// applies per exercise.
    async fn get_last_performances(
        &self,
        exercise_ids: &[ExerciseID],
        excluding: WorkoutExerciseID,
    ) -> Result<BTreeMap<ExerciseID, WorkoutExercise>, ReadError>;

    async fn validate_new_workout_exercise(
        &self,
        workout_id: WorkoutID,
        exercise_id: ExerciseID,
    ) -> Result<ExerciseID, ValidationError> {
        match self.get_workout_exercises(workout_id).await {
            Ok(workout_exercises) => {
                if workout_exercises
                    .iter()
                    .any(|workout_exercise| workout_exercise.exercise_id == exercise_id)
                {
                    Err(ValidationError::Conflict("exercise".to_string()))
                } else {
                    Ok(exercise_id)
                }
            }
            Err(err) => Err(ValidationError::Other(err.into())),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait WorkoutExerciseRepository: Send + Sync + 'static {
    async fn read_workout_exercises(
        &self,
        workout_id: WorkoutID,
    ) -> Result<Vec<WorkoutExercise>, ReadError>;
    async fn read_workout_exercises_by_workout_ids(
        &self,
        workout_ids: &[WorkoutID],
    ) -> Result<Vec<WorkoutExercise>, ReadError>;
    async fn read_workout_exercise(
        &self,
        id: WorkoutExerciseID,
    ) -> Result<WorkoutExercise, ReadError>;
    async fn read_last_workout_exercise(
        &self,
        exercise_id: ExerciseID,
    ) -> Result<Option<WorkoutExercise>, ReadError>;
    async fn read_last_workout_exercises(
        &self,
        exercise_ids: &[ExerciseID],
    ) -> Result<Vec<WorkoutExercise>, ReadError>;
    async fn create_workout_exercise(
        &self,
        workout_id: WorkoutID,
        exercise_id: ExerciseID,
        order: u32,
    ) -> Result<WorkoutExercise, CreateError>;
    async fn modify_workout_exercise(
        &self,
        id: WorkoutExerciseID,
        sets: Vec<Set>,
    ) -> Result<WorkoutExercise, UpdateError>;
    async fn delete_workout_exercise(
        &self,
        id: WorkoutExerciseID,
    ) -> Result<WorkoutExerciseID, DeleteError>;
}

/// Occurrence of an exercise within a workout, carrying the recorded sets.
///
/// `created` is the store-assigned creation timestamp. `order` positions the
/// entry within its workout; it is not guaranteed to be contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutExercise {
    pub id: WorkoutExerciseID,
    pub workout_id: WorkoutID,
    pub exercise_id: ExerciseID,
    pub order: u32,
    pub sets: Vec<Set>,
    pub created: DateTime<Utc>,
}

#[derive(Deref, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkoutExerciseID(Uuid);

impl WorkoutExerciseID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for WorkoutExerciseID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for WorkoutExerciseID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub id: SetID,
    pub reps: Option<Reps>,
    pub weight: Option<Weight>,
    pub order: u32,
}

#[derive(Deref, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SetID(Uuid);

impl SetID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for SetID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for SetID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Deref, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reps(u32);

impl Reps {
    pub fn new(reps: u32) -> Result<Self, RepsError> {
        if reps == 0 {
            return Err(RepsError);
        }

        Ok(Reps(reps))
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Reps must be a positive number")]
pub struct RepsError;

#[derive(Deref, Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Weight(f64);

impl Weight {
    pub fn new(weight: f64) -> Result<Self, WeightError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(WeightError);
        }

        Ok(Weight(weight))
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Weight must be a positive finite number")]
pub struct WeightError;

/// Next free position after the given ones, starting at 1. Gaps left by
/// deletions are not reused.
#[must_use]
pub fn next_order(orders: impl Iterator<Item = u32>) -> u32 {
    orders.max().map_or(1, |max| max + 1)
}
