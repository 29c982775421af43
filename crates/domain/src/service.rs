use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use futures_util::{StreamExt, TryStreamExt, stream};
use log::{debug, error};
use uuid::Uuid;

use crate::{
    CreateError, DeleteError, Exercise, ExerciseID, ExerciseRepository, ExerciseService,
    MuscleGroup, Name, PopulatedWorkout, ReadError, Reps, Set, SetID, UpdateError, Weight, Workout,
    WorkoutExercise, WorkoutExerciseID, WorkoutExerciseRepository, WorkoutExerciseService,
    WorkoutID, WorkoutRepository, WorkoutService, next_order, populate_workout, populate_workouts,
};

const MAX_CONCURRENT_DELETES: usize = 8;

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R>
where
    R: WorkoutRepository + WorkoutExerciseRepository + ExerciseRepository,
{
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(
                    crate::StorageError::NoConnection | crate::StorageError::Timeout,
                ) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R: ExerciseRepository> Service<R> {
    async fn exercises_by_id(
        &self,
        workout_exercises: &[WorkoutExercise],
    ) -> Result<BTreeMap<ExerciseID, Exercise>, ReadError> {
        let exercise_ids = workout_exercises
            .iter()
            .map(|workout_exercise| workout_exercise.exercise_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let exercises = log_on_error!(
            self.repository.read_exercises_by_ids(&exercise_ids),
            ReadError,
            "get",
            "exercises"
        )?;

        Ok(exercises
            .into_iter()
            .map(|exercise| (exercise.id, exercise))
            .collect())
    }
}

impl<R: ExerciseRepository> ExerciseService for Service<R> {
    async fn get_exercises(&self) -> Result<Vec<Exercise>, ReadError> {
        log_on_error!(
            self.repository.read_exercises(),
            ReadError,
            "get",
            "exercises"
        )
    }

    async fn get_exercises_by_muscle_group(
        &self,
        muscle_group: MuscleGroup,
    ) -> Result<Vec<Exercise>, ReadError> {
        log_on_error!(
            self.repository.read_exercises_by_muscle_group(muscle_group),
            ReadError,
            "get",
            "exercises"
        )
    }
}

impl<R> WorkoutService for Service<R>
where
    R: WorkoutRepository + WorkoutExerciseRepository + ExerciseRepository,
{
    async fn get_workouts(&self) -> Result<Vec<Workout>, ReadError> {
        log_on_error!(self.repository.read_workouts(), ReadError, "get", "workouts")
    }

    async fn get_populated_workouts(&self) -> Result<Vec<PopulatedWorkout>, ReadError> {
        let workouts =
            log_on_error!(self.repository.read_workouts(), ReadError, "get", "workouts")?;

        if workouts.is_empty() {
            return Ok(vec![]);
        }

        let workout_ids = workouts
            .iter()
            .map(|workout| workout.id)
            .collect::<Vec<_>>();
        let workout_exercises = log_on_error!(
            self.repository
                .read_workout_exercises_by_workout_ids(&workout_ids),
            ReadError,
            "get",
            "workout exercises"
        )?;
        let exercises = self.exercises_by_id(&workout_exercises).await?;

        Ok(populate_workouts(workouts, workout_exercises, &exercises))
    }

    async fn get_populated_workout(&self, id: WorkoutID) -> Result<PopulatedWorkout, ReadError> {
        let workout = log_on_error!(self.repository.read_workout(id), ReadError, "get", "workout")?;
        let workout_exercises = log_on_error!(
            self.repository.read_workout_exercises(id),
            ReadError,
            "get",
            "workout exercises"
        )?;
        let exercises = self.exercises_by_id(&workout_exercises).await?;

        Ok(populate_workout(workout, workout_exercises, &exercises))
    }

    async fn create_workout(
        &self,
        name: Name,
        date: DateTime<Utc>,
    ) -> Result<Workout, CreateError> {
        self.validate_workout_date(date)
            .map_err(|err| CreateError::Other(err.into()))?;

        log_on_error!(
            self.repository.create_workout(name, date),
            CreateError,
            "create",
            "workout"
        )
    }

    async fn delete_workout(&self, id: WorkoutID) -> Result<WorkoutID, DeleteError> {
        let workout_exercises = log_on_error!(
            self.repository.read_workout_exercises(id),
            ReadError,
            "get",
            "workout exercises"
        )?;

        log_on_error!(
            stream::iter(workout_exercises)
                .map(Ok::<_, DeleteError>)
                .try_for_each_concurrent(Some(MAX_CONCURRENT_DELETES), |workout_exercise| {
                    async move {
                        self.repository
                            .delete_workout_exercise(workout_exercise.id)
                            .await
                            .map(|_| ())
                    }
                }),
            DeleteError,
            "delete",
            "workout exercises"
        )?;

        log_on_error!(
            self.repository.delete_workout(id),
            DeleteError,
            "delete",
            "workout"
        )
    }
}

impl<R: WorkoutExerciseRepository> WorkoutExerciseService for Service<R> {
    async fn get_workout_exercises(
        &self,
        workout_id: WorkoutID,
    ) -> Result<Vec<WorkoutExercise>, ReadError> {
        let mut workout_exercises = log_on_error!(
            self.repository.read_workout_exercises(workout_id),
            ReadError,
            "get",
            "workout exercises"
        )?;

        workout_exercises.sort_by_key(|workout_exercise| workout_exercise.order);
        for workout_exercise in &mut workout_exercises {
            workout_exercise.sets.sort_by_key(|set| set.order);
        }

        Ok(workout_exercises)
    }

    async fn add_exercise_to_workout(
        &self,
        workout_id: WorkoutID,
        exercise_id: ExerciseID,
    ) -> Result<WorkoutExercise, CreateError> {
        let workout_exercises = log_on_error!(
            self.repository.read_workout_exercises(workout_id),
            ReadError,
            "get",
            "workout exercises"
        )?;

        if workout_exercises
            .iter()
            .any(|workout_exercise| workout_exercise.exercise_id == exercise_id)
        {
            return Err(CreateError::Conflict);
        }

        let order = next_order(
            workout_exercises
                .iter()
                .map(|workout_exercise| workout_exercise.order),
        );

        log_on_error!(
            self.repository
                .create_workout_exercise(workout_id, exercise_id, order),
            CreateError,
            "create",
            "workout exercise"
        )
    }

    async fn modify_workout_exercise(
        &self,
        id: WorkoutExerciseID,
        sets: Vec<Set>,
    ) -> Result<WorkoutExercise, UpdateError> {
        log_on_error!(
            self.repository.modify_workout_exercise(id, sets),
            UpdateError,
            "modify",
            "workout exercise"
        )
    }

    async fn delete_workout_exercise(
        &self,
        id: WorkoutExerciseID,
    ) -> Result<WorkoutExerciseID, DeleteError> {
        log_on_error!(
            self.repository.delete_workout_exercise(id),
            DeleteError,
            "delete",
            "workout exercise"
        )
    }

    async fn add_set(
        &self,
        id: WorkoutExerciseID,
        reps: Option<Reps>,
        weight: Option<Weight>,
    ) -> Result<WorkoutExercise, UpdateError> {
        let workout_exercise = log_on_error!(
            self.repository.read_workout_exercise(id),
            ReadError,
            "get",
            "workout exercise"
        )?;

        let mut sets = workout_exercise.sets;
        let order = next_order(sets.iter().map(|set| set.order));
        sets.push(Set {
            id: SetID::from(Uuid::new_v4()),
            reps,
            weight,
            order,
        });

        log_on_error!(
            self.repository.modify_workout_exercise(id, sets),
            UpdateError,
            "modify",
            "workout exercise"
        )
    }

    async fn delete_set(
        &self,
        id: WorkoutExerciseID,
        set_id: SetID,
    ) -> Result<SetID, DeleteError> {
        let workout_exercise = log_on_error!(
            self.repository.read_workout_exercise(id),
            ReadError,
            "get",
            "workout exercise"
        )?;

        let mut sets = workout_exercise.sets;
        let len = sets.len();
        sets.retain(|set| set.id != set_id);

        if sets.len() == len {
            return Err(DeleteError::NotFound);
        }

        log_on_error!(
            self.repository.modify_workout_exercise(id, sets),
            UpdateError,
            "modify",
            "workout exercise"
        )?;

        Ok(set_id)
    }

    async fn get_last_performance(
        &self,
        exercise_id: ExerciseID,
        excluding: WorkoutExerciseID,
    ) -> Result<Option<WorkoutExercise>, ReadError> {
        let newest = log_on_error!(
            self.repository.read_last_workout_exercise(exercise_id),
            ReadError,
            "get",
            "last performance"
        )?;

        Ok(newest.filter(|workout_exercise| workout_exercise.id != excluding))
    }

    async fn get_last_performances(
        &self,
        exercise_ids: &[ExerciseID],
        excluding: WorkoutExerciseID,
    ) -> Result<BTreeMap<ExerciseID, WorkoutExercise>, ReadError> {
        let candidates = log_on_error!(
            self.repository.read_last_workout_exercises(exercise_ids),
            ReadError,
            "get",
            "last performances"
        )?;

        let mut newest = BTreeMap::new();
        for workout_exercise in candidates {
            newest
                .entry(workout_exercise.exercise_id)
                .or_insert(workout_exercise);
        }
        newest.retain(|_, workout_exercise| workout_exercise.id != excluding);

        Ok(newest)
    }
}
