use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use derive_more::Deref;
use uuid::Uuid;

use crate::{CreateError, DeleteError, Exercise, ExerciseID, Name, ReadError, WorkoutExercise};

#[allow(async_fn_in_trait)]
pub trait WorkoutService: Send + Sync + 'static {
    async fn get_workouts(&self) -> Result<Vec<Workout>, ReadError>;
    async fn get_populated_workouts(&self) -> Result<Vec<PopulatedWorkout>, ReadError>;
    async fn get_populated_workout(&self, id: WorkoutID) -> Result<PopulatedWorkout, ReadError>;
    async fn create_workout(
        &self,
        name: Name,
        date: DateTime<Utc>,
    ) -> Result<Workout, CreateError>;
    async fn delete_workout(&self, id: WorkoutID) -> Result<WorkoutID, DeleteError>;

    fn validate_workout_date(
        &self,
        date: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, WorkoutDateError> {
        if date > Utc::now() {
            return Err(WorkoutDateError);
        }

        Ok(date)
    }
}

#[allow(async_fn_in_trait)]
pub trait WorkoutRepository: Send + Sync + 'static {
    async fn read_workouts(&self) -> Result<Vec<Workout>, ReadError>;
    async fn read_workout(&self, id: WorkoutID) -> Result<Workout, ReadError>;
    async fn create_workout(
        &self,
        name: Name,
        date: DateTime<Utc>,
    ) -> Result<Workout, CreateError>;
    async fn delete_workout(&self, id: WorkoutID) -> Result<WorkoutID, DeleteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workout {
    pub id: WorkoutID,
    pub name: Name,
    pub date: DateTime<Utc>,
}

#[derive(Deref, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkoutID(Uuid);

impl WorkoutID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for WorkoutID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for WorkoutID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Date must not be in the future")]
pub struct WorkoutDateError;

/// Workout joined with its exercises, as shown to the user. Derived on every
/// read and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedWorkout {
    pub workout: Workout,
    pub exercises: Vec<PopulatedWorkoutExercise>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedWorkoutExercise {
    pub workout_exercise: WorkoutExercise,
    pub exercise: Exercise,
}

/// Joins each workout with its entries and the referenced exercises.
///
/// Workouts keep their input order. Entries are grouped per workout in input
/// order and sorted by `order`, as are the sets within each entry. Entries
/// referencing a missing exercise are dropped.
#[must_use]
pub fn populate_workouts(
    workouts: Vec<Workout>,
    workout_exercises: Vec<WorkoutExercise>,
    exercises: &BTreeMap<ExerciseID, Exercise>,
) -> Vec<PopulatedWorkout> {
    let mut entries: BTreeMap<WorkoutID, Vec<WorkoutExercise>> = BTreeMap::new();

    for workout_exercise in workout_exercises {
        entries
            .entry(workout_exercise.workout_id)
            .or_default()
            .push(workout_exercise);
    }

    workouts
        .into_iter()
        .map(|workout| {
            let workout_exercises = entries.remove(&workout.id).unwrap_or_default();
            populate_workout(workout, workout_exercises, exercises)
        })
        .collect()
}

/// Single-workout variant of [`populate_workouts`].
#[must_use]
pub fn populate_workout(
    workout: Workout,
    mut workout_exercises: Vec<WorkoutExercise>,
    exercises: &BTreeMap<ExerciseID, Exercise>,
) -> PopulatedWorkout {
    workout_exercises.sort_by_key(|workout_exercise| workout_exercise.order);

    let exercises = workout_exercises
        .into_iter()
        .filter_map(|mut workout_exercise| {
            let exercise = exercises.get(&workout_exercise.exercise_id)?.clone();
            workout_exercise.sets.sort_by_key(|set| set.order);
            Some(PopulatedWorkoutExercise {
                workout_exercise,
                exercise,
            })
        })
        .collect();

    PopulatedWorkout { workout, exercises }
}

#[must_use]
pub fn default_workout_name(time: NaiveTime) -> &'static str {
    match time.hour() {
        0..=11 => "Morning Workout",
        12..=17 => "Afternoon Workout",
        _ => "Evening Workout",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{MuscleGroup, Set, WorkoutExerciseID};

    use super::*;

    static BENCH_PRESS: LazyLock<Exercise> = LazyLock::new(|| Exercise {
        id: 1.into(),
        name: Name::new("Bench Press").unwrap(),
        muscle_group: MuscleGroup::Chest,
    });

    static SQUAT: LazyLock<Exercise> = LazyLock::new(|| Exercise {
        id: 2.into(),
        name: Name::new("Squat").unwrap(),
        muscle_group: MuscleGroup::Legs,
    });

    static EXERCISES: LazyLock<BTreeMap<ExerciseID, Exercise>> = LazyLock::new(|| {
        [BENCH_PRESS.clone(), SQUAT.clone()]
            .into_iter()
            .map(|exercise| (exercise.id, exercise))
            .collect()
    });

    static LATER_WORKOUT: LazyLock<Workout> = LazyLock::new(|| Workout {
        id: 1.into(),
        name: Name::new("Morning Workout").unwrap(),
        date: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
    });

    static EARLIER_WORKOUT: LazyLock<Workout> = LazyLock::new(|| Workout {
        id: 2.into(),
        name: Name::new("Evening Workout").unwrap(),
        date: Utc.with_ymd_and_hms(2024, 1, 1, 19, 0, 0).unwrap(),
    });

    fn workout_exercise(
        id: u128,
        workout: &Workout,
        exercise_id: ExerciseID,
        order: u32,
        sets: Vec<Set>,
    ) -> WorkoutExercise {
        WorkoutExercise {
            id: WorkoutExerciseID::from(id),
            workout_id: workout.id,
            exercise_id,
            order,
            sets,
            created: workout.date + Duration::minutes(i64::try_from(id).unwrap()),
        }
    }

    fn set(id: u128, reps: Option<u32>, weight: Option<f64>, order: u32) -> Set {
        Set {
            id: id.into(),
            reps: reps.map(|reps| crate::Reps::new(reps).unwrap()),
            weight: weight.map(|weight| crate::Weight::new(weight).unwrap()),
            order,
        }
    }

    #[test]
    fn test_populate_workouts() {
        let second_entry = workout_exercise(
            1,
            &LATER_WORKOUT,
            BENCH_PRESS.id,
            2,
            vec![set(1, Some(5), Some(50.0), 1)],
        );
        let first_entry = workout_exercise(2, &LATER_WORKOUT, SQUAT.id, 1, vec![]);

        let populated = populate_workouts(
            vec![LATER_WORKOUT.clone(), EARLIER_WORKOUT.clone()],
            vec![second_entry.clone(), first_entry.clone()],
            &EXERCISES,
        );

        assert_eq!(
            populated,
            vec![
                PopulatedWorkout {
                    workout: LATER_WORKOUT.clone(),
                    exercises: vec![
                        PopulatedWorkoutExercise {
                            workout_exercise: first_entry,
                            exercise: SQUAT.clone(),
                        },
                        PopulatedWorkoutExercise {
                            workout_exercise: second_entry,
                            exercise: BENCH_PRESS.clone(),
                        },
                    ],
                },
                PopulatedWorkout {
                    workout: EARLIER_WORKOUT.clone(),
                    exercises: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_populate_workouts_drops_dangling_references() {
        let valid = workout_exercise(1, &LATER_WORKOUT, BENCH_PRESS.id, 1, vec![]);
        let dangling = workout_exercise(2, &LATER_WORKOUT, ExerciseID::from(99), 2, vec![]);

        let populated = populate_workouts(
            vec![LATER_WORKOUT.clone()],
            vec![valid.clone(), dangling],
            &EXERCISES,
        );

        assert_eq!(
            populated,
            vec![PopulatedWorkout {
                workout: LATER_WORKOUT.clone(),
                exercises: vec![PopulatedWorkoutExercise {
                    workout_exercise: valid,
                    exercise: BENCH_PRESS.clone(),
                }],
            }]
        );
    }

    #[test]
    fn test_populate_workout_sorts_sets() {
        let entry = workout_exercise(
            1,
            &LATER_WORKOUT,
            BENCH_PRESS.id,
            1,
            vec![
                set(2, Some(3), Some(60.0), 2),
                set(1, Some(5), Some(50.0), 1),
            ],
        );

        let populated = populate_workout(LATER_WORKOUT.clone(), vec![entry], &EXERCISES);

        assert_eq!(
            populated.exercises[0].workout_exercise.sets,
            vec![
                set(1, Some(5), Some(50.0), 1),
                set(2, Some(3), Some(60.0), 2),
            ]
        );
    }

    #[test]
    fn test_populate_workout_keeps_equal_orders_stable() {
        let first = workout_exercise(1, &LATER_WORKOUT, BENCH_PRESS.id, 1, vec![]);
        let second = workout_exercise(2, &LATER_WORKOUT, SQUAT.id, 1, vec![]);

        let populated = populate_workout(
            LATER_WORKOUT.clone(),
            vec![first.clone(), second.clone()],
            &EXERCISES,
        );

        assert_eq!(
            populated
                .exercises
                .into_iter()
                .map(|entry| entry.workout_exercise)
                .collect::<Vec<_>>(),
            vec![first, second]
        );
    }

    #[test]
    fn test_workout_id_nil() {
        assert!(WorkoutID::nil().is_nil());
        assert_eq!(WorkoutID::nil(), WorkoutID::default());
    }

    #[rstest]
    #[case(NaiveTime::from_hms_opt(0, 0, 0).unwrap(), "Morning Workout")]
    #[case(NaiveTime::from_hms_opt(11, 59, 59).unwrap(), "Morning Workout")]
    #[case(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), "Afternoon Workout")]
    #[case(NaiveTime::from_hms_opt(17, 59, 59).unwrap(), "Afternoon Workout")]
    #[case(NaiveTime::from_hms_opt(18, 0, 0).unwrap(), "Evening Workout")]
    #[case(NaiveTime::from_hms_opt(23, 59, 59).unwrap(), "Evening Workout")]
    fn test_default_workout_name(#[case] time: NaiveTime, #[case] expected: &str) {
        assert_eq!(default_workout_name(time), expected);
    }
}
