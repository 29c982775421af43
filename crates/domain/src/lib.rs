#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod error;
mod exercise;
mod name;
mod service;
mod workout;
mod workout_exercise;

pub use error::{CreateError, DeleteError, ReadError, StorageError, UpdateError, ValidationError};
pub use exercise::{
    Exercise, ExerciseID, ExerciseRepository, ExerciseService, MuscleGroup, MuscleGroupError,
};
pub use name::{Name, NameError};
pub use service::Service;
pub use workout::{
    PopulatedWorkout, PopulatedWorkoutExercise, Workout, WorkoutDateError, WorkoutID,
    WorkoutRepository, WorkoutService, default_workout_name, populate_workout, populate_workouts,
};
pub use workout_exercise::{
    Reps, RepsError, Set, SetID, Weight, WeightError, WorkoutExercise, WorkoutExerciseID,
    WorkoutExerciseRepository, WorkoutExerciseService, next_order,
};
