use std::{env, time::Duration};

use thiserror::Error;

use crate::document::Collection;

pub const ENDPOINT_VAR: &str = "LIFTLOG_STORE_ENDPOINT";
pub const PROJECT_ID_VAR: &str = "LIFTLOG_STORE_PROJECT_ID";
pub const DATABASE_ID_VAR: &str = "LIFTLOG_STORE_DATABASE_ID";
pub const EXERCISES_COLLECTION_ID_VAR: &str = "LIFTLOG_EXERCISES_COLLECTION_ID";
pub const WORKOUTS_COLLECTION_ID_VAR: &str = "LIFTLOG_WORKOUTS_COLLECTION_ID";
pub const WORKOUT_EXERCISES_COLLECTION_ID_VAR: &str = "LIFTLOG_WORKOUT_EXERCISES_COLLECTION_ID";
pub const TIMEOUT_MS_VAR: &str = "LIFTLOG_STORE_TIMEOUT_MS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collections: Collections,
    pub timeout: Duration,
}

impl StoreConfig {
    /// Reads the configuration from `LIFTLOG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name| var(name).ok_or(ConfigError::Missing(name));
        let timeout = match var(TIMEOUT_MS_VAR) {
            Some(value) => Duration::from_millis(
                value
                    .parse()
                    .map_err(|_| ConfigError::Invalid(TIMEOUT_MS_VAR))?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            endpoint: require(ENDPOINT_VAR)?.trim_end_matches('/').to_string(),
            project_id: require(PROJECT_ID_VAR)?,
            database_id: require(DATABASE_ID_VAR)?,
            collections: Collections {
                exercises: require(EXERCISES_COLLECTION_ID_VAR)?,
                workouts: require(WORKOUTS_COLLECTION_ID_VAR)?,
                workout_exercises: require(WORKOUT_EXERCISES_COLLECTION_ID_VAR)?,
            },
            timeout,
        })
    }
}

/// Deployment-specific ids of the collections used by the repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub exercises: String,
    pub workouts: String,
    pub workout_exercises: String,
}

impl Collections {
    #[must_use]
    pub fn id(&self, collection: Collection) -> &str {
        match collection {
            Collection::Exercises => &self.exercises,
            Collection::Workouts => &self.workouts,
            Collection::WorkoutExercises => &self.workout_exercises,
        }
    }
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            exercises: Collection::Exercises.as_ref().to_string(),
            workouts: Collection::Workouts.as_ref().to_string(),
            workout_exercises: Collection::WorkoutExercises.as_ref().to_string(),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{0} has an invalid value")]
    Invalid(&'static str),
}
