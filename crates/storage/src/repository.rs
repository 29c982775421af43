use chrono::{DateTime, Utc};
use liftlog_domain as domain;
use serde_json::{Map, json};
use uuid::Uuid;

use crate::{
    config::Collections,
    document::{CREATED_AT, Collection, DOCUMENT_ID, Document, DocumentStore, Query, StoreError},
    records,
};

const PAGE_SIZE: usize = 100;
// Targeted listings are requested in one batch. The remote store caps
// responses, so batches beyond this size would be truncated.
const BATCH_LIMIT: usize = 5000;

/// Repositories backed by a [`DocumentStore`].
#[derive(Clone)]
pub struct StoreRepository<S> {
    store: S,
    collections: Collections,
}

impl<S: DocumentStore> StoreRepository<S> {
    pub fn new(store: S, collections: Collections) -> Self {
        Self { store, collections }
    }

    async fn scan(
        &self,
        collection: Collection,
        queries: &[Query],
    ) -> Result<Vec<Document>, StoreError> {
        let collection = self.collections.id(collection);
        let mut documents = Vec::new();

        loop {
            let mut page_queries = queries.to_vec();
            page_queries.push(Query::Limit(PAGE_SIZE));
            page_queries.push(Query::Offset(documents.len()));

            let page = self.store.list_documents(collection, &page_queries).await?;
            let len = page.len();
            documents.extend(page);

            if len < PAGE_SIZE {
                return Ok(documents);
            }
        }
    }

    async fn batch(
        &self,
        collection: Collection,
        mut queries: Vec<Query>,
    ) -> Result<Vec<Document>, StoreError> {
        queries.push(Query::Limit(BATCH_LIMIT));
        self.store
            .list_documents(self.collections.id(collection), &queries)
            .await
    }
}

impl<S: DocumentStore> domain::WorkoutRepository for StoreRepository<S> {
    async fn read_workouts(&self) -> Result<Vec<domain::Workout>, domain::ReadError> {
        let documents = self
            .scan(Collection::Workouts, &[Query::OrderDesc("date")])
            .await?;
        Ok(documents
            .iter()
            .map(domain::Workout::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn read_workout(
        &self,
        id: domain::WorkoutID,
    ) -> Result<domain::Workout, domain::ReadError> {
        let document = self
            .store
            .get_document(self.collections.id(Collection::Workouts), &id.to_string())
            .await?;
        Ok(domain::Workout::try_from(&document)?)
    }

    async fn create_workout(
        &self,
        name: domain::Name,
        date: DateTime<Utc>,
    ) -> Result<domain::Workout, domain::CreateError> {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!(name.as_ref()));
        fields.insert("date".to_string(), json!(date));

        let document = self
            .store
            .create_document(
                self.collections.id(Collection::Workouts),
                &Uuid::new_v4().to_string(),
                fields,
            )
            .await?;
        Ok(domain::Workout::try_from(&document)?)
    }

    async fn delete_workout(
        &self,
        id: domain::WorkoutID,
    ) -> Result<domain::WorkoutID, domain::DeleteError> {
        self.store
            .delete_document(self.collections.id(Collection::Workouts), &id.to_string())
            .await?;
        Ok(id)
    }
}

impl<S: DocumentStore> domain::WorkoutExerciseRepository for StoreRepository<S> {
    async fn read_workout_exercises(
        &self,
        workout_id: domain::WorkoutID,
    ) -> Result<Vec<domain::WorkoutExercise>, domain::ReadError> {
        let documents = self
            .batch(
                Collection::WorkoutExercises,
                vec![Query::Equal("workoutId", json!(*workout_id))],
            )
            .await?;
        Ok(documents
            .iter()
            .map(domain::WorkoutExercise::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn read_workout_exercises_by_workout_ids(
        &self,
        workout_ids: &[domain::WorkoutID],
    ) -> Result<Vec<domain::WorkoutExercise>, domain::ReadError> {
        let documents = self
            .batch(
                Collection::WorkoutExercises,
                vec![Query::AnyOf(
                    "workoutId",
                    workout_ids.iter().map(|id| json!(**id)).collect(),
                )],
            )
            .await?;
        Ok(documents
            .iter()
            .map(domain::WorkoutExercise::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn read_workout_exercise(
        &self,
        id: domain::WorkoutExerciseID,
    ) -> Result<domain::WorkoutExercise, domain::ReadError> {
        let document = self
            .store
            .get_document(
                self.collections.id(Collection::WorkoutExercises),
                &id.to_string(),
            )
            .await?;
        Ok(domain::WorkoutExercise::try_from(&document)?)
    }

    async fn read_last_workout_exercise(
        &self,
        exercise_id: domain::ExerciseID,
    ) -> Result<Option<domain::WorkoutExercise>, domain::ReadError> {
        let documents = self
            .store
            .list_documents(
                self.collections.id(Collection::WorkoutExercises),
                &[
                    Query::Equal("exerciseId", json!(*exercise_id)),
                    Query::OrderDesc(CREATED_AT),
                    Query::Limit(1),
                ],
            )
            .await?;
        Ok(documents
            .first()
            .map(domain::WorkoutExercise::try_from)
            .transpose()?)
    }

    async fn read_last_workout_exercises(
        &self,
        exercise_ids: &[domain::ExerciseID],
    ) -> Result<Vec<domain::WorkoutExercise>, domain::ReadError> {
        let documents = self
            .batch(
                Collection::WorkoutExercises,
                vec![
                    Query::AnyOf(
                        "exerciseId",
                        exercise_ids.iter().map(|id| json!(**id)).collect(),
                    ),
                    Query::OrderDesc(CREATED_AT),
                ],
            )
            .await?;
        Ok(documents
            .iter()
            .map(domain::WorkoutExercise::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn create_workout_exercise(
        &self,
        workout_id: domain::WorkoutID,
        exercise_id: domain::ExerciseID,
        order: u32,
    ) -> Result<domain::WorkoutExercise, domain::CreateError> {
        let mut fields = Map::new();
        fields.insert("workoutId".to_string(), json!(*workout_id));
        fields.insert("exerciseId".to_string(), json!(*exercise_id));
        fields.insert("order".to_string(), json!(order));
        fields.insert("sets".to_string(), json!([]));

        let document = self
            .store
            .create_document(
                self.collections.id(Collection::WorkoutExercises),
                &Uuid::new_v4().to_string(),
                fields,
            )
            .await?;
        Ok(domain::WorkoutExercise::try_from(&document)?)
    }

    async fn modify_workout_exercise(
        &self,
        id: domain::WorkoutExerciseID,
        sets: Vec<domain::Set>,
    ) -> Result<domain::WorkoutExercise, domain::UpdateError> {
        let mut fields = Map::new();
        fields.insert(
            "sets".to_string(),
            json!(sets.iter().map(records::Set::from).collect::<Vec<_>>()),
        );

        let document = self
            .store
            .update_document(
                self.collections.id(Collection::WorkoutExercises),
                &id.to_string(),
                fields,
            )
            .await?;
        Ok(domain::WorkoutExercise::try_from(&document)?)
    }

    async fn delete_workout_exercise(
        &self,
        id: domain::WorkoutExerciseID,
    ) -> Result<domain::WorkoutExerciseID, domain::DeleteError> {
        self.store
            .delete_document(
                self.collections.id(Collection::WorkoutExercises),
                &id.to_string(),
            )
            .await?;
        Ok(id)
    }
}

impl<S: DocumentStore> domain::ExerciseRepository for StoreRepository<S> {
    async fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        let documents = self
            .scan(Collection::Exercises, &[Query::OrderAsc("name")])
            .await?;
        Ok(documents
            .iter()
            .map(domain::Exercise::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn read_exercises_by_muscle_group(
        &self,
        muscle_group: domain::MuscleGroup,
    ) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        let documents = self
            .scan(
                Collection::Exercises,
                &[
                    Query::Equal("muscleGroup", json!(muscle_group.to_string())),
                    Query::OrderAsc("name"),
                ],
            )
            .await?;
        Ok(documents
            .iter()
            .map(domain::Exercise::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn read_exercises_by_ids(
        &self,
        ids: &[domain::ExerciseID],
    ) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        let documents = self
            .batch(
                Collection::Exercises,
                vec![Query::AnyOf(
                    DOCUMENT_ID,
                    ids.iter().map(|id| json!(**id)).collect(),
                )],
            )
            .await?;
        Ok(documents
            .iter()
            .map(domain::Exercise::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
