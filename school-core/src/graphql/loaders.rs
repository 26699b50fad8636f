use crate::domain::{Course, User};
use crate::storage::Storage;
use async_graphql::dataloader::{DataLoader, Loader};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// DataLoader for batching user lookups (professors, students)
pub struct UserLoader {
    storage: Arc<dyn Storage>,
}

impl UserLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<Uuid> for UserLoader {
    type Value = User;
    type Error = String;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let users = self
            .storage
            .get_users_by_ids(keys.to_vec())
            .await
            .map_err(|e| e.to_string())?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }
}

/// DataLoader for batching course lookups
pub struct CourseLoader {
    storage: Arc<dyn Storage>,
}

impl CourseLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<Uuid> for CourseLoader {
    type Value = Course;
    type Error = String;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let courses = self
            .storage
            .get_courses_by_ids(keys.to_vec())
            .await
            .map_err(|e| e.to_string())?;

        Ok(courses.into_iter().map(|course| (course.id, course)).collect())
    }
}
