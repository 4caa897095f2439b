//! In-memory stores used by the service and handler tests.

use super::{ImageStore, UserStore};
use crate::models::{Image, ImageAuthor, ImageFilter, PopulatedImage, UpdateUserParams, User};
use crate::utils::AppError;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn by_object_id(&self, id: &ObjectId) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id.as_ref() == Some(id))
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.clerk_id == clerk_id)
            .cloned())
    }

    async fn insert(&self, mut user: User) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        let taken = users.iter().any(|u| {
            u.clerk_id == user.clerk_id || u.email == user.email || u.username == user.username
        });
        if taken {
            return Ok(None);
        }
        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn update_profile(
        &self,
        clerk_id: &str,
        update: &UpdateUserParams,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.clerk_id == clerk_id).map(|u| {
            apply_update(update, u);
            u.clone()
        }))
    }

    async fn delete(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        let position = users.iter().position(|u| u.clerk_id == clerk_id);
        Ok(position.map(|i| users.remove(i)))
    }

    async fn decrement_credits(
        &self,
        clerk_id: &str,
        amount: i64,
        min_balance: Option<i64>,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| {
                u.clerk_id == clerk_id
                    && !u.is_admin
                    && min_balance.map_or(true, |min| u.credit_balance >= min)
            })
            .map(|u| {
                u.credit_balance -= amount;
                u.clone()
            }))
    }

    async fn set_admin(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.clerk_id == clerk_id).map(|u| {
            u.is_admin = true;
            u.clone()
        }))
    }
}

/// Mesmo efeito do `$set` parcial do store Mongo
fn apply_update(update: &UpdateUserParams, user: &mut User) {
    if let Some(first_name) = &update.first_name {
        user.first_name = Some(first_name.clone());
    }
    if let Some(last_name) = &update.last_name {
        user.last_name = Some(last_name.clone());
    }
    if let Some(username) = &update.username {
        user.username = username.clone();
    }
    if let Some(photo) = &update.photo {
        user.photo = photo.clone();
    }
}

fn matches(filter: &ImageFilter, image: &Image) -> bool {
    match filter {
        ImageFilter::All => true,
        ImageFilter::PublicIds(ids) => ids.iter().any(|id| *id == image.public_id),
        ImageFilter::Author(author) => image.author.as_ref() == Some(author),
    }
}

pub struct MemoryImageStore {
    images: Mutex<Vec<Image>>,
    users: Arc<MemoryUserStore>,
}

impl MemoryImageStore {
    pub fn new(users: Arc<MemoryUserStore>) -> Self {
        Self {
            images: Mutex::new(Vec::new()),
            users,
        }
    }

    fn populate(&self, image: Image) -> PopulatedImage {
        let author = image
            .author
            .as_ref()
            .and_then(|id| self.users.by_object_id(id))
            .and_then(|user| {
                user.id.map(|id| ImageAuthor {
                    id,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    clerk_id: user.clerk_id,
                })
            });
        PopulatedImage { image, author }
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn insert(&self, mut image: Image) -> Result<Image, AppError> {
        image.id = Some(ObjectId::new());
        self.images.lock().unwrap().push(image.clone());
        Ok(image)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Image>, AppError> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id.as_ref() == Some(id))
            .cloned())
    }

    async fn find_populated(&self, id: &ObjectId) -> Result<Option<PopulatedImage>, AppError> {
        Ok(self.find_by_id(id).await?.map(|image| self.populate(image)))
    }

    async fn replace(&self, id: &ObjectId, image: Image) -> Result<Option<Image>, AppError> {
        let mut images = self.images.lock().unwrap();
        Ok(images.iter_mut().find(|i| i.id.as_ref() == Some(id)).map(|slot| {
            *slot = Image { id: Some(*id), ..image };
            slot.clone()
        }))
    }

    async fn delete(&self, id: &ObjectId) -> Result<Option<Image>, AppError> {
        let mut images = self.images.lock().unwrap();
        let position = images.iter().position(|i| i.id.as_ref() == Some(id));
        Ok(position.map(|i| images.remove(i)))
    }

    async fn find_page(
        &self,
        filter: &ImageFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<PopulatedImage>, AppError> {
        let mut matching: Vec<Image> = self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| matches(filter, i))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|image| self.populate(image))
            .collect())
    }

    async fn count(&self, filter: &ImageFilter) -> Result<u64, AppError> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| matches(filter, i))
            .count() as u64)
    }
}

/// A user store whose every call fails, for fail-soft paths
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_clerk_id(&self, _: &str) -> Result<Option<User>, AppError> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }

    async fn insert(&self, _: User) -> Result<Option<User>, AppError> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }

    async fn update_profile(&self, _: &str, _: &UpdateUserParams) -> Result<Option<User>, AppError> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }

    async fn delete(&self, _: &str) -> Result<Option<User>, AppError> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }

    async fn decrement_credits(&self, _: &str, _: i64, _: Option<i64>) -> Result<Option<User>, AppError> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }

    async fn set_admin(&self, _: &str) -> Result<Option<User>, AppError> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;

    fn user() -> User {
        UserProfile {
            clerk_id: "u1".into(),
            email: "a@b.c".into(),
            username: "a".into(),
            first_name: None,
            last_name: None,
            photo: String::new(),
        }
        .into_user(10)
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut user = user();
        let params = UpdateUserParams {
            first_name: Some("Ana".into()),
            photo: Some("https://img/a.png".into()),
            ..Default::default()
        };
        apply_update(&params, &mut user);

        assert_eq!(user.first_name.as_deref(), Some("Ana"));
        assert_eq!(user.photo, "https://img/a.png");
        assert_eq!(user.username, "a");
        assert_eq!(user.credit_balance, 10);
    }

    #[tokio::test]
    async fn test_floor_guards_the_debit() {
        let store = MemoryUserStore::new();
        store.insert(user()).await.unwrap();

        assert!(store.decrement_credits("u1", 4, Some(11)).await.unwrap().is_none());
        let charged = store.decrement_credits("u1", 4, Some(4)).await.unwrap().unwrap();
        assert_eq!(charged.credit_balance, 6);
    }
}
