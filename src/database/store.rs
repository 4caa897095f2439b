use crate::models::{Image, ImageFilter, PopulatedImage, UpdateUserParams, User};
use crate::utils::AppError;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

/// Acesso à collection de usuários
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, AppError>;

    /// Inserts a new user. Returns `Ok(None)` when a unique key
    /// (clerkId, email or username) is already taken.
    async fn insert(&self, user: User) -> Result<Option<User>, AppError>;

    async fn update_profile(
        &self,
        clerk_id: &str,
        update: &UpdateUserParams,
    ) -> Result<Option<User>, AppError>;

    async fn delete(&self, clerk_id: &str) -> Result<Option<User>, AppError>;

    /// Atomically subtracts `amount` from a non-admin user's balance.
    /// With `min_balance` set, only a balance of at least that much is
    /// debited. Returns `Ok(None)` when no user matched.
    async fn decrement_credits(
        &self,
        clerk_id: &str,
        amount: i64,
        min_balance: Option<i64>,
    ) -> Result<Option<User>, AppError>;

    async fn set_admin(&self, clerk_id: &str) -> Result<Option<User>, AppError>;
}

/// Acesso à collection de imagens
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert(&self, image: Image) -> Result<Image, AppError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Image>, AppError>;

    /// Reads one image with its author subset embedded
    async fn find_populated(&self, id: &ObjectId) -> Result<Option<PopulatedImage>, AppError>;

    async fn replace(&self, id: &ObjectId, image: Image) -> Result<Option<Image>, AppError>;

    async fn delete(&self, id: &ObjectId) -> Result<Option<Image>, AppError>;

    /// Matching images ordered by `updatedAt` descending
    async fn find_page(
        &self,
        filter: &ImageFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<PopulatedImage>, AppError>;

    async fn count(&self, filter: &ImageFilter) -> Result<u64, AppError>;
}
