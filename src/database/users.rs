use super::{DatabaseConnector, UserStore, USERS};
use crate::models::{UpdateUserParams, User};
use crate::utils::AppError;
use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use std::sync::Arc;

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoUserStore {
    connector: Arc<DatabaseConnector>,
}

impl MongoUserStore {
    pub fn new(connector: Arc<DatabaseConnector>) -> Self {
        Self { connector }
    }

    async fn collection(&self) -> Result<Collection<User>, AppError> {
        Ok(self.connector.get().await?.collection::<User>(USERS))
    }
}

pub(crate) fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        *error.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref e)) if e.code == DUPLICATE_KEY
    )
}

/// Filtro do débito: nunca casa admins; com piso, só casa saldo suficiente.
pub(crate) fn debit_filter(clerk_id: &str, min_balance: Option<i64>) -> Document {
    let mut filter = doc! { "clerkId": clerk_id, "isAdmin": { "$ne": true } };
    if let Some(min) = min_balance {
        filter.insert("creditBalance", doc! { "$gte": min });
    }
    filter
}

pub(crate) fn debit_update(amount: i64) -> Document {
    doc! { "$inc": { "creditBalance": amount.saturating_neg() } }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        let users = self.collection().await?;
        Ok(users.find_one(doc! { "clerkId": clerk_id }).await?)
    }

    async fn insert(&self, mut user: User) -> Result<Option<User>, AppError> {
        let users = self.collection().await?;
        user.id = Some(ObjectId::new());

        match users.insert_one(&user).await {
            Ok(_) => Ok(Some(user)),
            Err(e) if is_duplicate_key(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(
        &self,
        clerk_id: &str,
        update: &UpdateUserParams,
    ) -> Result<Option<User>, AppError> {
        let users = self.collection().await?;

        if update.is_empty() {
            return self.find_by_clerk_id(clerk_id).await;
        }

        let fields = mongodb::bson::to_document(update)?;
        Ok(users
            .find_one_and_update(doc! { "clerkId": clerk_id }, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        let users = self.collection().await?;
        Ok(users.find_one_and_delete(doc! { "clerkId": clerk_id }).await?)
    }

    async fn decrement_credits(
        &self,
        clerk_id: &str,
        amount: i64,
        min_balance: Option<i64>,
    ) -> Result<Option<User>, AppError> {
        let users = self.collection().await?;

        // Filtro e $inc numa única operação: admin e saldo checados atomicamente
        Ok(users
            .find_one_and_update(debit_filter(clerk_id, min_balance), debit_update(amount))
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn set_admin(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        let users = self.collection().await?;
        Ok(users
            .find_one_and_update(
                doc! { "clerkId": clerk_id },
                doc! { "$set": { "isAdmin": true } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;

    async fn store() -> MongoUserStore {
        dotenv::dotenv().ok();
        let connector = DatabaseConnector::new(std::env::var("MONGODB_URL").ok(), "imagenko_test");
        MongoUserStore::new(Arc::new(connector))
    }

    fn profile(clerk_id: &str) -> UserProfile {
        UserProfile {
            clerk_id: clerk_id.to_string(),
            email: format!("{}@example.com", clerk_id),
            username: clerk_id.to_string(),
            first_name: None,
            last_name: None,
            photo: String::new(),
        }
    }

    #[test]
    fn test_debit_is_a_single_filtered_inc() {
        assert_eq!(
            debit_filter("u1", None),
            doc! { "clerkId": "u1", "isAdmin": { "$ne": true } }
        );
        assert_eq!(
            debit_filter("u1", Some(5)),
            doc! { "clerkId": "u1", "isAdmin": { "$ne": true }, "creditBalance": { "$gte": 5_i64 } }
        );
        assert_eq!(debit_update(3), doc! { "$inc": { "creditBalance": -3_i64 } });
        assert_eq!(debit_update(-2), doc! { "$inc": { "creditBalance": 2_i64 } });
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_charge_with_floor_rejects_short_balance() {
        let store = store().await;
        let clerk_id = format!("user_{}", ObjectId::new().to_hex());
        store.insert(profile(&clerk_id).into_user(1)).await.unwrap();

        assert!(store.decrement_credits(&clerk_id, 1, Some(1)).await.unwrap().is_some());
        assert!(store.decrement_credits(&clerk_id, 1, Some(1)).await.unwrap().is_none());

        let user = store.find_by_clerk_id(&clerk_id).await.unwrap().unwrap();
        assert_eq!(user.credit_balance, 0);
        store.delete(&clerk_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_concurrent_decrements_do_not_lose_updates() {
        let store = Arc::new(store().await);
        let clerk_id = format!("user_{}", ObjectId::new().to_hex());
        store.insert(profile(&clerk_id).into_user(10)).await.unwrap();

        let a = {
            let store = store.clone();
            let id = clerk_id.clone();
            tokio::spawn(async move { store.decrement_credits(&id, 3, None).await })
        };
        let b = {
            let store = store.clone();
            let id = clerk_id.clone();
            tokio::spawn(async move { store.decrement_credits(&id, 4, None).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let user = store.find_by_clerk_id(&clerk_id).await.unwrap().unwrap();
        assert_eq!(user.credit_balance, 3);
        store.delete(&clerk_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_duplicate_insert_returns_none() {
        let store = store().await;
        let clerk_id = format!("user_{}", ObjectId::new().to_hex());
        assert!(store.insert(profile(&clerk_id).into_user(10)).await.unwrap().is_some());
        assert!(store.insert(profile(&clerk_id).into_user(10)).await.unwrap().is_none());
        store.delete(&clerk_id).await.unwrap();
    }
}
