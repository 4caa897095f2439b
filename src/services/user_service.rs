// ==================== USER REPOSITORY ====================
// Usuários, créditos e flag de admin. O clerkId é a única chave confiável.

use crate::{
    database::UserStore,
    models::{AdminStatus, CreditBalance, UpdateUserParams, User, UserProfile},
    services::clerk_service::IdentityProvider,
    utils::{AppError, PageCache},
};
use std::sync::Arc;

pub struct UserService {
    store: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
    pages: Arc<PageCache>,
    starting_credits: i64,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        identity: Arc<dyn IdentityProvider>,
        pages: Arc<PageCache>,
        starting_credits: i64,
    ) -> Self {
        Self {
            store,
            identity,
            pages,
            starting_credits,
        }
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Idempotent create: an existing `clerkId` returns the stored user
    /// unchanged.
    pub async fn create_user(&self, profile: UserProfile) -> Result<User, AppError> {
        log::info!("📝 Attempting to create user: {}", profile.clerk_id);

        if let Some(existing) = self.store.find_by_clerk_id(&profile.clerk_id).await? {
            log::info!("ℹ️  User already exists: {}", profile.clerk_id);
            return Ok(existing);
        }

        let clerk_id = profile.clerk_id.clone();
        match self.store.insert(profile.into_user(self.starting_credits)).await? {
            Some(user) => {
                log::info!("✅ User created successfully: {}", clerk_id);
                Ok(user)
            }
            // Unique key taken: a concurrent create won, or email/username clash
            None => self.store.find_by_clerk_id(&clerk_id).await?.ok_or_else(|| {
                log::error!("❌ Email or username already in use for {}", clerk_id);
                AppError::Validation("Email or username already in use".to_string())
            }),
        }
    }

    pub async fn get_user_by_id(&self, clerk_id: &str) -> Result<User, AppError> {
        if clerk_id.trim().is_empty() {
            log::error!("❌ get_user_by_id called with empty id");
            return Err(AppError::Validation("Invalid user ID provided".to_string()));
        }

        match self.store.find_by_clerk_id(clerk_id).await? {
            Some(user) => Ok(user),
            None => {
                log::warn!("⚠️  User not found for ID: {}", clerk_id);
                Err(AppError::NotFound(format!("User {}", clerk_id)))
            }
        }
    }

    /// Just-in-time provisioning: reads the user, creating it from the
    /// identity provider's profile when absent.
    pub async fn get_or_create_user(&self, clerk_id: &str) -> Result<User, AppError> {
        match self.get_user_by_id(clerk_id).await {
            Ok(user) => Ok(user),
            Err(e) if e.is_not_found() => {
                log::info!("🆕 Provisioning user {} from Clerk", clerk_id);
                let clerk_user = self.identity.get_user(clerk_id).await?;
                self.create_user(clerk_user.to_profile()?).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_user(
        &self,
        clerk_id: &str,
        update: &UpdateUserParams,
    ) -> Result<User, AppError> {
        match self.store.update_profile(clerk_id, update).await? {
            Some(user) => {
                log::info!("✅ User updated: {}", clerk_id);
                Ok(user)
            }
            None => {
                log::error!("❌ User update failed, no match for {}", clerk_id);
                Err(AppError::NotFound(format!("User {}", clerk_id)))
            }
        }
    }

    pub async fn delete_user(&self, clerk_id: &str) -> Result<User, AppError> {
        match self.store.delete(clerk_id).await? {
            Some(user) => {
                self.pages.revalidate_path("/");
                log::info!("🗑️  User deleted: {}", clerk_id);
                Ok(user)
            }
            None => {
                log::error!("❌ User deletion failed, no match for {}", clerk_id);
                Err(AppError::NotFound(format!("User {}", clerk_id)))
            }
        }
    }

    /// Debits `abs(amount)` from a non-admin user in one atomic update.
    /// Admins get their document back unchanged. The balance may go
    /// negative here.
    pub async fn update_credits(&self, clerk_id: &str, amount: i64) -> Result<User, AppError> {
        let amount = amount.saturating_abs();

        if let Some(user) = self.store.decrement_credits(clerk_id, amount, None).await? {
            log::info!("💳 Debited {} credits from {} (balance {})", amount, clerk_id, user.credit_balance);
            return Ok(user);
        }

        // Nenhum não-admin casou: ou é admin, ou não existe
        match self.store.find_by_clerk_id(clerk_id).await? {
            Some(user) if user.is_admin => Ok(user),
            Some(_) => Err(AppError::DatabaseError(format!(
                "Credit update for {} matched no document",
                clerk_id
            ))),
            None => Err(AppError::NotFound(format!("User {}", clerk_id))),
        }
    }

    /// Charges a fee only when the balance covers it, in one atomic write.
    /// Admins are returned untouched.
    pub async fn charge_credits(&self, clerk_id: &str, fee: i64) -> Result<User, AppError> {
        let fee = fee.saturating_abs();

        if let Some(user) = self.store.decrement_credits(clerk_id, fee, Some(fee)).await? {
            log::info!("💳 Charged {} credits to {} (balance {})", fee, clerk_id, user.credit_balance);
            return Ok(user);
        }

        match self.store.find_by_clerk_id(clerk_id).await? {
            Some(user) if user.is_admin => Ok(user),
            Some(user) => Err(AppError::InsufficientCredits {
                required: fee,
                available: user.credit_balance,
            }),
            None => Err(AppError::NotFound(format!("User {}", clerk_id))),
        }
    }

    /// Gives back a fee charged for an action that did not complete.
    pub async fn refund_credits(&self, clerk_id: &str, fee: i64) -> Result<(), AppError> {
        let fee = fee.saturating_abs();
        if self.store.decrement_credits(clerk_id, fee.saturating_neg(), None).await?.is_some() {
            log::warn!("↩️  Refunded {} credits to {}", fee, clerk_id);
        }
        Ok(())
    }

    pub async fn is_user_admin(&self, clerk_id: &str) -> AdminStatus {
        match self.store.find_by_clerk_id(clerk_id).await {
            Ok(Some(user)) if user.is_admin => AdminStatus::Admin,
            Ok(_) => AdminStatus::NotAdmin,
            Err(e) => {
                log::error!("❌ Error checking admin status for {}: {}", clerk_id, e);
                AdminStatus::Unknown
            }
        }
    }

    pub async fn make_user_admin(&self, clerk_id: &str) -> Result<User, AppError> {
        match self.store.set_admin(clerk_id).await? {
            Some(user) => {
                log::info!("👑 User {} is now admin", clerk_id);
                Ok(user)
            }
            None => Err(AppError::NotFound(format!("User {}", clerk_id))),
        }
    }

    pub async fn get_user_credit_balance(&self, clerk_id: &str) -> CreditBalance {
        match self.store.find_by_clerk_id(clerk_id).await {
            Ok(Some(user)) => CreditBalance::for_user(&user),
            Ok(None) => CreditBalance::Unavailable,
            Err(e) => {
                log::error!("❌ Error getting credit balance for {}: {}", clerk_id, e);
                CreditBalance::Unavailable
            }
        }
    }
}
