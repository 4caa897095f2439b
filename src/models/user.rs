use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize, Serializer};

/// Documento da collection "users"
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Subject id no Clerk - chave de correlação única e imutável
    pub clerk_id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default = "default_plan_id")]
    pub plan_id: i32,
    #[serde(default)]
    pub credit_balance: i64,
    #[serde(default)]
    pub is_admin: bool,
}

fn default_plan_id() -> i32 {
    1
}

/// Perfil vindo do provedor de identidade, usado na criação
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub clerk_id: String,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo: String,
}

impl UserProfile {
    pub fn into_user(self, starting_credits: i64) -> User {
        User {
            id: None,
            clerk_id: self.clerk_id,
            email: self.email,
            username: self.username,
            photo: self.photo,
            first_name: self.first_name,
            last_name: self.last_name,
            plan_id: default_plan_id(),
            credit_balance: starting_credits,
            is_admin: false,
        }
    }
}

/// Campos mutáveis do perfil (webhook `user.updated`)
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl UpdateUserParams {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.photo.is_none()
    }
}

/// Username precedence: provider username, then the email local-part,
/// then the subject id.
pub fn derive_username(username: Option<&str>, email: &str, clerk_id: &str) -> String {
    if let Some(name) = username.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    match email.split('@').next().map(str::trim) {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => clerk_id.to_string(),
    }
}

/// Resultado de `is_user_admin`. `Unknown` means the store could not answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStatus {
    Admin,
    NotAdmin,
    Unknown,
}

impl AdminStatus {
    /// UI gating only: an indeterminate answer counts as not admin
    pub fn is_admin(self) -> bool {
        self == AdminStatus::Admin
    }
}

/// Saldo exibido na UI. Admins têm crédito ilimitado ("∞").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditBalance {
    Unlimited,
    Credits(i64),
    Unavailable,
}

impl CreditBalance {
    pub fn for_user(user: &User) -> Self {
        if user.is_admin {
            CreditBalance::Unlimited
        } else {
            CreditBalance::Credits(user.credit_balance)
        }
    }
}

impl Serialize for CreditBalance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CreditBalance::Unlimited => serializer.serialize_str("∞"),
            CreditBalance::Credits(n) => serializer.serialize_i64(*n),
            CreditBalance::Unavailable => serializer.serialize_i64(0),
        }
    }
}

/// Representação JSON do usuário
#[derive(Debug, Serialize, Clone, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub clerk_id: String,
    pub email: String,
    pub username: String,
    pub photo: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub plan_id: i32,
    pub credit_balance: i64,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            clerk_id: user.clerk_id,
            email: user.email,
            username: user.username,
            photo: user.photo,
            first_name: user.first_name,
            last_name: user.last_name,
            plan_id: user.plan_id,
            credit_balance: user.credit_balance,
            is_admin: user.is_admin,
        }
    }
}
