use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "employee")]
    Employee,
    /// 食堂取餐核销人员
    #[sea_orm(string_value = "kitchen")]
    Kitchen,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Employee => write!(f, "employee"),
            UserRole::Kitchen => write!(f, "kitchen"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl UserRole {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "employee" => Some(UserRole::Employee),
            "kitchen" => Some(UserRole::Kitchen),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "E1001")]
    pub employee_no: String,
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "E1001")]
    pub employee_no: String,
    #[schema(example = "张三")]
    pub username: String,
    #[schema(example = "password123")]
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub employee_no: String,
    pub username: String,
    pub role: UserRole,
    pub no_show_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<crate::entities::users::Model> for UserResponse {
    fn from(user: crate::entities::users::Model) -> Self {
        Self {
            id: user.id,
            employee_no: user.employee_no,
            username: user.username,
            role: user.role,
            no_show_count: user.no_show_count,
            is_active: user.is_active,
            created_at: user.created_at.unwrap_or_else(Utc::now),
        }
    }
}
