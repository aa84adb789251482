pub mod auth;
pub mod blacklist;
pub mod holiday;
pub mod order;
pub mod settings;
pub mod shift;
pub mod user;

pub use auth::auth_config;
pub use blacklist::blacklist_config;
pub use holiday::holiday_config;
pub use order::order_config;
pub use settings::settings_config;
pub use shift::shift_config;
pub use user::user_config;

use crate::error::AppError;
use crate::middlewares::CurrentUser;
use crate::models::UserRole;
use actix_web::{HttpMessage, HttpRequest};

/// 从请求扩展中取出认证用户（由 AuthMiddleware 写入）
pub(crate) fn current_user(req: &HttpRequest) -> Result<CurrentUser, AppError> {
    req.extensions()
        .get::<CurrentUser>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))
}

pub(crate) fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}
