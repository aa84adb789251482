use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest, UserResponse};
use crate::utils::{JwtService, RateLimiter};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    rate_limiter: Arc<RateLimiter>,
}

impl AuthService {
    pub fn new(
        pool: DatabaseConnection,
        jwt_service: JwtService,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            rate_limiter,
        }
    }

    /// Password login, throttled per employee number and per origin IP.
    pub async fn login(&self, req: LoginRequest, origin_ip: &str) -> AppResult<AuthResponse> {
        let identity_key = format!("login:user:{}", req.employee_no);
        let origin_key = format!("login:ip:{origin_ip}");
        if !self.rate_limiter.check(&identity_key) || !self.rate_limiter.check(&origin_key) {
            return Err(AppError::RateLimited(
                "Too many failed login attempts, try again later".into(),
            ));
        }

        let user = users::Entity::find()
            .filter(users::Column::EmployeeNo.eq(req.employee_no.clone()))
            .one(&self.pool)
            .await?;

        let Some(user) = user else {
            self.record_failure(&identity_key, &origin_key);
            return Err(AppError::AuthError(
                "Invalid employee number or password".into(),
            ));
        };

        if !user.is_active {
            return Err(AppError::AuthError("Account is disabled".into()));
        }

        let password_ok = bcrypt::verify(&req.password, &user.password_hash).unwrap_or(false);
        if !password_ok {
            self.record_failure(&identity_key, &origin_key);
            return Err(AppError::AuthError(
                "Invalid employee number or password".into(),
            ));
        }

        self.rate_limiter.reset(&identity_key);
        self.rate_limiter.reset(&origin_key);
        self.issue_tokens(user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".into()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".into()))?;
        if !user.is_active {
            return Err(AppError::AuthError("Account is disabled".into()));
        }
        self.issue_tokens(user)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let role = user.role.to_string();
        let access_token =
            self.jwt_service
                .generate_access_token(user.id, &user.employee_no, &role)?;
        let refresh_token =
            self.jwt_service
                .generate_refresh_token(user.id, &user.employee_no, &role)?;
        let expires_in = self.jwt_service.get_access_token_expires_in();
        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            expires_in,
        })
    }

    fn record_failure(&self, identity_key: &str, origin_key: &str) {
        self.rate_limiter.record_failure(identity_key);
        self.rate_limiter.record_failure(origin_key);
    }
}
