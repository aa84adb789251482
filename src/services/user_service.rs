use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};

use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::{CreateUserRequest, UserQuery, UserResponse};
use crate::utils::pagination::{PaginatedResponse, PaginationParams};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        Ok(UserResponse::from(user))
    }

    /// Admin provisioning; employees do not self-register.
    pub async fn create_user(&self, req: CreateUserRequest) -> AppResult<UserResponse> {
        if req.employee_no.trim().is_empty() || req.username.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Employee number and username are required".into(),
            ));
        }
        if req.password.len() < 8 {
            return Err(AppError::ValidationError(
                "Password must be at least 8 characters".into(),
            ));
        }

        let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

        let user = users::ActiveModel {
            employee_no: Set(req.employee_no.trim().to_string()),
            username: Set(req.username.trim().to_string()),
            password_hash: Set(password_hash),
            role: Set(req.role),
            no_show_count: Set(0),
            is_active: Set(true),
            ..Default::default()
        };

        match user.insert(&self.pool).await {
            Ok(model) => Ok(UserResponse::from(model)),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::ValidationError(
                    "Employee number already exists".into(),
                )),
                _ => Err(AppError::DatabaseError(e)),
            },
        }
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<PaginatedResponse<UserResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base = users::Entity::find();

        let total = base.clone().count(&self.pool).await? as i64;
        let models = base
            .order_by_asc(users::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<UserResponse> = models.into_iter().map(UserResponse::from).collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// The only path that ever lowers a strike counter.
    pub async fn reset_no_show_count(&self, user_id: i64) -> AppResult<UserResponse> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::NoShowCount, Expr::value(0))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        self.get_profile(user_id).await
    }
}
