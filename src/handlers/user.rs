use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::handlers::{current_user, require_admin};
use crate::models::*;
use crate::services::UserService;

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取个人信息成功", body = UserResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match user_service.get_profile(user.id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "user",
    request_body = CreateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "创建用户成功", body = UserResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn create_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match user_service.create_user(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "user",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取用户列表成功"),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match user_service.list(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users/{id}/reset-no-show",
    tag = "user",
    params(("id" = i64, Path, description = "用户ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "清零爽约计数成功", body = UserResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn reset_no_show(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match user_service.reset_no_show_count(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/me", web::get().to(get_profile))
            .route("", web::post().to(create_user))
            .route("", web::get().to(list_users))
            .route("/{id}/reset-no-show", web::post().to(reset_no_show)),
    );
}
