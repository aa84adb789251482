use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::handlers::{current_user, require_admin};
use crate::models::*;
use crate::services::BlacklistService;

#[utoipa::path(
    get,
    path = "/blacklists",
    tag = "blacklist",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("active_only" = Option<bool>, Query, description = "只看当前生效的")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取黑名单成功"),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn list_blacklists(
    blacklist_service: web::Data<BlacklistService>,
    req: HttpRequest,
    query: web::Query<BlacklistQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match blacklist_service.list(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/blacklists",
    tag = "blacklist",
    request_body = CreateBlacklistRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "人工拉黑成功", body = BlacklistResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn create_blacklist(
    blacklist_service: web::Data<BlacklistService>,
    req: HttpRequest,
    request: web::Json<CreateBlacklistRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match blacklist_service
        .create_manual(request.into_inner(), user.id)
        .await
    {
        Ok(model) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": {
                "id": model.id,
                "user_id": model.user_id,
                "reason": model.reason,
                "start_date": model.start_date,
                "end_date": model.end_date,
                "is_active": model.is_active,
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/blacklists/{id}/deactivate",
    tag = "blacklist",
    params(("id" = i64, Path, description = "黑名单ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "解除拉黑成功", body = BlacklistResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn deactivate_blacklist(
    blacklist_service: web::Data<BlacklistService>,
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
    match blacklist_service.deactivate(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn blacklist_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/blacklists")
            .route("", web::get().to(list_blacklists))
            .route("", web::post().to(create_blacklist))
            .route("/{id}/deactivate", web::post().to(deactivate_blacklist)),
    );
}
