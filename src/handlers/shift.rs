use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::handlers::{current_user, require_admin};
use crate::models::*;
use crate::services::ShiftService;

#[utoipa::path(
    get,
    path = "/shifts",
    tag = "shift",
    params(("include_inactive" = Option<bool>, Query, description = "是否包含停用班次")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "获取班次列表成功"))
)]
pub async fn list_shifts(
    shift_service: web::Data<ShiftService>,
    req: HttpRequest,
    query: web::Query<ShiftListQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    // 停用班次只对管理员可见
    let include_inactive =
        query.include_inactive.unwrap_or(false) && require_admin(&user).is_ok();
    match shift_service.list(include_inactive).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/shifts",
    tag = "shift",
    request_body = CreateShiftRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "创建班次成功", body = ShiftResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn create_shift(
    shift_service: web::Data<ShiftService>,
    req: HttpRequest,
    request: web::Json<CreateShiftRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match shift_service.create(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/shifts/{id}",
    tag = "shift",
    request_body = UpdateShiftRequest,
    params(("id" = i64, Path, description = "班次ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "更新班次成功", body = ShiftResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn update_shift(
    shift_service: web::Data<ShiftService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateShiftRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match shift_service
        .update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn shift_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shifts")
            .route("", web::get().to(list_shifts))
            .route("", web::post().to(create_shift))
            .route("/{id}", web::put().to(update_shift)),
    );
}
