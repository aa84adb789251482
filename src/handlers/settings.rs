use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::handlers::{current_user, require_admin};
use crate::models::*;
use crate::services::SettingsService;

#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取配置成功", body = SettingsResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn get_settings(
    settings_service: web::Data<SettingsService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match settings_service.get().await {
        Ok(model) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": SettingsResponse::from(model)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    request_body = UpdateSettingsRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "更新配置成功", body = SettingsResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn update_settings(
    settings_service: web::Data<SettingsService>,
    req: HttpRequest,
    request: web::Json<UpdateSettingsRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match settings_service.update(request.into_inner()).await {
        Ok(model) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": SettingsResponse::from(model)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn settings_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/settings")
            .route("", web::get().to(get_settings))
            .route("", web::put().to(update_settings)),
    );
}
