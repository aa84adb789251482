use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::handlers::{current_user, require_admin};
use crate::models::*;
use crate::services::HolidayService;

#[utoipa::path(
    get,
    path = "/holidays",
    tag = "holiday",
    params(
        ("start_date" = Option<String>, Query, description = "开始日期"),
        ("end_date" = Option<String>, Query, description = "结束日期")
    ),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "获取节假日列表成功"))
)]
pub async fn list_holidays(
    holiday_service: web::Data<HolidayService>,
    query: web::Query<HolidayQuery>,
) -> Result<HttpResponse> {
    match holiday_service.list(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/holidays",
    tag = "holiday",
    request_body = CreateHolidayRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "创建节假日成功", body = HolidayResponse),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn create_holiday(
    holiday_service: web::Data<HolidayService>,
    req: HttpRequest,
    request: web::Json<CreateHolidayRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match holiday_service.create(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/holidays/{id}",
    tag = "holiday",
    params(("id" = i64, Path, description = "节假日ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "删除节假日成功"),
        (status = 403, description = "仅管理员可操作")
    )
)]
pub async fn delete_holiday(
    holiday_service: web::Data<HolidayService>,
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
    match holiday_service.delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Holiday deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn holiday_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/holidays")
            .route("", web::get().to(list_holidays))
            .route("", web::post().to(create_holiday))
            .route("/{id}", web::delete().to(delete_holiday)),
    );
}
