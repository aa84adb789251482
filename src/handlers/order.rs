use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::handlers::{current_user, require_admin};
use crate::models::*;
use crate::services::{CheckinService, NoShowService, OrderService};

#[utoipa::path(
    post,
    path = "/orders",
    tag = "order",
    request_body = CreateOrderRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "下单成功", body = OrderResponse),
        (status = 409, description = "同日已有有效订单"),
        (status = 422, description = "超出可订窗口或已过截单时间")
    )
)]
pub async fn create_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match order_service
        .create_order(user.id, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/bulk",
    tag = "order",
    request_body = BulkCreateOrderRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "批量下单完成（可能部分成功）", body = BulkOrderResponse),
        (status = 400, description = "候选列表为空或超出上限")
    )
)]
pub async fn create_bulk_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<BulkCreateOrderRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match order_service
        .create_bulk_orders(user.id, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "订单状态"),
        ("start_date" = Option<String>, Query, description = "开始日期"),
        ("end_date" = Option<String>, Query, description = "结束日期")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取订单列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match order_service.get_user_orders(user.id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    tag = "order",
    request_body = CancelOrderRequest,
    params(("id" = i64, Path, description = "订单ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "取消成功", body = OrderResponse),
        (status = 409, description = "订单状态不允许取消"),
        (status = 422, description = "已过取消截止时间")
    )
)]
pub async fn cancel_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<CancelOrderRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match order_service
        .cancel_order(path.into_inner(), user.id, user.role, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/check-in",
    tag = "order",
    request_body = CheckInRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "取餐核销成功", body = OrderResponse),
        (status = 403, description = "仅食堂或管理员可核销"),
        (status = 422, description = "不在取餐时间窗内")
    )
)]
pub async fn check_in(
    checkin_service: web::Data<CheckinService>,
    req: HttpRequest,
    request: web::Json<CheckInRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match checkin_service
        .check_in(&request.qr_token, user.id, user.role)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/noshow-sweep",
    tag = "order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "扫单完成", body = SweepReport),
        (status = 403, description = "仅管理员可手动触发")
    )
)]
pub async fn run_noshow_sweep(
    noshow_service: web::Data<NoShowService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = require_admin(&user) {
        return Ok(e.error_response());
    }
    match noshow_service.run_sweep().await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": report
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(get_orders))
            .route("/bulk", web::post().to(create_bulk_orders))
            .route("/check-in", web::post().to(check_in))
            .route("/noshow-sweep", web::post().to(run_noshow_sweep))
            .route("/{id}/cancel", web::post().to(cancel_order)),
    );
}
