use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::user::create_user,
        handlers::user::list_users,
        handlers::user::reset_no_show,
        handlers::order::create_order,
        handlers::order::create_bulk_orders,
        handlers::order::get_orders,
        handlers::order::cancel_order,
        handlers::order::check_in,
        handlers::order::run_noshow_sweep,
        handlers::shift::list_shifts,
        handlers::shift::create_shift,
        handlers::shift::update_shift,
        handlers::holiday::list_holidays,
        handlers::holiday::create_holiday,
        handlers::holiday::delete_holiday,
        handlers::settings::get_settings,
        handlers::settings::update_settings,
        handlers::blacklist::list_blacklists,
        handlers::blacklist::create_blacklist,
        handlers::blacklist::deactivate_blacklist,
    ),
    components(
        schemas(
            LoginRequest,
            RefreshRequest,
            AuthResponse,
            UserResponse,
            CreateUserRequest,
            UserQuery,
            UserRole,
            CreateOrderRequest,
            BulkOrderItem,
            BulkCreateOrderRequest,
            BulkOrderFailure,
            BulkOrderResponse,
            CancelOrderRequest,
            CheckInRequest,
            OrderQuery,
            OrderResponse,
            OrderStatus,
            SweepReport,
            BlacklistedSummary,
            CreateShiftRequest,
            UpdateShiftRequest,
            ShiftListQuery,
            ShiftResponse,
            CreateHolidayRequest,
            HolidayQuery,
            HolidayResponse,
            CreateBlacklistRequest,
            BlacklistQuery,
            BlacklistResponse,
            SettingsResponse,
            UpdateSettingsRequest,
            CutoffMode,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "认证"),
        (name = "user", description = "用户"),
        (name = "order", description = "订餐"),
        (name = "shift", description = "班次"),
        (name = "holiday", description = "节假日"),
        (name = "settings", description = "系统配置"),
        (name = "blacklist", description = "黑名单")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
