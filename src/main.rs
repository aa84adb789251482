use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use canteen_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    events::EventBroadcaster,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::{JwtService, RateLimiter, SystemClock},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // 统一时钟：固定时区 + 静态校正，所有业务时间判断都走它
    let clock = Arc::new(SystemClock::new(
        config.app.utc_offset_hours,
        config.app.clock_correction_ms,
    ));

    // 登录与批量下单的限流器；enabled=false 时显式放行
    let rate_limiter = Arc::new(RateLimiter::new(&config.app.rate_limiting));

    // 事件广播（推送网关订阅，核心只管发出）
    let events = EventBroadcaster::new(256);

    // 创建服务
    let settings_service = SettingsService::new(pool.clone());
    let blacklist_service = BlacklistService::new(pool.clone(), clock.clone());
    let auth_service = AuthService::new(pool.clone(), jwt_service.clone(), rate_limiter.clone());
    let user_service = UserService::new(pool.clone());
    let shift_service = ShiftService::new(pool.clone());
    let holiday_service = HolidayService::new(pool.clone());
    let order_service = OrderService::new(
        pool.clone(),
        clock.clone(),
        settings_service.clone(),
        blacklist_service.clone(),
        events.clone(),
        rate_limiter.clone(),
    );
    let checkin_service = CheckinService::new(pool.clone(), clock.clone(), events.clone());
    let noshow_service = NoShowService::new(
        pool.clone(),
        clock.clone(),
        settings_service.clone(),
        events.clone(),
    );

    // 启动后台任务：未取餐扫单 + 黑名单到期清理
    tasks::spawn_all(
        noshow_service.clone(),
        blacklist_service.clone(),
        config.app.noshow_sweep_interval_secs,
        config.app.blacklist_sweep_interval_secs,
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(checkin_service.clone()))
            .app_data(web::Data::new(noshow_service.clone()))
            .app_data(web::Data::new(shift_service.clone()))
            .app_data(web::Data::new(holiday_service.clone()))
            .app_data(web::Data::new(settings_service.clone()))
            .app_data(web::Data::new(blacklist_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::order_config)
                    .configure(handlers::shift_config)
                    .configure(handlers::holiday_config)
                    .configure(handlers::settings_config)
                    .configure(handlers::blacklist_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
