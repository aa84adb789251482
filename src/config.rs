use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 本地时区相对 UTC 的小时偏移（所有班次时间按该时区解释）
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// 时钟静态校正毫秒数（NTP 校正的占位，默认 0）
    #[serde(default)]
    pub clock_correction_ms: i64,
    #[serde(default = "default_noshow_sweep_interval_secs")]
    pub noshow_sweep_interval_secs: u64,
    #[serde(default = "default_blacklist_sweep_interval_secs")]
    pub blacklist_sweep_interval_secs: u64,
    #[serde(default)]
    pub rate_limiting: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// 关闭时所有检查放行（fail-open 必须是显式配置，而不是后端缺失时的默认行为）
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_rate_window_secs")]
    pub window_secs: u64,
}

fn default_utc_offset_hours() -> i32 {
    8
}

fn default_noshow_sweep_interval_secs() -> u64 {
    600
}

fn default_blacklist_sweep_interval_secs() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_rate_window_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            clock_correction_ms: 0,
            noshow_sweep_interval_secs: default_noshow_sweep_interval_secs(),
            blacklist_sweep_interval_secs: default_blacklist_sweep_interval_secs(),
            rate_limiting: RateLimitConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            window_secs: default_rate_window_secs(),
        }
    }
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str)
                    .map_err(|e| anyhow::anyhow!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")
                })?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    app: AppConfig {
                        utc_offset_hours: get_env_parse("APP_UTC_OFFSET_HOURS", 8i32),
                        clock_correction_ms: get_env_parse("APP_CLOCK_CORRECTION_MS", 0i64),
                        noshow_sweep_interval_secs: get_env_parse(
                            "APP_NOSHOW_SWEEP_INTERVAL_SECS",
                            600u64,
                        ),
                        blacklist_sweep_interval_secs: get_env_parse(
                            "APP_BLACKLIST_SWEEP_INTERVAL_SECS",
                            3600u64,
                        ),
                        rate_limiting: RateLimitConfig {
                            enabled: get_env_parse("APP_RATE_LIMITING_ENABLED", true),
                            max_attempts: get_env_parse("APP_RATE_LIMIT_MAX_ATTEMPTS", 5u32),
                            window_secs: get_env_parse("APP_RATE_LIMIT_WINDOW_SECS", 300u64),
                        },
                    },
                }
            }
            Err(e) => {
                return Err(anyhow::anyhow!("无法读取配置文件 {config_path}: {e}"));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("APP_UTC_OFFSET_HOURS")
            && let Ok(n) = v.parse()
        {
            config.app.utc_offset_hours = n;
        }
        if let Ok(v) = env::var("APP_CLOCK_CORRECTION_MS")
            && let Ok(n) = v.parse()
        {
            config.app.clock_correction_ms = n;
        }
        if let Ok(v) = env::var("APP_NOSHOW_SWEEP_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            config.app.noshow_sweep_interval_secs = n;
        }
        if let Ok(v) = env::var("APP_BLACKLIST_SWEEP_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            config.app.blacklist_sweep_interval_secs = n;
        }
        if let Ok(v) = env::var("APP_RATE_LIMITING_ENABLED")
            && let Ok(b) = v.parse()
        {
            config.app.rate_limiting.enabled = b;
        }
        if let Ok(v) = env::var("APP_RATE_LIMIT_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            config.app.rate_limiting.max_attempts = n;
        }
        if let Ok(v) = env::var("APP_RATE_LIMIT_WINDOW_SECS")
            && let Ok(n) = v.parse()
        {
            config.app.rate_limiting.window_secs = n;
        }

        // 班次时间按固定时区解释，偏移必须合法
        if config.app.utc_offset_hours < -12 || config.app.utc_offset_hours > 14 {
            return Err(anyhow::anyhow!(
                "APP_UTC_OFFSET_HOURS 超出范围: {}",
                config.app.utc_offset_hours
            ));
        }

        Ok(config)
    }
}
