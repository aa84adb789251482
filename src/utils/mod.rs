pub mod clock;
pub mod cutoff;
pub mod jwt;
pub mod local_date;
pub mod pagination;
pub mod qr_token;
pub mod rate_limiter;
pub mod shift_window;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cutoff::CutoffPolicy;
pub use jwt::JwtService;
pub use pagination::{PaginatedResponse, PaginationParams};
pub use qr_token::generate_qr_token;
pub use rate_limiter::RateLimiter;
