//! # Middleware
//!
//! Request logging and cross-origin policy for the API.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

/// Returns the standard request logger for the Town Chronicle API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// The browser client may be served from a different origin than the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600)
}
