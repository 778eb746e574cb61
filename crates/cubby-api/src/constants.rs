/// API path prefix for all routes except health.
pub const API_PREFIX: &str = "/api/v0";
