//! SBI Constants
//!
//! HTTP status codes, methods, header names and content types.

/// HTTP Status Codes
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const NO_CONTENT: u16 = 204;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const METHOD_NOT_ALLOWED: u16 = 405;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
    pub const GATEWAY_TIMEOUT: u16 = 504;
}

/// HTTP Methods
pub mod method {
    pub const DELETE: &str = "DELETE";
    pub const GET: &str = "GET";
    pub const PATCH: &str = "PATCH";
    pub const POST: &str = "POST";
    pub const PUT: &str = "PUT";
}

/// HTTP header names used between network functions
pub mod header {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const LOCATION: &str = "Location";
    /// NF type of the sending network function
    pub const NF_TYPE: &str = "NF-Type";
    /// NF instance id of the sending network function
    pub const NF_INSTANCE_ID: &str = "NF-Instance-Id";
}

/// Content types
pub mod content_type {
    pub const JSON: &str = "application/json";
    pub const PROBLEM_JSON: &str = "application/problem+json";
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
}
