pub mod types;
pub mod utils;
pub mod pagination;
pub mod admin_http;
