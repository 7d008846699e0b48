pub mod auth;
pub mod rbac;
pub mod response;
