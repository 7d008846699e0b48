pub mod auth;
pub mod enrollments;
pub mod grades;
pub mod health;
pub mod reports;

/// Treats empty query-string values the same as absent ones.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
