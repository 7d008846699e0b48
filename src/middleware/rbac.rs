// Coarse role gates applied at the route layer, mirroring the per-group
// access rules: fine-grained ownership checks stay in the services.
use axum::{extract::Request, middleware::Next, response::Response, Extension};

use crate::domain::{Principal, Role};
use crate::error::ApiError;

fn require(principal: &Principal, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden("insufficient role"))
    }
}

/// Enrollment writes: admins enroll anyone, students enroll themselves.
pub async fn require_enroll_writer(
    Extension(principal): Extension<Principal>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require(&principal, &[Role::Admin, Role::Student])?;
    Ok(next.run(request).await)
}

/// Grade writes: admins and teachers (teacher course ownership is enforced
/// in the grade service).
pub async fn require_grade_writer(
    Extension(principal): Extension<Principal>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require(&principal, &[Role::Admin, Role::Teacher])?;
    Ok(next.run(request).await)
}

/// Roster and grade reports: admins and teachers.
pub async fn require_report_reader(
    Extension(principal): Extension<Principal>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require(&principal, &[Role::Admin, Role::Teacher])?;
    Ok(next.run(request).await)
}
