pub mod auth;
pub mod enrollment;
pub mod error;
pub mod grade;
pub mod report;

pub use auth::AuthService;
pub use enrollment::EnrollmentService;
pub use error::ServiceError;
pub use grade::GradeService;
pub use report::ReportService;
