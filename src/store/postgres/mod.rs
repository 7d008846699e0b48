// Postgres implementations of the store ports.
pub mod courses;
pub mod enrollments;
pub mod grades;
pub mod reports;
pub mod students;
pub mod terms;
pub mod users;

pub use courses::PgCourseStore;
pub use enrollments::PgEnrollmentStore;
pub use grades::PgGradeStore;
pub use reports::PgReportStore;
pub use students::PgStudentStore;
pub use terms::PgTermStore;
pub use users::PgUserStore;
