// Core entities and the request principal shared across services and stores.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-term ceiling on the sum of credits a student may be enrolled in.
pub const MAX_CREDITS_PER_TERM: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified identity attached to every request by the auth middleware.
/// The engines trust this input; credential parsing happens upstream.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Term {
    pub id: i64,
    pub term_code: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: i64,
    pub course_no: String,
    pub name: String,
    pub teacher_id: i64,
    pub hours: i32,
    pub credits: i32,
    pub class_time: String,
    pub class_location: String,
    pub exam_time: String,
}

/// Denormalized {id, credits} projection used by the enrollment engine.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CourseRef {
    pub id: i64,
    pub credits: i32,
}

/// Id-only projection resolved from a student_no.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StudentRef {
    pub id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub student_id: Option<i64>,
    pub staff_id: Option<i64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub term_id: i64,
    pub created_at: DateTime<Utc>,
}
