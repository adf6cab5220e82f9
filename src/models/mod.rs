pub mod assignments;
pub mod auth;
pub mod classrooms;
pub mod common;
pub mod grading;
pub mod invitations;
pub mod projects;
pub mod reports;
pub mod teams;
pub mod user_classrooms;
pub mod users;

pub use common::{ApiResponse, ErrorCode, PaginatedResponse, PaginationInfo, PaginationQuery};

#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
