pub mod assignments;
pub mod auth;
pub mod classrooms;
pub mod invitations;
pub mod members;
pub mod projects;
pub mod rubrics;
pub mod teams;

pub use auth::configure_auth_routes;
pub use classrooms::configure_classroom_routes;
pub use invitations::configure_invitation_routes;
