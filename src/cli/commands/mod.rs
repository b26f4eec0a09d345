pub mod admin;
pub mod auth;
pub mod instructor;
pub mod report;
pub mod route;
pub mod student;
