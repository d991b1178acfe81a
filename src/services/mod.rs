// Core services
pub mod group_requests;
pub mod groups;
pub mod password_reset;
pub mod users;
