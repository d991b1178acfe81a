pub mod common;
pub mod group_requests;
pub mod groups;
pub mod health;
pub mod passwords;
pub mod sessions;
pub mod users;

use crate::{
    db::DbPool,
    mailer::Mailer,
    services::{
        group_requests::GroupRequestService, groups::GroupService,
        password_reset::PasswordResetService, users::UserService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub groups: Arc<GroupService>,
    pub group_requests: Arc<GroupRequestService>,
    pub password_reset: Arc<PasswordResetService>,
}

impl AppServices {
    /// Build the service container shared by all handlers
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn Mailer>, mail_from: String) -> Self {
        Self {
            users: Arc::new(UserService::new(db.clone())),
            groups: Arc::new(GroupService::new(db.clone())),
            group_requests: Arc::new(GroupRequestService::new(db.clone())),
            password_reset: Arc::new(PasswordResetService::new(db, mailer, mail_from)),
        }
    }
}
