//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::auth::JwtGenerator;
use crate::infrastructure::user::UserServiceTrait;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
    pub jwt_service: Arc<dyn JwtGenerator>,
}

impl AppState {
    pub fn new(user_service: Arc<dyn UserServiceTrait>, jwt_service: Arc<dyn JwtGenerator>) -> Self {
        Self {
            user_service,
            jwt_service,
        }
    }
}
