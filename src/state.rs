use crate::{auth::AuthService, db::UserStore, utils::Config};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub auth_service: Arc<AuthService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, config: Config) -> Self {
        Self {
            store,
            auth_service: Arc::new(AuthService::new(&config.jwt)),
            config: Arc::new(config),
        }
    }
}
