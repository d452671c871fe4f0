use std::sync::Arc;

use db::DBService;
use sqlx::SqlitePool;

use crate::{auth::JwtService, config::ServerConfig};

#[derive(Clone)]
pub struct AppState {
    db: DBService,
    jwt: Arc<JwtService>,
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: DBService, config: ServerConfig) -> Self {
        let jwt = JwtService::new(config.auth_secret.clone());
        Self {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn jwt(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
