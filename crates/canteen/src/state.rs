use crate::di::DependenciesInject;
use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::DynJwtService,
    config::{ConnectionPool, JwtConfig},
};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub jwt_config: DynJwtService,
    pub di_container: DependenciesInject,
    pub registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("deps", &self.di_container)
            .field("registry", &"Registry")
            .finish()
    }
}

impl AppState {
    pub async fn new(pool: ConnectionPool, jwt_secret: &str) -> Result<Self> {
        let jwt_config = Arc::new(JwtConfig::new(jwt_secret)) as DynJwtService;
        let registry = Arc::new(Mutex::new(Registry::default()));

        let di_container = DependenciesInject::new(pool, registry.clone())
            .await
            .context("Failed to initialize dependency injection container")?;

        Ok(Self {
            jwt_config,
            di_container,
            registry,
        })
    }
}
