// src/state.rs

use std::{collections::BTreeMap, sync::Arc};

use axum::extract::FromRef;

use crate::{
    accounts::Accounts,
    attempts::AttemptManager,
    catalog::Catalog,
    config::Config,
    error::AppError,
    models::{
        attempt::AttemptBook,
        quiz::Quiz,
        user::{Seller, UserBook},
    },
    store::JsonFile,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub accounts: Arc<Accounts>,
    pub catalog: Arc<Catalog>,
    pub attempts: Arc<AttemptManager>,
}

impl AppState {
    /// Opens the JSON data files under `config.data_dir`, creating empty ones
    /// where missing, and seeds the configured admin account.
    pub async fn open(config: Config) -> Result<Self, AppError> {
        let dir = &config.data_dir;

        let users = Arc::new(JsonFile::<UserBook>::new(dir.join("users.json")));
        let sellers = Arc::new(JsonFile::<Vec<Seller>>::new(dir.join("sellers.json")));
        let quizzes = Arc::new(JsonFile::<Vec<Quiz>>::new(dir.join("quizzes.json")));
        let attempts = Arc::new(JsonFile::<AttemptBook>::new(dir.join("attempts.json")));

        users.ensure(&BTreeMap::new()).await?;
        sellers.ensure(&Vec::new()).await?;
        quizzes.ensure(&Vec::new()).await?;
        attempts.ensure(&BTreeMap::new()).await?;

        let accounts = Arc::new(Accounts::new(users, sellers));
        let catalog = Arc::new(Catalog::new(quizzes));
        let attempts = Arc::new(AttemptManager::new(
            attempts,
            catalog.clone(),
            config.session_timeout(),
        ));

        if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
            if accounts.seed_admin(username, password).await? {
                tracing::info!("Seeded admin user: {}", username);
            }
        }

        Ok(Self {
            config,
            accounts,
            catalog,
            attempts,
        })
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Accounts> {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for Arc<AttemptManager> {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}
