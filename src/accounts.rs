// src/accounts.rs

//! Registered accounts (`users.json`) and self-provisioned sellers (`sellers.json`).

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;

use crate::{
    error::AppError,
    models::user::{Role, Seller, User, UserBook},
    store::{Shared, Store, StoreError},
    utils::hash::{hash_password, verify_password},
};

pub struct Accounts {
    users: Shared<UserBook>,
    sellers: Shared<Vec<Seller>>,
}

impl Accounts {
    pub fn new(users: Arc<dyn Store<UserBook>>, sellers: Arc<dyn Store<Vec<Seller>>>) -> Self {
        Self {
            users: Shared::new(users),
            sellers: Shared::new(sellers),
        }
    }

    /// Creates an account with `role`. Fails with `Conflict` if the username is taken.
    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> Result<(), AppError> {
        let mut users = self.users.begin().await?;
        if users.contains_key(username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }

        let password = hash_password(password)?;
        users.insert(username.to_string(), User { password, role });
        users.commit().await?;

        tracing::info!("User registered: {} ({})", username, role);
        Ok(())
    }

    /// Verifies credentials and returns the account's role.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Role, AppError> {
        let users = self.users.snapshot().await?;
        let user = users
            .get(username)
            .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

        if !verify_password(password, &user.password)? {
            return Err(AppError::AuthError("Invalid credentials".to_string()));
        }
        Ok(user.role)
    }

    /// Seeds an admin account unless the username already exists.
    /// Returns `true` when an account was created.
    pub async fn seed_admin(&self, username: &str, password: &str) -> Result<bool, AppError> {
        match self.create_user(username, password, Role::Admin).await {
            Ok(()) => Ok(true),
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Finds the seller case-insensitively, creating it on first use.
    pub async fn seller_login(&self, seller_id: &str) -> Result<Seller, StoreError> {
        let seller_id = seller_id.trim().to_lowercase();
        let mut sellers = self.sellers.begin().await?;

        if let Some(existing) = sellers.iter().find(|s| s.seller_id == seller_id) {
            return Ok(existing.clone());
        }

        let seller = Seller {
            seller_id,
            created_at: Utc::now(),
        };
        sellers.push(seller.clone());
        sellers.commit().await?;

        tracing::info!("Seller provisioned: {}", seller.seller_id);
        Ok(seller)
    }

    /// Ids of every known seller.
    pub async fn seller_ids(&self) -> Result<HashSet<String>, StoreError> {
        let sellers = self.sellers.snapshot().await?;
        Ok(sellers.into_iter().map(|s| s.seller_id).collect())
    }
}
