// src/models/user.rs

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Caller role. Sellers are self-provisioned; the others are registered accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Student,
    Seller,
}

impl Role {
    /// Roles that take quizzes and own attempt history.
    pub fn takes_quizzes(self) -> bool {
        matches!(self, Role::Student | Role::Seller)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Student => "student",
            Role::Seller => "seller",
        };
        f.write_str(s)
    }
}

/// A registered account, keyed by username in `users.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Argon2 password hash.
    pub password: String,

    pub role: Role,
}

/// username -> account. Persisted as `users.json`.
pub type UserBook = BTreeMap<String, User>;

/// A self-provisioned seller identity, persisted in `sellers.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    /// Lower-cased seller id.
    pub seller_id: String,
    pub created_at: DateTime<Utc>,
}

/// DTO for registration and login.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for seller login. The seller is created on first use.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SellerLoginRequest {
    #[validate(length(min = 1, max = 64, message = "Seller ID is required"))]
    pub seller_id: String,
}
