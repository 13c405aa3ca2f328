//! Core data type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cookie carrying the short-lived bearer credential
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the long-lived refresh credential (http-only, backend managed)
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
/// Access token lifetime used for the cookie we write ourselves
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const LOGOUT_PATH: &str = "/logout";
pub const PROFILE_PATH: &str = "/profile";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const FORBIDDEN_PATH: &str = "/403";

/// Numeric role classifier assigned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum Role {
    Admin,
    Seller,
    Customer,
    /// A code the storefront does not know. Never granted a protected route.
    Unknown(u16),
}

impl Role {
    pub const ADMIN_CODE: u16 = 1995;
    pub const SELLER_CODE: u16 = 1996;
    pub const CUSTOMER_CODE: u16 = 2004;

    pub fn code(self) -> u16 {
        match self {
            Role::Admin => Self::ADMIN_CODE,
            Role::Seller => Self::SELLER_CODE,
            Role::Customer => Self::CUSTOMER_CODE,
            Role::Unknown(code) => code,
        }
    }

    /// Staff roles see the dashboard
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Seller)
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Seller => "Seller",
            Role::Customer => "Customer",
            Role::Unknown(_) => "Unknown",
        }
    }
}

impl From<u16> for Role {
    fn from(code: u16) -> Self {
        match code {
            Self::ADMIN_CODE => Role::Admin,
            Self::SELLER_CODE => Role::Seller,
            Self::CUSTOMER_CODE => Role::Customer,
            other => Role::Unknown(other),
        }
    }
}

impl From<Role> for u16 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unknown(code) => write!(f, "unknown({})", code),
            known => write!(f, "{}", known.label().to_lowercase()),
        }
    }
}

/// Profile returned by `GET /account`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub role: Role,
}

impl UserProfile {
    /// Name to show in menus
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Body of a successful `POST /auth/refresh-token`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Body of a successful login or register call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Credentials posted to `/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Fields posted to `/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Where to send a user right after login
pub fn post_login_destination(role: Role) -> &'static str {
    if role.is_staff() {
        DASHBOARD_PATH
    } else {
        HOME_PATH
    }
}
