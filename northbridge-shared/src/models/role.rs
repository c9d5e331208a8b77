/// Account roles
///
/// Every account table carries a `role` column of the Postgres enum
/// `account_role`. The role is also embedded in access tokens and selects
/// both the account validator and the capability rules for a request.
///
/// ```sql
/// CREATE TYPE account_role AS ENUM ('USER', 'VENDOR', 'ADMIN');
/// ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Shopper with a cart and orders
    User,

    /// Seller that owns stores and their products
    Vendor,

    /// Platform administrator
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Vendor => "VENDOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Lowercase name used in user-facing messages ("No account found for vendor ...")
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
