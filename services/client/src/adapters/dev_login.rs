//! services/client/src/adapters/dev_login.rs
//!
//! Local credential table for working while the backend is down.
//! Only compiled with the `dev-fallback` feature. Sessions issued here carry a
//! `dev-local-` token the backend will reject, so the first authenticated
//! call ends them.

use infradoc_core::domain::{LoginGrant, Role, UserProfile};

struct DevAccount {
    username: &'static str,
    password: &'static str,
    role: Role,
    department: &'static str,
    display_name: &'static str,
}

const DEV_ACCOUNTS: &[DevAccount] = &[
    DevAccount {
        username: "admin",
        password: "admin",
        role: Role::Admin,
        department: "admin",
        display_name: "Administrator",
    },
    DevAccount {
        username: "engineer",
        password: "engineer",
        role: Role::User,
        department: "engineering",
        display_name: "Engineering Lead",
    },
    DevAccount {
        username: "operations",
        password: "operations",
        role: Role::User,
        department: "operations",
        display_name: "Infrastructure Manager",
    },
];

pub const DEV_TOKEN_PREFIX: &str = "dev-local-";

pub fn dev_login(username: &str, password: &str) -> Option<LoginGrant> {
    DEV_ACCOUNTS
        .iter()
        .find(|a| a.username == username && a.password == password)
        .map(|account| LoginGrant {
            token: format!("{}{}", DEV_TOKEN_PREFIX, account.username),
            profile: UserProfile {
                id: format!("DEV-{}", account.username.to_ascii_uppercase()),
                username: account.username.to_string(),
                email: format!("{}@infraco.local", account.username),
                role: account.role,
                department: account.department.to_string(),
                display_name: account.display_name.to_string(),
            },
        })
}
