//! account-sync library
//!
//! Two cooperating services built from one crate: the accounts service
//! (registration, login, email confirmation, password reset, account
//! administration) and the products service (catalog plus the owner
//! visibility gate the accounts service drives).

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod logger;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod server;
pub mod services;
pub mod state;
pub mod utils;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
