pub mod database {
    pub mod actions;
    pub mod csv_load;
    pub mod error;
    pub mod pagination;
    pub mod schema;
}
pub mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
pub mod routes {
    pub mod api;
    pub mod helpers;
    pub mod ingredients;
    pub mod recipes;
    pub mod tags;
    pub mod users;
}
pub mod config;
pub mod constants;
pub mod serializers;
pub mod validation;

pub use authentication::*;
pub use config::Config;
pub use constants::*;
pub use database::*;
