//! Configuration: schema types, file discovery, env substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config, set_config_dir},
    schema::ParleyConfig,
};
