// src/config/mod.rs
pub mod ai;
pub mod digest;

pub use ai::AiConfig;
pub use digest::{load_config_default, load_config_from, DigestConfig};
