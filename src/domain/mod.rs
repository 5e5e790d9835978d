//! Domain layer types.

pub mod content;
pub mod provider;
pub mod resources;
