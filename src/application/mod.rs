//! Application services: fetching, normalizing and caching content.

pub mod content;
pub mod error;
pub mod images;
pub mod normalize;
pub mod source;
