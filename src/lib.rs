//! folio: cached access to portfolio content served by a headless CMS.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
