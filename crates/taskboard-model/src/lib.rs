//! Domain types shared by the taskboard store and pipeline crates.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;

pub mod wire;
