//! Library facade for ddi-prep.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod folds;
pub mod logging;
pub mod molecule;
pub mod sampling;
