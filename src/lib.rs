// Library root: re-exports all modules so integration tests and the two
// binaries can access the crate's public API.

pub mod cli;
pub mod compare;
pub mod config;
pub mod engine;
pub mod loader;
pub mod matrix;
pub mod output;
