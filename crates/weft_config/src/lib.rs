//! Parsing and validation of `fabric.toml` fabric descriptions.
//!
//! This crate reads the fabric description and produces a strongly-typed
//! [`FabricFile`]: global parameters, the tile library with ports and bels,
//! the grid, and super tile layouts. Switch-matrix and ConfigMem files it
//! references are resolved against the description's directory but loaded
//! by the caller.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_config, DEFAULT_FILE_NAME};
pub use resolve::{assemble_fabric, resolve_tile_sources, TileSources};
pub use types::*;
