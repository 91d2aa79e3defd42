//! Shared foundational types used across the weft fabric compiler.
//!
//! This crate provides the immutable fabric parameter set, tile grid coordinates,
//! and the internal error type shared by every stage.

#![warn(missing_docs)]

pub mod coord;
pub mod fabric;
pub mod result;

pub use coord::TileCoord;
pub use fabric::{ConfigBitMode, FabricConfig, MultiplexerStyle, ParseModeError};
pub use result::{InternalError, WeftResult};
