//! Configuration bits for reconfigurable fabrics.
//!
//! For every tile type the pipeline runs in three stages:
//!
//! 1. [`alloc`] walks the tile's configuration entities and gives each bel
//!    and multiplexer a contiguous range of logical bits.
//! 2. [`encode`] maps logical bits to physical frame positions using a
//!    [`ConfigMem`] table, either loaded or generated by the default policy.
//! 3. [`feature_table`] names every configurable choice and lists the
//!    physical bits and values that select it.
//!
//! [`compile_fabric`] runs the pipeline for every tile type in a fabric in
//! parallel, and [`BitstreamSpec`] gathers the results into the document a
//! bitstream assembler consumes. [`ConfigImage`] and [`fasm`] go the other
//! way, turning a list of enabled features into frame data.

#![warn(missing_docs)]

pub mod alloc;
pub mod compile;
pub mod config_bits;
pub mod config_mem;
pub mod encode;
pub mod error;
pub mod fasm;
pub mod feature_table;
pub mod mux;
pub mod spec;

#[cfg(test)]
mod testing;

pub use alloc::{allocate, AllocationRecord, BitRange, ConfigPorts, TileAllocation};
pub use compile::{compile_fabric, compile_tile, CompiledFabric, CompiledTile};
pub use config_bits::{ConfigBit, ConfigFrame, ConfigImage, FrameAddress};
pub use config_mem::{ConfigMem, ConfigMemEntry};
pub use encode::{EncodeDict, FrameLatch};
pub use error::BitstreamError;
pub use fasm::{assemble, parse_fasm, FasmFeature, FasmOutput};
pub use feature_table::{BitValue, FeatureBits, FeatureTable};
pub use mux::{MuxComponent, MuxPin, MuxRecord, PinNet};
pub use spec::{ArchSpecs, BitstreamSpec};
