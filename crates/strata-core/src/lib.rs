//! Strata Core - Foundational types for the Strata generator
//!
//! This crate provides the types every other Strata crate depends on:
//! - `Rgb`, `Channel` - Color values and the hex <-> RGB converters
//! - `ContentHash` - SHA-256 hashing of generated images
//! - Error types and Result alias

pub mod color;
mod error;
mod hash;

pub use color::{hex_to_rgb, random_hex_color, rgb_to_hex, Channel, Rgb};
pub use error::{Result, StrataError};
pub use hash::ContentHash;
