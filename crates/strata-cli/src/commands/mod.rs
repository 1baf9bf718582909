//! CLI command implementations

pub mod categories;
pub mod clean;
pub mod generate;
pub mod init;
pub mod palette;
pub mod verify;
