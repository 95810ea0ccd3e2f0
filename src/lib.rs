//! highland-syringe - Fountain in and out of Highland projects
//!
//! Pulls the screenplay text out of a `.highland` project as a `.fountain`
//! file, and injects edited Fountain text back into a copy of the project
//! with its revision record kept in step.

pub mod archive;
pub mod bundle;
pub mod config;
pub mod error;
pub mod paths;
pub mod revision;
pub mod syringe;

#[cfg(test)]
mod testutil;

pub use config::{Compression, SyringeConfig};
pub use error::{ErrorKind, ExtractionError, InjectionError, SyringeError};
pub use syringe::{extract, inject, ProjectInfo, RevisionInfo, Syringe};
