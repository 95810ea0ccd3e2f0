//! Archive handling for Highland project files.
//!
//! Staging copies a project into a scratch workspace and unpacks it with
//! the zip crate. Packing walks the workspace back into a new archive.

pub mod pack;
pub mod workspace;

pub use pack::{write_archive_atomically, ArchiveBuilder};
pub use workspace::{
    cleanup_stale_workspaces, stage, unpack_zip, StageMode, StagedArchive, Workspace,
};
