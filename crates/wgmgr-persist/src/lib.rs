//! Storage for wgmgr mesh configurations.
//!
//! The engine never touches the filesystem. Callers load a [`MeshConfig`]
//! from a [`Backend`], mutate it and save it back. Writes go to a temporary
//! file in the target directory that is then renamed over the target.
//!
//! Nothing here locks across processes; concurrent writers must coordinate
//! among themselves.
//!
//! [`MeshConfig`]: wgmgr_config::MeshConfig

#![forbid(unsafe_code)]

mod backend;
pub mod error;

pub use backend::{Backend, DocumentKeyBackend, FileBackend, DEFAULT_DOCUMENT_KEY};
pub use error::StoreError;
