//! Asset loading
//!
//! The only external asset is the optional globe model. It is parsed from OBJ
//! text, either synchronously with [`ObjLoader`] or on a worker thread through
//! a one-shot [`ModelRequest`].

pub mod model_request;
pub mod obj_loader;

pub use model_request::{ModelEvent, ModelRequest, ModelSource};
pub use obj_loader::ObjLoader;

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed statement in a model file
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// Structurally invalid model
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The loader thread ended without reporting a result
    #[error("Model loader thread exited without a result")]
    WorkerLost,
}
