use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::Category;

/// Errors produced by catalog loading and avatar generation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read trait directory {dir}: {source}")]
    Catalog {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required category (background, base, eyes) has no assets to roll.
    #[error("category '{0}' has no traits to choose from")]
    EmptyCategory(Category),

    /// The background layer could not be read or decoded. Unlike overlay
    /// layers, the background is the canvas and cannot be skipped.
    #[error("failed to load background '{filename}': {source}")]
    Background {
        filename: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode avatar image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to write avatar image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
