use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GtError {
    #[error("cannot access directory {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read corpus {path}: {source}")]
    Corpus {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corpus {0} has no non-blank lines")]
    EmptyCorpus(PathBuf),
}

pub type Result<T> = std::result::Result<T, GtError>;
