//! Ground-truth preparation for Tesseract training: validation and cleanup of
//! `<prefix>.tif` / `<prefix>.box` / `<prefix>.gt.txt` triplets, and corpus
//! sampling through `text2image`.

pub mod cleanup;
pub mod error;
pub mod fileutil;
pub mod groundtruth;
pub mod logging;
pub mod sampler;
pub mod text2image;

pub use cleanup::{
    execute_removal, plan_removal, remove_invalid_groups, remove_invalid_groups_with, CleanOptions, FileAction,
    FileOutcome, RemovalPlan, RemovalReport, RemovalTarget,
};
pub use error::GtError;
pub use groundtruth::{find_invalid_groups, FileGroup, InvalidGroup, Issue};
pub use sampler::{generate, SampleOptions, SampleReport};
pub use text2image::{RenderParams, Renderer, Text2Image};
