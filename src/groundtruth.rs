//! Detection of incomplete or invalid ground-truth triplets.
//!
//! A triplet is `<prefix>.tif`, `<prefix>.box` and `<prefix>.gt.txt`. It is
//! valid when all three files exist and the text file is not blank.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::fileutil;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    MissingFile { file: String },
    BlankText { file: String },
    Unreadable { file: String, reason: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MissingFile { file } => write!(f, "Missing file: {}", file),
            Issue::BlankText { file } => write!(f, "{} is blank", file),
            Issue::Unreadable { file, reason } => write!(f, "{} could not be read: {}", file, reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileGroup {
    pub prefix: OsString,
}

impl FileGroup {
    pub fn new(prefix: impl Into<OsString>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Prefix for reports; invalid UTF-8 is replaced.
    pub fn display_prefix(&self) -> String {
        self.prefix.to_string_lossy().into_owned()
    }

    pub fn image_file(&self) -> OsString {
        fileutil::with_suffix(&self.prefix, ".tif")
    }

    pub fn box_file(&self) -> OsString {
        fileutil::with_suffix(&self.prefix, ".box")
    }

    pub fn text_file(&self) -> OsString {
        fileutil::with_suffix(&self.prefix, ".gt.txt")
    }

    /// The three expected file names, in check order.
    pub fn files(&self) -> [OsString; 3] {
        [self.image_file(), self.box_file(), self.text_file()]
    }

    /*Validates the group against the files in a directory.
    Parameters:
    - dir: &Path = The directory holding the triplet.
    Return:
    - Vec<Issue> = Missing files first (tif, box, gt.txt), then the text check. Empty when valid.
    */
    pub fn validate(&self, dir: &Path) -> Vec<Issue> {
        let mut issues: Vec<Issue> = Vec::new();

        for file in self.files() {
            if !fileutil::is_regular_file(&dir.join(&file)) {
                issues.push(Issue::MissingFile {
                    file: file.to_string_lossy().into_owned(),
                });
            }
        }

        let text_file: OsString = self.text_file();
        let text_path = dir.join(&text_file);
        if fileutil::is_regular_file(&text_path) {
            let file: String = text_file.to_string_lossy().into_owned();
            //Un archivo que no es UTF-8 se reporta como problema del grupo, no aborta el escaneo
            match fs::read_to_string(&text_path) {
                Ok(text) if text.trim().is_empty() => issues.push(Issue::BlankText { file }),
                Ok(_) => {}
                Err(err) => issues.push(Issue::Unreadable {
                    file,
                    reason: err.to_string(),
                }),
            }
        }

        issues
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidGroup {
    /// Lossy form of `group.prefix`, used in reports.
    pub prefix: String,
    pub issues: Vec<Issue>,
    #[serde(skip)]
    pub group: FileGroup,
}

impl InvalidGroup {
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|issue| issue.to_string()).collect()
    }
}

/// Distinct groups found in `dir`, sorted alphanumerically by prefix.
pub fn scan_groups(dir: &Path) -> Result<Vec<FileGroup>> {
    let names: Vec<OsString> = fileutil::list_gt_files(dir)?;

    let mut seen: HashSet<&OsStr> = HashSet::new();
    let mut prefixes: Vec<&OsStr> = Vec::new();
    for name in &names {
        let prefix: &OsStr = fileutil::derive_prefix(name);
        debug!(file = ?name, prefix = ?prefix, "found ground-truth file");
        if seen.insert(prefix) {
            prefixes.push(prefix);
        }
    }
    alphanumeric_sort::sort_os_str_slice(&mut prefixes[..]);

    Ok(prefixes.into_iter().map(FileGroup::new).collect())
}

/*Finds the invalid ground-truth groups of a directory. Read-only.
Parameters:
- dir: &Path = The directory to scan.
Return:
- Result<Vec<InvalidGroup>> = One entry per prefix with at least one issue. Fails with GtError::FileSystem when the directory cannot be listed.
*/
pub fn find_invalid_groups(dir: &Path) -> Result<Vec<InvalidGroup>> {
    let groups: Vec<FileGroup> = scan_groups(dir)?;
    let mut invalid: Vec<InvalidGroup> = Vec::new();

    for group in groups {
        let issues: Vec<Issue> = group.validate(dir);
        if !issues.is_empty() {
            invalid.push(InvalidGroup {
                prefix: group.display_prefix(),
                issues,
                group,
            });
        }
    }
    debug!(dir = %dir.display(), invalid = invalid.len(), "scan finished");

    Ok(invalid)
}
