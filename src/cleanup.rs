//! Removal of invalid ground-truth groups.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{GtError, Result};
use crate::fileutil;
use crate::groundtruth::{find_invalid_groups, InvalidGroup};

const QUARANTINE_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz1234567890";

#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Report what would be removed without touching the directory.
    pub dry_run: bool,
    /// Move files into a new directory under this path instead of deleting them.
    pub quarantine: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Deleted,
    Quarantined { to: PathBuf },
    WouldDelete,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAction {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RemovalReport {
    /// Every invalid prefix that was processed, even if some deletions failed.
    pub prefixes: Vec<String>,
    pub quarantine_dir: Option<PathBuf>,
    pub actions: Vec<FileAction>,
}

impl RemovalReport {
    pub fn failures(&self) -> impl Iterator<Item = &FileAction> {
        self.actions
            .iter()
            .filter(|action| matches!(action.outcome, FileOutcome::Failed { .. }))
    }
}

/// One invalid group and the files of it that existed at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalTarget {
    pub prefix: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct RemovalPlan {
    pub targets: Vec<RemovalTarget>,
}

/// Deletes every file of every invalid group and returns the processed prefixes.
pub fn remove_invalid_groups(dir: &Path) -> Result<Vec<String>> {
    let report: RemovalReport = remove_invalid_groups_with(dir, &CleanOptions::default())?;
    Ok(report.prefixes)
}

/*Removes the files of the invalid groups of a directory.
Parameters:
- dir: &Path = The directory to clean.
- options: &CleanOptions = Dry-run and quarantine settings.
Return:
- Result<RemovalReport> = The processed prefixes and one action per existing file.
Per-file failures are recorded in the report and never abort the run. Only a
directory listing failure (or failing to create the quarantine) is an error.
*/
pub fn remove_invalid_groups_with(dir: &Path, options: &CleanOptions) -> Result<RemovalReport> {
    let plan: RemovalPlan = plan_removal(dir)?;
    execute_removal(&plan, options)
}

/// Scans `dir` and lists the existing files of each invalid group. Read-only.
pub fn plan_removal(dir: &Path) -> Result<RemovalPlan> {
    let invalid: Vec<InvalidGroup> = find_invalid_groups(dir)?;
    let mut plan: RemovalPlan = RemovalPlan::default();
    plan.targets.reserve_exact(invalid.len());

    for group in invalid {
        let files: Vec<PathBuf> = group
            .group
            .files()
            .iter()
            .map(|name| dir.join(name))
            .filter(|path| fileutil::is_regular_file(path))
            .collect();
        plan.targets.push(RemovalTarget {
            prefix: group.prefix,
            files,
        });
    }

    Ok(plan)
}

/// Removes the planned files. A file that fails (or vanished since the scan)
/// is recorded as `FileOutcome::Failed` and the run goes on.
pub fn execute_removal(plan: &RemovalPlan, options: &CleanOptions) -> Result<RemovalReport> {
    let mut report: RemovalReport = RemovalReport::default();
    if plan.targets.is_empty() {
        return Ok(report);
    }

    //La carpeta de cuarentena solo se crea si realmente vamos a mover algo
    report.quarantine_dir = match (&options.quarantine, options.dry_run) {
        (Some(parent), false) => Some(create_quarantine_dir(parent)?),
        _ => None,
    };

    for target in &plan.targets {
        info!(prefix = %target.prefix, "removing files for prefix");
        for path in &target.files {
            let outcome: FileOutcome = if options.dry_run {
                info!(path = %path.display(), "would delete");
                FileOutcome::WouldDelete
            } else if let Some(quarantine) = &report.quarantine_dir {
                match path.file_name() {
                    Some(name) => quarantine_file(path, &quarantine.join(name)),
                    None => FileOutcome::Failed {
                        reason: "path has no file name".to_string(),
                    },
                }
            } else {
                delete_file(path)
            };
            report.actions.push(FileAction {
                path: path.clone(),
                outcome,
            });
        }
        report.prefixes.push(target.prefix.clone());
    }

    Ok(report)
}

fn delete_file(path: &Path) -> FileOutcome {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "deleted");
            FileOutcome::Deleted
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to delete");
            FileOutcome::Failed { reason: err.to_string() }
        }
    }
}

fn quarantine_file(path: &Path, target: &Path) -> FileOutcome {
    match move_file(path, target) {
        Ok(()) => {
            info!(path = %path.display(), to = %target.display(), "quarantined");
            FileOutcome::Quarantined { to: target.to_path_buf() }
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to quarantine");
            FileOutcome::Failed { reason: err.to_string() }
        }
    }
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    //rename falla entre sistemas de archivos distintos, en ese caso copiamos y borramos
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

/// Creates `GT_quarantine_<random>` under `parent` so earlier quarantines are never overwritten.
fn create_quarantine_dir(parent: &Path) -> Result<PathBuf> {
    let rand_str: String = random_string::generate(15, QUARANTINE_CHARSET);
    create_fresh_dir(parent, &format!("GT_quarantine_{}", rand_str))
}

/// Creates `parent/name`. The parent may be created, but `name` must not exist yet.
fn create_fresh_dir(parent: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(parent).map_err(|source| GtError::FileSystem {
        path: parent.to_path_buf(),
        source,
    })?;
    let mut dir: PathBuf = parent.to_path_buf();
    dir.push(name);

    fs::create_dir(&dir).map_err(|source| GtError::FileSystem {
        path: dir.clone(),
        source,
    })?;
    info!(dir = %dir.display(), "created quarantine directory");

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.tif", "");
        touch(dir.path(), "b.box", "");

        let options = CleanOptions { dry_run: true, quarantine: None };
        let report: RemovalReport = remove_invalid_groups_with(dir.path(), &options).unwrap();

        assert_eq!(report.prefixes, vec!["b".to_string()]);
        assert_eq!(report.actions.len(), 2);
        assert!(report.actions.iter().all(|a| a.outcome == FileOutcome::WouldDelete));
        assert!(dir.path().join("b.tif").exists());
        assert!(dir.path().join("b.box").exists());
    }

    #[test]
    fn quarantine_moves_files() {
        let dir = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        touch(dir.path(), "c.tif", "");
        touch(dir.path(), "c.box", "");
        touch(dir.path(), "c.gt.txt", "  ");
        touch(dir.path(), "ok.tif", "");
        touch(dir.path(), "ok.box", "");
        touch(dir.path(), "ok.gt.txt", "fine");

        let options = CleanOptions {
            dry_run: false,
            quarantine: Some(parent.path().to_path_buf()),
        };
        let report: RemovalReport = remove_invalid_groups_with(dir.path(), &options).unwrap();

        let quarantine: PathBuf = report.quarantine_dir.clone().unwrap();
        assert!(quarantine.starts_with(parent.path()));
        assert_eq!(report.prefixes, vec!["c".to_string()]);
        for name in ["c.tif", "c.box", "c.gt.txt"] {
            assert!(!dir.path().join(name).exists());
            assert!(quarantine.join(name).exists());
        }
        assert!(dir.path().join("ok.tif").exists());
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn dry_run_does_not_create_quarantine() {
        let dir = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        touch(dir.path(), "d.tif", "");

        let options = CleanOptions {
            dry_run: true,
            quarantine: Some(parent.path().join("q")),
        };
        let report: RemovalReport = remove_invalid_groups_with(dir.path(), &options).unwrap();

        assert!(report.quarantine_dir.is_none());
        assert!(!parent.path().join("q").exists());
    }

    #[test]
    fn nothing_to_remove_creates_no_quarantine() {
        let dir = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        let options = CleanOptions {
            dry_run: false,
            quarantine: Some(parent.path().join("q")),
        };
        let report: RemovalReport = remove_invalid_groups_with(dir.path(), &options).unwrap();

        assert!(report.prefixes.is_empty());
        assert!(!parent.path().join("q").exists());
    }

    #[test]
    fn vanished_file_is_a_failure_and_the_run_goes_on() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.tif", "");
        touch(dir.path(), "a.box", "");
        touch(dir.path(), "b.tif", "");
        touch(dir.path(), "b.gt.txt", "");

        let plan: RemovalPlan = plan_removal(dir.path()).unwrap();
        assert_eq!(plan.targets.len(), 2);
        //Otro proceso borra el archivo entre el escaneo y el borrado
        fs::remove_file(dir.path().join("a.tif")).unwrap();

        let report: RemovalReport = execute_removal(&plan, &CleanOptions::default()).unwrap();

        assert_eq!(report.prefixes, vec!["a".to_string(), "b".to_string()]);
        let failed: Vec<&FileAction> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path, dir.path().join("a.tif"));
        assert!(!dir.path().join("a.box").exists());
        assert!(!dir.path().join("b.tif").exists());
        assert!(!dir.path().join("b.gt.txt").exists());
        assert_eq!(report.actions.len(), 4);
    }

    #[test]
    fn existing_quarantine_folder_is_not_reused() {
        let parent = tempfile::tempdir().unwrap();
        fs::create_dir(parent.path().join("GT_quarantine_taken")).unwrap();

        let err = create_fresh_dir(parent.path(), "GT_quarantine_taken").unwrap_err();
        match err {
            GtError::FileSystem { source, .. } => assert_eq!(source.kind(), io::ErrorKind::AlreadyExists),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn quarantine_parent_is_created() {
        let root = tempfile::tempdir().unwrap();
        let parent: PathBuf = root.path().join("nested").join("parent");

        let dir: PathBuf = create_fresh_dir(&parent, "GT_quarantine_x").unwrap();
        assert!(dir.is_dir());
        assert!(dir.starts_with(&parent));
    }
}
