use std::ffi::{OsStr, OsString};
use std::fs::{self, DirEntry};
use std::path::Path;

use crate::error::{GtError, Result};

/// Suffixes of a ground-truth triplet, in the order the files are checked.
pub const GT_SUFFIXES: [&str; 3] = [".tif", ".box", ".gt.txt"];

/*List the ground-truth files of a directory.
Parameters:
- path: &Path = The path to the directory.
Return:
- Result<Vec<OsString>> = The file names (not full paths) ending in one of GT_SUFFIXES, sorted alphanumerically.
Names are kept as OsString so files with non UTF-8 names are still grouped.
Only fails when the directory itself cannot be listed.
*/
pub fn list_gt_files(path: &Path) -> Result<Vec<OsString>> {
    let items: fs::ReadDir = fs::read_dir(path).map_err(|source| GtError::FileSystem {
        path: path.to_path_buf(),
        source,
    })?;
    let mut names: Vec<OsString> = Vec::new();

    //Ignoramos los items que den error
    for item in items.flatten() {
        if let Some(name) = gt_file_name(&item) {
            names.push(name);
        }
    }
    alphanumeric_sort::sort_os_str_slice(&mut names[..]);

    Ok(names)
}

/*Filters a directory entry.
Return:
- Option<OsString> = The entry name if it is a regular file (symlinks followed) ending in a ground-truth suffix.
*/
pub fn gt_file_name(item: &DirEntry) -> Option<OsString> {
    let name: OsString = item.file_name();
    if !has_gt_suffix(&name) {
        return None;
    }
    //Una carpeta llamada "x.tif" no cuenta como archivo
    match fs::metadata(item.path()) {
        Ok(meta) if meta.is_file() => Some(name),
        _ => None,
    }
}

pub fn has_gt_suffix(name: &OsStr) -> bool {
    let bytes: &[u8] = name.as_encoded_bytes();
    GT_SUFFIXES
        .iter()
        .any(|suffix| bytes.len() > suffix.len() && bytes.ends_with(suffix.as_bytes()))
}

/// Removes the last extension segment. Leading dots belong to the stem, so
/// ".tif" is returned unchanged.
pub fn strip_extension(name: &OsStr) -> &OsStr {
    let bytes: &[u8] = name.as_encoded_bytes();
    let lead: usize = bytes.iter().take_while(|&&b| b == b'.').count();
    match bytes[lead..].iter().rposition(|&b| b == b'.') {
        // SAFETY: the cut is right before an ASCII '.', which keeps the encoded bytes valid.
        Some(i) => unsafe { OsStr::from_encoded_bytes_unchecked(&bytes[..lead + i]) },
        None => name,
    }
}

/// Prefix shared by a triplet: the extension is stripped twice so that
/// `a.gt.txt`, `a.tif` and `a.box` all map to `a`.
pub fn derive_prefix(name: &OsStr) -> &OsStr {
    strip_extension(strip_extension(name))
}

/// Appends a suffix to a prefix without going through UTF-8.
pub fn with_suffix(prefix: &OsStr, suffix: &str) -> OsString {
    let mut name: OsString = prefix.to_os_string();
    name.push(suffix);
    name
}

pub fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(name: &str) -> &str {
        derive_prefix(OsStr::new(name)).to_str().unwrap()
    }

    #[test]
    fn prefix_collapses_two_part_extension() {
        assert_eq!(prefix("vie_0.gt.txt"), "vie_0");
        assert_eq!(prefix("vie_0.tif"), "vie_0");
        assert_eq!(prefix("vie_0.box"), "vie_0");
    }

    #[test]
    fn prefix_strips_twice_even_for_single_extension() {
        // a dotted stem loses its last segment too
        assert_eq!(prefix("page.v2.tif"), "page");
        assert_eq!(prefix("page.v2.gt.txt"), "page.v2");
    }

    #[test]
    fn leading_dots_are_not_extensions() {
        assert_eq!(strip_extension(OsStr::new(".hidden")), ".hidden");
        assert_eq!(prefix(".a.tif"), ".a");
        assert_eq!(strip_extension(OsStr::new("noext")), "noext");
    }

    #[test]
    fn suffix_filter() {
        assert!(has_gt_suffix(OsStr::new("a.tif")));
        assert!(has_gt_suffix(OsStr::new("a.box")));
        assert!(has_gt_suffix(OsStr::new("a.gt.txt")));
        assert!(!has_gt_suffix(OsStr::new("a.txt")));
        assert!(!has_gt_suffix(OsStr::new("a.png")));
        assert!(!has_gt_suffix(OsStr::new(".tif")));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_keep_their_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let name: &OsStr = OsStr::from_bytes(b"bad\xff.gt.txt");
        assert!(has_gt_suffix(name));
        assert_eq!(derive_prefix(name).as_bytes(), b"bad\xff");
        assert_eq!(with_suffix(derive_prefix(name), ".box").as_bytes(), b"bad\xff.box");
    }

    #[test]
    fn listing_skips_directories_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.tif"), b"").unwrap();
        fs::write(dir.path().join("a.gt.txt"), b"x").unwrap();
        fs::write(dir.path().join("notes.md"), b"").unwrap();
        fs::create_dir(dir.path().join("c.box")).unwrap();

        let names: Vec<OsString> = list_gt_files(dir.path()).unwrap();
        assert_eq!(names, vec![OsString::from("a.gt.txt"), OsString::from("b.tif")]);
    }

    #[test]
    fn listing_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_gt_files(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, GtError::FileSystem { .. }));
    }
}
