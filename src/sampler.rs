//! Corpus sampler: picks random lines of a training-text corpus, writes one
//! `<prefix>_<i>.gt.txt` per line and renders the matching `.tif`/`.box` pair.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{GtError, Result};
use crate::text2image::Renderer;

#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub count: usize,
    /// Fixed seed for a reproducible sample.
    pub seed: Option<u64>,
    /// Defaults to the corpus file stem.
    pub prefix: Option<String>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            count: 1000,
            seed: None,
            prefix: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleReport {
    /// Prefixes whose `.gt.txt` was written.
    pub written: Vec<String>,
    /// Prefixes whose render failed; the validator flags them later.
    pub render_failures: Vec<String>,
}

/// Trimmed, non-blank lines of the corpus.
pub fn read_corpus(path: &Path) -> Result<Vec<String>> {
    let text: String = fs::read_to_string(path).map_err(|source| GtError::Corpus {
        path: path.to_path_buf(),
        source,
    })?;
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if lines.is_empty() {
        return Err(GtError::EmptyCorpus(path.to_path_buf()));
    }

    Ok(lines)
}

/// Shuffles the lines and keeps at most `count` of them.
pub fn sample_lines(mut lines: Vec<String>, count: usize, seed: Option<u64>) -> Vec<String> {
    let mut rng: StdRng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    lines.shuffle(&mut rng);
    lines.truncate(count);
    lines
}

/// File prefix derived from the corpus name: `langdata/vie.training_text` gives `vie`.
/// Dots are replaced so every file of a triplet maps back to the same prefix.
pub fn corpus_prefix(corpus: &Path) -> String {
    let stem: String = corpus
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "gt".to_string());
    sanitize_prefix(&stem)
}

pub fn sanitize_prefix(prefix: &str) -> String {
    prefix.replace('.', "_")
}

/*Samples a corpus into a ground-truth directory.
Parameters:
- corpus: &Path = The line-oriented training text.
- output_dir: &Path = The ground-truth directory, created if missing.
- renderer: &dyn Renderer = Produces the .tif/.box pair for each line.
- options: &SampleOptions = Count, seed and prefix.
Return:
- anyhow::Result<SampleReport> = Written prefixes and failed renders. A failed render does not stop the run.
*/
pub fn generate(
    corpus: &Path,
    output_dir: &Path,
    renderer: &dyn Renderer,
    options: &SampleOptions,
) -> anyhow::Result<SampleReport> {
    let lines: Vec<String> = sample_lines(read_corpus(corpus)?, options.count, options.seed);
    let prefix: String = match &options.prefix {
        Some(prefix) => sanitize_prefix(prefix),
        None => corpus_prefix(corpus),
    };

    fs::create_dir_all(output_dir).map_err(|source| GtError::FileSystem {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut report: SampleReport = SampleReport::default();
    report.written.reserve_exact(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let base_name: String = format!("{}_{}", prefix, i);
        let text_file: PathBuf = output_dir.join(format!("{}.gt.txt", base_name));
        fs::write(&text_file, line).with_context(|| format!("failed to write {}", text_file.display()))?;

        //El outputbase no lleva extension, text2image agrega .tif y .box
        let output_base: PathBuf = output_dir.join(&base_name);
        if let Err(err) = renderer.render(&text_file, &output_base) {
            let reason: String = format!("{:#}", err);
            warn!(prefix = %base_name, error = %reason, "render failed");
            report.render_failures.push(base_name.clone());
        }
        report.written.push(base_name);
    }
    info!(
        written = report.written.len(),
        failed = report.render_failures.len(),
        dir = %output_dir.display(),
        "sampling finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_lines_are_trimmed_and_blank_lines_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let corpus: PathBuf = dir.path().join("vie.training_text");
        fs::write(&corpus, "  xin chào \n\n   \nthế giới\n").unwrap();

        let lines: Vec<String> = read_corpus(&corpus).unwrap();
        assert_eq!(lines, vec!["xin chào".to_string(), "thế giới".to_string()]);
    }

    #[test]
    fn blank_corpus_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let corpus: PathBuf = dir.path().join("empty.txt");
        fs::write(&corpus, "\n  \n").unwrap();

        assert!(matches!(read_corpus(&corpus), Err(GtError::EmptyCorpus(_))));
    }

    #[test]
    fn sample_is_reproducible_with_a_seed() {
        let lines: Vec<String> = (0..50).map(|i| format!("line {}", i)).collect();
        let a: Vec<String> = sample_lines(lines.clone(), 10, Some(7));
        let b: Vec<String> = sample_lines(lines.clone(), 10, Some(7));
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.iter().all(|line| lines.contains(line)));
    }

    #[test]
    fn count_larger_than_corpus_keeps_everything() {
        let lines: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let mut sampled: Vec<String> = sample_lines(lines, 1000, Some(1));
        sampled.sort();
        assert_eq!(sampled, vec!["a", "b", "c"]);
    }

    #[test]
    fn prefix_from_corpus_name() {
        assert_eq!(corpus_prefix(Path::new("langdata/vie.training_text")), "vie");
        assert_eq!(corpus_prefix(Path::new("my.corpus.txt")), "my_corpus");
        assert_eq!(corpus_prefix(Path::new("/")), "gt");
    }
}
