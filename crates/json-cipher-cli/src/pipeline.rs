//! File-processing pipeline: discover JSON files, run the value cipher over
//! each, and write the results.
//!
//! Each file is an independent unit of work. A file that fails to read,
//! parse, or (de)cipher is logged and skipped; the remaining files still
//! process. Only setup failures (bad algorithm, unwritable destination)
//! abort the whole run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use json_cipher::{Action, Algorithm, CipherOptions, ValueCipher};
use tracing::{debug, info, warn};

use crate::cli::JobArgs;

/// Outcome of one pipeline run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Files transformed and written.
    pub processed: usize,
    /// Files skipped after a per-file failure (missing, unparsable,
    /// undecipherable).
    pub skipped: usize,
}

/// Run `action` over every file named by `job`.
///
/// # Errors
///
/// Returns an error for setup problems only: an unknown `--algo` value or a
/// destination directory that cannot be created. Per-file failures are
/// counted in [`Summary::skipped`] instead.
pub fn run(action: Action, job: &JobArgs) -> Result<Summary> {
    let algo: Algorithm = job.algo.parse()?;
    let cipher = ValueCipher::with_options(&job.secret, CipherOptions {
        algo,
        iv_length: job.iv_length,
    });

    let ciphered_ext = job.ext.trim_start_matches('.');
    let (in_ext, out_ext) = match action {
        Action::Cipher => ("json", ciphered_ext),
        Action::Decipher => (ciphered_ext, "json"),
    };

    if let Some(dest) = &job.dest {
        fs::create_dir_all(dest)
            .with_context(|| format!("failed to create target folder {}", dest.display()))?;
    }

    let mut summary = Summary::default();

    for path in &job.paths {
        if path.is_dir() {
            for file in walk_dir(path, in_ext) {
                process_and_count(&cipher, action, &file, job.dest.as_deref(), out_ext, &mut summary);
            }
        } else if path.is_file() {
            process_and_count(&cipher, action, path, job.dest.as_deref(), out_ext, &mut summary);
        } else {
            warn!(path = %path.display(), "no such file or directory, skipping");
            summary.skipped += 1;
        }
    }

    info!(
        action = %action,
        processed = summary.processed,
        skipped = summary.skipped,
        "done"
    );
    Ok(summary)
}

fn process_and_count(
    cipher: &ValueCipher,
    action: Action,
    file: &Path,
    dest: Option<&Path>,
    out_ext: &str,
    summary: &mut Summary,
) {
    match process_file(cipher, action, file, dest, out_ext) {
        Ok(out) => {
            debug!(from = %file.display(), to = %out.display(), "{action}ed");
            summary.processed += 1;
        }
        Err(e) => {
            warn!(path = %file.display(), error = %e, "unable to {action} file, skipping");
            summary.skipped += 1;
        }
    }
}

/// Recursively collect the files under `dir` with the expected extension.
fn walk_dir(dir: &Path, ext: &str) -> Vec<PathBuf> {
    WalkBuilder::new(dir)
        // Take everything with the right extension; no hidden-file or
        // gitignore filtering for a data-processing tool.
        .standard_filters(false)
        .build()
        .filter_map(|entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "walk error, skipping entry");
                    return None;
                }
            };
            let path = entry.path();
            let is_file = entry.file_type().is_some_and(|t| t.is_file());
            let matches = path.extension().is_some_and(|e| e == ext);
            (is_file && matches).then(|| path.to_path_buf())
        })
        .collect()
}

/// Transform a single file and write the result.
fn process_file(
    cipher: &ValueCipher,
    action: Action,
    file: &Path,
    dest: Option<&Path>,
    out_ext: &str,
) -> Result<PathBuf> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let document: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let transformed = cipher.perform(action, &document)?;
    let mut rendered = serde_json::to_string_pretty(&transformed)?;
    rendered.push('\n');

    let out_path = output_path(file, dest, out_ext);
    fs::write(&out_path, rendered)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    Ok(out_path)
}

/// Destination of a transformed file: the target folder (or the source's
/// folder) with the output extension swapped in.
fn output_path(file: &Path, dest: Option<&Path>, out_ext: &str) -> PathBuf {
    let mut name = file.to_path_buf();
    name.set_extension(out_ext);
    match (dest, name.file_name()) {
        (Some(dir), Some(file_name)) => dir.join(file_name),
        _ => name,
    }
}
