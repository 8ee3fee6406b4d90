//! Result-directory bookkeeping and stage-artifact persistence.
//!
//! One run owns one numbered [`ResultSession`] directory. Stage images are
//! written by a [`DebugArtifactWriter`] behind the [`StageObserver`] trait so
//! the pipeline itself never touches the filesystem and stays testable.

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::ScanError;

/// Subdirectory of a session that holds the numbered stage images.
const DEBUG_SUBDIR: &str = "ocr_debug";

/// The numbered output directory for one run.
///
/// Allocation scans existing siblings sharing the name prefix, takes the
/// highest integer suffix in use and creates `prefix{max+1}` (or `prefix1`
/// when no numbered sibling exists). The scan is a moment-in-time snapshot;
/// two racing runs can pick the same index, in which case the non-recursive
/// create fails loudly instead of silently sharing a directory.
pub struct ResultSession {
    dir: PathBuf,
    debug_dir: PathBuf,
}

impl ResultSession {
    pub fn allocate(output_root: &Path, prefix: &str) -> Result<Self, ScanError> {
        fs::create_dir_all(output_root)?;
        let index = next_index(output_root, prefix)?;
        let dir = output_root.join(format!("{}{}", prefix, index));
        fs::create_dir(&dir)?;

        let debug_dir = dir.join(DEBUG_SUBDIR);
        fs::create_dir(&debug_dir)?;

        info!(dir = %dir.display(), "result session allocated");
        Ok(Self { dir, debug_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn debug_dir(&self) -> &Path {
        &self.debug_dir
    }

    /// Copy the input photograph into the session for later reference.
    pub fn copy_input(&self, input: &Path) -> Result<PathBuf, ScanError> {
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        let dest = self.dir.join(format!("original_{}", file_name));
        fs::copy(input, &dest)?;
        Ok(dest)
    }

    /// Persist the plain-text OCR result.
    pub fn write_text_result(&self, text: &str) -> Result<PathBuf, ScanError> {
        let path = self.dir.join("ocr_result.txt");
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Persist the positional-markup (hOCR) OCR result.
    pub fn write_markup_result(&self, markup: &[u8]) -> Result<PathBuf, ScanError> {
        let path = self.dir.join("ocr_result.html");
        fs::write(&path, markup)?;
        Ok(path)
    }
}

/// Highest integer suffix currently used by `prefix{N}` sibling directories.
fn next_index(output_root: &Path, prefix: &str) -> Result<u32, ScanError> {
    let mut max_used = 0u32;
    for entry in fs::read_dir(output_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(suffix) = name.strip_prefix(prefix) else {
            continue;
        };
        if let Ok(index) = suffix.parse::<u32>() {
            max_used = max_used.max(index);
        }
    }
    Ok(max_used + 1)
}

/// Side-observer for pipeline stages. Receives a copy of each stage's output
/// without altering the forward data flow.
pub trait StageObserver {
    /// Persist (or ignore) one stage image. `label` carries a fixed
    /// zero-padded stage number so artifact filenames sort in pipeline order.
    fn observe(&mut self, label: &str, image: &DynamicImage) -> Result<(), ScanError>;
}

/// Observer that drops everything; used when debug output is disabled and in
/// pipeline tests.
pub struct NullObserver;

impl StageObserver for NullObserver {
    fn observe(&mut self, _label: &str, _image: &DynamicImage) -> Result<(), ScanError> {
        Ok(())
    }
}

/// Writes each observed stage as `{label}.png` inside the session's debug
/// directory. Write-once per label within a run; directories are never
/// shared across runs.
pub struct DebugArtifactWriter {
    debug_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DebugArtifactWriter {
    pub fn new(session: &ResultSession) -> Self {
        Self {
            debug_dir: session.debug_dir().to_path_buf(),
            written: Vec::new(),
        }
    }

    /// Paths written so far, in pipeline order.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.written
    }
}

impl StageObserver for DebugArtifactWriter {
    fn observe(&mut self, label: &str, image: &DynamicImage) -> Result<(), ScanError> {
        let path = self.debug_dir.join(format!("{}.png", label));
        image.save(&path)?;
        debug!(artifact = %path.display(), "stage artifact written");
        self.written.push(path);
        Ok(())
    }
}
