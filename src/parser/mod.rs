//! Social-network data export parsing.
//!
//! An export is either one JSON document or a ZIP archive of many. Nothing about the layout
//! is guaranteed across export versions, so the parser extracts what it recognises and
//! ignores the rest. Only a missing or unsupported top-level input is an error.

pub mod current;
pub mod document;
pub mod legacy;
pub mod resolve;
pub mod rules;

use glob::Pattern;
use serde_json::Value;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Ignored, ProfileError, Result};
use crate::models::ParsedExportBundle;

pub use document::process_document;
pub use resolve::resolve_local_path;
pub use rules::{Bucket, Extracted, FileName, Layout, Router, Rule};

pub const DEFAULT_EXTRACTION_DIR: &str = "temp_facebook_data";

/// Progress of an archive import, reported once per visited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub visited: usize,
    pub total: usize,
}

#[derive(Debug)]
pub struct ExportParser {
    router: Router,
    extraction_dir: PathBuf,
}

impl Default for ExportParser {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACTION_DIR)
    }
}

impl ExportParser {
    pub fn new(extraction_dir: impl Into<PathBuf>) -> Self {
        Self {
            router: Router::default(),
            extraction_dir: extraction_dir.into(),
        }
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn parse(&self, path: impl AsRef<Path>) -> Result<ParsedExportBundle> {
        self.parse_with_progress(path, |_| {})
    }

    pub fn parse_with_progress(
        &self,
        path: impl AsRef<Path>,
        progress: impl FnMut(ImportProgress),
    ) -> Result<ParsedExportBundle> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProfileError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let result = match extension.as_str() {
            "zip" => self.parse_archive(path, progress),
            "json" => parse_document_file(path),
            _ => Err(ProfileError::UnsupportedFormat(if extension.is_empty() {
                "(no extension)".to_string()
            } else {
                format!(".{extension}")
            })),
        };

        if let Err(e) = &result {
            tracing::error!(path = %path.display(), error = %e, "error parsing export");
        }
        result
    }

    fn parse_archive(
        &self,
        zip_path: &Path,
        progress: impl FnMut(ImportProgress),
    ) -> Result<ParsedExportBundle> {
        info!(path = %zip_path.display(), "parsing export archive");

        let dir = &self.extraction_dir;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;

        match self.extract_and_visit(zip_path, dir, progress) {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(dir) {
                    warn!(dir = %dir.display(), error = %cleanup, "failed to clean extraction directory");
                }
                Err(e)
            }
        }
    }

    fn extract_and_visit(
        &self,
        zip_path: &Path,
        root: &Path,
        mut progress: impl FnMut(ImportProgress),
    ) -> Result<ParsedExportBundle> {
        let mut archive = zip::ZipArchive::new(File::open(zip_path)?)?;
        archive.extract(root)?;
        debug!(entries = archive.len(), root = %root.display(), "archive extracted");

        let files = json_files(root)?;
        let total = files.len();
        let mut bundle = ParsedExportBundle {
            extraction_root: Some(root.to_path_buf()),
            ..Default::default()
        };

        for (i, file) in files.iter().enumerate() {
            self.visit_file(file, root, &mut bundle);
            progress(ImportProgress {
                visited: i + 1,
                total,
            });
        }

        info!(
            files = total,
            photos = bundle.photos.len(),
            posts = bundle.posts.len(),
            interests = bundle.interests.len(),
            friends = bundle.friends.len(),
            "export archive parsed"
        );
        Ok(bundle)
    }

    fn visit_file(&self, path: &Path, root: &Path, bundle: &mut ParsedExportBundle) {
        let name = FileName::new(path, root);
        let rules: Vec<&Rule> = self.router.matching(&name).collect();
        if rules.is_empty() {
            return;
        }

        let value = match read_json(path) {
            Ok(value) => value,
            Err(ignored) => {
                warn!(file = %path.display(), reason = %ignored, "skipping unreadable export file");
                return;
            }
        };

        let mut filled: Vec<Bucket> = Vec::new();
        for rule in rules {
            if filled.contains(&rule.bucket) {
                debug!(rule = rule.name, file = %name.relative_path, "bucket already filled for file");
                continue;
            }
            match rule.extract(&value, root) {
                Ok(extracted) => {
                    debug!(rule = rule.name, file = %name.relative_path, records = extracted.len(), "extracted");
                    if !extracted.is_empty() {
                        filled.push(extracted.bucket());
                    }
                    bundle.absorb(extracted);
                }
                Err(ignored) => {
                    warn!(rule = rule.name, file = %path.display(), reason = %ignored, "extraction failed");
                }
            }
        }
    }
}

fn parse_document_file(path: &Path) -> Result<ParsedExportBundle> {
    info!(path = %path.display(), "parsing export document");
    let value: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(process_document(&value, base))
}

fn read_json(path: &Path) -> std::result::Result<Value, Ignored> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Every `*.json` file under `root`, sorted.
fn json_files(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.json", Pattern::escape(&root.to_string_lossy()));
    let paths = glob::glob(&pattern)?;
    let mut files: Vec<PathBuf> = paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}
