//! Reads files under the input root into documents.
//!
//! The input root comes from the `InputPath` metadata of each input document
//! (usually inherited from engine metadata). Patterns are relative to that
//! root and may carry a sub-directory: `*.md`, `guide/*.md`, `index.md`.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use docflow_shared::{DocflowError, INPUT_PATH_KEY, Result};

use crate::context::ExecutionContext;
use crate::document::Document;
use crate::module::Module;

/// Absolute input root the file was found under.
pub const FILE_ROOT: &str = "FileRoot";
/// File name without extension.
pub const FILE_BASE: &str = "FileBase";
/// Extension with its leading dot, or empty.
pub const FILE_EXT: &str = "FileExt";
/// File name with extension.
pub const FILE_NAME: &str = "FileName";
/// Absolute directory containing the file.
pub const FILE_DIR: &str = "FileDir";
/// Absolute path of the file.
pub const FILE_PATH: &str = "FilePath";

/// How far below the search directory to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDepth {
    #[default]
    TopDirectoryOnly,
    AllDirectories,
}

type PatternFn = Box<dyn Fn(&Document) -> Option<String> + Send + Sync>;

enum PatternSource {
    Fixed(FilePattern),
    PerDocument(PatternFn),
}

/// Emits one document per matching file, per input document.
///
/// Each output is a clone of the input it was found for, so input metadata
/// stays visible underneath the `File*` keys.
pub struct ReadFiles {
    pattern: PatternSource,
    depth: SearchDepth,
}

impl ReadFiles {
    /// Read files matching a fixed pattern. An empty pattern is rejected.
    pub fn new(pattern: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            pattern: PatternSource::Fixed(FilePattern::parse(pattern.as_ref())?),
            depth: SearchDepth::default(),
        })
    }

    /// Compute the pattern from each input document. `None` skips that input.
    pub fn with_path<F>(pattern: F) -> Self
    where
        F: Fn(&Document) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            pattern: PatternSource::PerDocument(Box::new(pattern)),
            depth: SearchDepth::default(),
        }
    }

    pub fn search_depth(mut self, depth: SearchDepth) -> Self {
        self.depth = depth;
        self
    }

    /// Shorthand for `search_depth(SearchDepth::AllDirectories)`.
    pub fn recursive(self) -> Self {
        self.search_depth(SearchDepth::AllDirectories)
    }

    fn read_for(&self, input: &Document, out: &mut Vec<Document>) -> Result<()> {
        let computed;
        let pattern = match &self.pattern {
            PatternSource::Fixed(p) => p,
            PatternSource::PerDocument(f) => match f(input) {
                Some(raw) => {
                    computed = FilePattern::parse(&raw)?;
                    &computed
                }
                None => {
                    debug!(document = %input.id(), "no pattern for document, skipping");
                    return Ok(());
                }
            },
        };

        let Some(root) = input.metadata().get_str(INPUT_PATH_KEY) else {
            warn!(document = %input.id(), key = INPUT_PATH_KEY, "no input root metadata, skipping");
            return Ok(());
        };
        let root = std::path::absolute(root).map_err(|e| DocflowError::io(root, e))?;

        let search_dir = root.join(&pattern.directory);
        if !search_dir.is_dir() {
            warn!(dir = %search_dir.display(), "search directory does not exist");
            return Ok(());
        }

        let mut files = Vec::new();
        collect_files(&search_dir, self.depth, &mut files)?;
        files.sort();

        for path in files.iter().filter(|p| pattern.matches(p)) {
            let content = std::fs::read_to_string(path).map_err(|e| DocflowError::io(path, e))?;
            out.push(input.clone_with(content, file_metadata(&root, path)));
        }
        Ok(())
    }
}

impl Module for ReadFiles {
    #[instrument(skip_all, fields(inputs = inputs.len(), depth = ?self.depth))]
    fn execute(&self, inputs: Vec<Document>, _context: &ExecutionContext) -> Result<Vec<Document>> {
        let mut outputs = Vec::new();
        for input in &inputs {
            self.read_for(input, &mut outputs)?;
        }
        debug!(files = outputs.len(), "read files");
        Ok(outputs)
    }

    fn name(&self) -> &str {
        "ReadFiles"
    }
}

// ---------------------------------------------------------------------------
// Pattern matching
// ---------------------------------------------------------------------------

/// A search pattern split into its directory part and a file-name glob.
struct FilePattern {
    directory: PathBuf,
    file_name: Regex,
}

impl FilePattern {
    fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().replace('\\', "/");
        if normalized.is_empty() {
            return Err(DocflowError::config("search pattern must not be empty"));
        }

        let (directory, glob) = match normalized.rsplit_once('/') {
            Some((dir, glob)) => (PathBuf::from(dir), glob),
            None => (PathBuf::new(), normalized.as_str()),
        };
        if glob.is_empty() {
            return Err(DocflowError::config(format!(
                "search pattern '{raw}' has no file name part"
            )));
        }

        let file_name = Regex::new(&glob_to_regex(glob))
            .map_err(|e| DocflowError::config(format!("invalid search pattern '{raw}': {e}")))?;

        Ok(Self {
            directory,
            file_name,
        })
    }

    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.file_name.is_match(name))
    }
}

/// `*` matches any run of characters, `?` exactly one; the rest is literal.
fn glob_to_regex(glob: &str) -> String {
    let mut re = String::with_capacity(glob.len() + 12);
    re.push_str("(?s)^");
    for c in glob.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    re
}

fn collect_files(dir: &Path, depth: SearchDepth, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| DocflowError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DocflowError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| DocflowError::io(&path, e))?;
        if file_type.is_dir() {
            if depth == SearchDepth::AllDirectories {
                collect_files(&path, depth, out)?;
            }
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn file_metadata(root: &Path, path: &Path) -> Vec<(&'static str, Value)> {
    let text = |p: Option<&std::ffi::OsStr>| {
        p.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    };
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let dir = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    vec![
        (FILE_ROOT, Value::from(root.to_string_lossy().into_owned())),
        (FILE_BASE, Value::from(text(path.file_stem()))),
        (FILE_EXT, Value::from(extension)),
        (FILE_NAME, Value::from(text(path.file_name()))),
        (FILE_DIR, Value::from(dir)),
        (FILE_PATH, Value::from(path.to_string_lossy().into_owned())),
    ]
}
