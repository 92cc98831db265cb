//! Import loaders backed by the filesystem and by memory.
//!
//! A relative import is resolved against the directory of the file that
//! wrote it. An import starting with `/` is looked up under each search
//! path in turn.
//!
//! Display names are what node names and ids are derived from, so they are
//! kept independent of where a tree happens to live on disk:
//!
//! ```text
//! root given as         src/shop/orders.capnp   --src-prefix=src  ->  shop/orders.capnp
//! import "common.capnp" from it                                   ->  shop/common.capnp
//! import "/capnp/c++.capnp" found under -I vendor                 ->  capnp/c++.capnp
//! ```

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use capn_parse::ParsedFile;
use capn_schema::{ImportLoader, LoadError};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::CompileOptions;

/// Loads imports from disk.
///
/// Keys are canonical paths, so two spellings of the same file are one file.
#[derive(Debug)]
pub struct FsImportLoader {
    search_paths: Vec<PathBuf>,
    src_prefixes: Vec<PathBuf>,
    /// Display name of every key handed out so far.
    names: Mutex<FxHashMap<String, String>>,
}

impl FsImportLoader {
    pub fn new(options: &CompileOptions) -> Self {
        FsImportLoader {
            search_paths: options.search_paths(),
            src_prefixes: options.src_prefixes.clone(),
            names: Mutex::new(FxHashMap::default()),
        }
    }

    /// Canonical key of the file a compile starts from. The file is not
    /// read; pass the key to [`load`](ImportLoader::load) for that.
    pub fn root_key(&self, path: &Path) -> Result<String, LoadError> {
        let key = canonical_key(path, &path.display().to_string())?;
        let name = self.display_name(path);
        self.names.lock().insert(key.clone(), name);
        Ok(key)
    }

    fn display_name(&self, path: &Path) -> String {
        let stripped = self
            .src_prefixes
            .iter()
            .find_map(|prefix| path.strip_prefix(prefix).ok())
            .unwrap_or(path);
        normalize(stripped)
    }

    fn name_of(&self, key: &str) -> String {
        self.names
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn search(&self, import: &str) -> Result<(PathBuf, String), LoadError> {
        let relative = import.trim_start_matches('/');
        let mut searched = Vec::with_capacity(self.search_paths.len());
        for dir in &self.search_paths {
            let candidate = dir.join(relative);
            if candidate.is_file() {
                tracing::trace!(import, dir = %dir.display(), "found import on search path");
                return Ok((candidate, normalize(Path::new(relative))));
            }
            searched.push(candidate.display().to_string());
        }
        Err(LoadError::NotFound {
            import: import.to_string(),
            searched,
        })
    }
}

impl ImportLoader for FsImportLoader {
    fn canonicalize(&self, importer: &str, import: &str) -> Result<String, LoadError> {
        let (path, name) = if import.starts_with('/') {
            self.search(import)?
        } else {
            let dir = Path::new(importer).parent().unwrap_or_else(|| Path::new(""));
            let name = sibling_name(&self.name_of(importer), import);
            (dir.join(import), name)
        };

        let key = canonical_key(&path, import)?;
        self.names.lock().entry(key.clone()).or_insert(name);
        Ok(key)
    }

    fn load(&self, key: &str) -> Result<ParsedFile, LoadError> {
        let name = self.name_of(key);
        let source = read_file(Path::new(key))?;
        ParsedFile::parse(name.clone(), source).map_err(|error| LoadError::Syntax {
            file: name,
            error,
        })
    }
}

fn canonical_key(path: &Path, import: &str) -> Result<String, LoadError> {
    match path.canonicalize() {
        Ok(canonical) => Ok(canonical.display().to_string()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(LoadError::NotFound {
            import: import.to_string(),
            searched: vec![path.display().to_string()],
        }),
        Err(e) => Err(io_error(path, &e)),
    }
}

/// Read a schema file as UTF-8.
pub(crate) fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|e| io_error(path, &e))
}

pub(crate) fn io_error(path: &Path, e: &std::io::Error) -> LoadError {
    let message = match e.kind() {
        ErrorKind::NotFound => "cannot find file".to_string(),
        ErrorKind::PermissionDenied => "permission denied".to_string(),
        ErrorKind::InvalidData => "contains invalid UTF-8 data".to_string(),
        _ => e.to_string(),
    };
    LoadError::Io {
        path: path.display().to_string(),
        message,
    }
}

/// Display name of `import` written in the file displayed as `importer`.
fn sibling_name(importer: &str, import: &str) -> String {
    let dir = Path::new(importer).parent().unwrap_or_else(|| Path::new(""));
    normalize(&dir.join(import))
}

/// Lexically fold `.` and `..` and join with `/`.
fn normalize(path: &Path) -> String {
    let rooted = path.has_root();
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                if parts.last().is_some_and(|last| last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..".to_string());
                }
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Virtual files held in memory, keyed by display name.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    files: FxHashMap<String, Arc<str>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    #[must_use]
    pub fn with_file(mut self, name: &str, source: impl Into<Arc<str>>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: &str, source: impl Into<Arc<str>>) {
        self.files
            .insert(normalize(Path::new(name.trim_start_matches('/'))), source.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files
            .contains_key(&normalize(Path::new(name.trim_start_matches('/'))))
    }
}

impl ImportLoader for MemoryLoader {
    fn canonicalize(&self, importer: &str, import: &str) -> Result<String, LoadError> {
        let key = match import.strip_prefix('/') {
            Some(rooted) => normalize(Path::new(rooted)),
            None => sibling_name(importer, import),
        };
        if self.files.contains_key(&key) {
            Ok(key)
        } else {
            Err(LoadError::NotFound {
                import: import.to_string(),
                searched: vec![key],
            })
        }
    }

    fn load(&self, key: &str) -> Result<ParsedFile, LoadError> {
        let Some(source) = self.files.get(key) else {
            return Err(LoadError::NotFound {
                import: key.to_string(),
                searched: Vec::new(),
            });
        };
        ParsedFile::parse(key, Arc::clone(source)).map_err(|error| LoadError::Syntax {
            file: key.to_string(),
            error,
        })
    }
}

#[cfg(test)]
mod tests;
