//! Import loading.
//!
//! The resolver never touches the filesystem itself. It asks an
//! [`ImportLoader`] to turn each `import "..."` string into a key and then
//! to produce the parsed file for that key.

use capn_diagnostic::SourceLocation;
use capn_parse::{ensure_sufficient_stack, ParsedFile, SyntaxError};
use rustc_hash::FxHashMap;

use crate::CompileError;

/// Source of imported schema files.
pub trait ImportLoader {
    /// Resolve `import`, as written in the file identified by `importer`,
    /// to the key of the file it names. Equal keys mean the same file.
    fn canonicalize(&self, importer: &str, import: &str) -> Result<String, LoadError>;

    /// Read and parse the file named by `key`.
    fn load(&self, key: &str) -> Result<ParsedFile, LoadError>;
}

/// Why an import could not be loaded.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("import \"{import}\" not found")]
    NotFound { import: String, searched: Vec<String> },

    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("{file}:{error}")]
    Syntax { file: String, error: SyntaxError },
}

impl LoadError {
    /// Attach the import site.
    pub fn into_compile_error(self, site: Option<SourceLocation>) -> CompileError {
        match self {
            LoadError::NotFound { import, searched } => CompileError::ImportNotFound {
                import,
                searched,
                location: site,
            },
            LoadError::Io { path, message } => CompileError::Io { path, message },
            LoadError::Syntax { file, error } => CompileError::Syntax { file, error },
        }
    }
}

/// One file of the import closure.
#[derive(Debug)]
pub(crate) struct LoadedFile {
    pub key: String,
    pub parsed: ParsedFile,
    /// Import strings as written, with the index of the file each names.
    pub imports: Vec<(String, usize)>,
}

impl LoadedFile {
    pub fn import_target(&self, import: &str) -> Option<usize> {
        self.imports
            .iter()
            .find(|(name, _)| name == import)
            .map(|&(_, target)| target)
    }
}

/// Load `root` and everything it imports, depth-first.
///
/// The root is file 0; other files follow in the order they were first
/// reached. Each distinct key is loaded once.
pub(crate) fn load_closure(
    root_key: String,
    root: ParsedFile,
    loader: &dyn ImportLoader,
) -> Result<Vec<LoadedFile>, CompileError> {
    let mut closure = Closure {
        loader,
        files: Vec::new(),
        by_key: FxHashMap::default(),
        stack: Vec::new(),
    };
    closure.by_key.insert(root_key.clone(), 0);
    closure.files.push(LoadedFile {
        key: root_key,
        parsed: root,
        imports: Vec::new(),
    });
    closure.visit(0)?;
    Ok(closure.files)
}

struct Closure<'l> {
    loader: &'l dyn ImportLoader,
    files: Vec<LoadedFile>,
    by_key: FxHashMap<String, usize>,
    /// Files whose imports are being visited, outermost first.
    stack: Vec<usize>,
}

impl Closure<'_> {
    fn visit(&mut self, index: usize) -> Result<(), CompileError> {
        self.stack.push(index);

        let sites: Vec<(String, SourceLocation)> = {
            let parsed = &self.files[index].parsed;
            parsed
                .tree
                .import_sites()
                .into_iter()
                .map(|(import, span)| (import.to_string(), parsed.locate(span)))
                .collect()
        };

        for (import, site) in sites {
            let key = self
                .loader
                .canonicalize(&self.files[index].key, &import)
                .map_err(|e| e.into_compile_error(Some(site.clone())))?;

            let target = match self.by_key.get(&key) {
                Some(&existing) => {
                    if let Some(pos) = self.stack.iter().position(|&i| i == existing) {
                        let mut cycle: Vec<String> = self.stack[pos..]
                            .iter()
                            .map(|&i| self.files[i].parsed.name.clone())
                            .collect();
                        cycle.push(self.files[existing].parsed.name.clone());
                        return Err(CompileError::CyclicImport {
                            cycle,
                            location: site,
                        });
                    }
                    existing
                }
                None => {
                    let parsed = self
                        .loader
                        .load(&key)
                        .map_err(|e| e.into_compile_error(Some(site.clone())))?;
                    tracing::debug!(file = %parsed.name, key = %key, "loaded import");
                    let next = self.files.len();
                    self.by_key.insert(key.clone(), next);
                    self.files.push(LoadedFile {
                        key,
                        parsed,
                        imports: Vec::new(),
                    });
                    ensure_sufficient_stack(|| self.visit(next))?;
                    next
                }
            };
            self.files[index].imports.push((import, target));
        }

        self.stack.pop();
        Ok(())
    }
}
