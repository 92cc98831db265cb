//! Compiler options and their command-line form.

use std::path::PathBuf;

/// Directories searched for absolute imports after the `-I` paths.
pub const STANDARD_IMPORT_PATHS: [&str; 2] = ["/usr/local/include", "/usr/include"];

/// How a compile finds files and names them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompileOptions {
    /// Searched, in order, for imports written as `"/dir/file.capnp"`.
    pub import_paths: Vec<PathBuf>,
    /// Stripped from the front of file display names.
    pub src_prefixes: Vec<PathBuf>,
    /// Skip [`STANDARD_IMPORT_PATHS`].
    pub no_standard_import: bool,
}

/// A malformed command-line flag.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("`{0}` expects a directory")]
    MissingValue(String),

    #[error("unknown option `{0}`")]
    UnknownFlag(String),
}

impl CompileOptions {
    /// Every directory searched for absolute imports.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.import_paths.clone();
        if !self.no_standard_import {
            paths.extend(STANDARD_IMPORT_PATHS.iter().map(PathBuf::from));
        }
        paths
    }

    /// Parse `-I dir`, `-Idir`, `--import-path=dir`, `--src-prefix=dir` and
    /// `--no-standard-import`. Arguments that are not flags are returned in
    /// order.
    pub fn from_args(args: &[String]) -> Result<(Self, Vec<String>), OptionsError> {
        let mut options = CompileOptions::default();
        let mut positional = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            if arg == "-I" || arg == "--import-path" || arg == "--src-prefix" {
                let Some(value) = args.get(i + 1) else {
                    return Err(OptionsError::MissingValue(arg.to_string()));
                };
                if arg == "--src-prefix" {
                    options.src_prefixes.push(PathBuf::from(value));
                } else {
                    options.import_paths.push(PathBuf::from(value));
                }
                i += 2;
                continue;
            }

            if let Some(dir) = arg.strip_prefix("--import-path=") {
                options.import_paths.push(PathBuf::from(dir));
            } else if let Some(dir) = arg.strip_prefix("--src-prefix=") {
                options.src_prefixes.push(PathBuf::from(dir));
            } else if arg == "--no-standard-import" {
                options.no_standard_import = true;
            } else if let Some(dir) = arg.strip_prefix("-I") {
                options.import_paths.push(PathBuf::from(dir));
            } else if arg.starts_with('-') && arg != "-" {
                return Err(OptionsError::UnknownFlag(arg.to_string()));
            } else {
                positional.push(arg.to_string());
            }
            i += 1;
        }
        Ok((options, positional))
    }
}
