//! Resolver tests.
//!
//! - `layout`: struct sizes, slot offsets, unions and groups
//! - `names`: ids, display names, lookup and duplicate detection
//! - `values`: defaults, constants and annotations
//! - `imports`: multi-file closures and import errors
//! - `generics`: parameters, brands and inherited bindings

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

mod layout;

use capn_parse::ParsedFile;
use rustc_hash::FxHashMap;

use crate::{resolve, CompileError, ImportLoader, LoadError, Node, SchemaGraph, Slot};

/// In-memory files keyed by name.
struct Files(FxHashMap<String, String>);

impl ImportLoader for Files {
    fn canonicalize(&self, _importer: &str, import: &str) -> Result<String, LoadError> {
        let key = import.trim_start_matches('/');
        if self.0.contains_key(key) {
            Ok(key.to_string())
        } else {
            Err(LoadError::NotFound {
                import: import.to_string(),
                searched: Vec::new(),
            })
        }
    }

    fn load(&self, key: &str) -> Result<ParsedFile, LoadError> {
        let source = self.0.get(key).ok_or_else(|| LoadError::NotFound {
            import: key.to_string(),
            searched: Vec::new(),
        })?;
        ParsedFile::parse(key, source.as_str()).map_err(|error| LoadError::Syntax {
            file: key.to_string(),
            error,
        })
    }
}

/// Compile the first file; the rest are importable.
fn compile_files(files: &[(&str, &str)]) -> Result<SchemaGraph, CompileError> {
    let loader = Files(
        files
            .iter()
            .map(|(name, source)| ((*name).to_string(), (*source).to_string()))
            .collect(),
    );
    let root = loader
        .load(files[0].0)
        .map_err(|e| e.into_compile_error(None))?;
    resolve(root, &loader)
}

fn compile(source: &str) -> SchemaGraph {
    compile_files(&[("test.capnp", source)]).unwrap()
}

fn compile_err(source: &str) -> CompileError {
    compile_files(&[("test.capnp", source)]).unwrap_err()
}

/// Node by display name without the `test.capnp:` prefix.
fn node<'g>(graph: &'g SchemaGraph, name: &str) -> &'g Node {
    let full = format!("test.capnp:{name}");
    graph
        .iter()
        .find(|n| n.display_name == full)
        .unwrap_or_else(|| panic!("no node named {full}"))
}

fn slot<'n>(node: &'n Node, field: &str) -> &'n Slot {
    node.fields()
        .iter()
        .find(|f| f.name == field)
        .and_then(|f| f.as_slot())
        .unwrap_or_else(|| panic!("no slot named {field}"))
}
