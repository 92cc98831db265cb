//! Schema compiler driver.
//!
//! Ties the pipeline to the filesystem:
//!
//! ```text
//! path ──FsImportLoader──▶ ParsedFile ──resolve──▶ SchemaGraph ──▶ NodeRef
//!                 ▲                         │
//!                 └──── import closure ─────┘
//! ```
//!
//! [`compile`] is the one-call entry point. [`Compiler`] adds options and an
//! optional [`SchemaCache`]. A compiled graph can be written out with
//! [`write_precompiled`] and reflected over later with [`load_precompiled`].

mod cache;
mod dump;
mod loader;
mod options;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use capn_schema::{resolve_keyed, ImportLoader};

pub use cache::SchemaCache;
pub use capn_reflect::{NodeRef, Reflect, ReflectError, Reflected};
pub use capn_schema::{CompileError, SchemaGraph};
pub use dump::dump;
pub use loader::{FsImportLoader, MemoryLoader};
pub use options::{CompileOptions, OptionsError, STANDARD_IMPORT_PATHS};

/// Compile the schema file at `path` with default options.
pub fn compile(path: impl AsRef<Path>) -> Result<NodeRef, CompileError> {
    Compiler::new(CompileOptions::default()).compile(path)
}

/// A configured compiler.
#[derive(Debug)]
pub struct Compiler<'c> {
    options: CompileOptions,
    cache: Option<&'c SchemaCache>,
}

impl<'c> Compiler<'c> {
    pub fn new(options: CompileOptions) -> Self {
        Compiler {
            options,
            cache: None,
        }
    }

    /// Reuse graphs compiled earlier through `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: &'c SchemaCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile the file at `path` and everything it imports.
    ///
    /// With a cache, a file already compiled under the same options is
    /// returned without being read again.
    pub fn compile(&self, path: impl AsRef<Path>) -> Result<NodeRef, CompileError> {
        let path = path.as_ref();
        let loader = FsImportLoader::new(&self.options);
        let key = loader
            .root_key(path)
            .map_err(|e| e.into_compile_error(None))?;

        let cache_key = PathBuf::from(&key);
        if let Some(graph) = self
            .cache
            .and_then(|cache| cache.get(&cache_key, &self.options))
        {
            return Ok(NodeRef::root(graph));
        }

        let parsed = loader
            .load(&key)
            .map_err(|e| e.into_compile_error(None))?;
        let graph = Arc::new(resolve_keyed(key, parsed, &loader)?);
        tracing::debug!(
            file = %graph.root().display_name,
            nodes = graph.len(),
            "compiled schema"
        );
        if let Some(cache) = self.cache {
            cache.insert(cache_key, self.options.clone(), Arc::clone(&graph));
        }
        Ok(NodeRef::root(graph))
    }
}

/// Compile virtual files: `root` names one of `loader`'s files.
pub fn compile_memory(loader: &MemoryLoader, root: &str) -> Result<NodeRef, CompileError> {
    let key = loader
        .canonicalize("", root)
        .map_err(|e| e.into_compile_error(None))?;
    let parsed = loader
        .load(&key)
        .map_err(|e| e.into_compile_error(None))?;
    let graph = resolve_keyed(key, parsed, loader)?;
    Ok(NodeRef::root(Arc::new(graph)))
}

/// Write `graph` to `path` in the precompiled form.
pub fn write_precompiled(graph: &SchemaGraph, path: impl AsRef<Path>) -> Result<(), CompileError> {
    let path = path.as_ref();
    let bytes = graph.to_bytes()?;
    std::fs::write(path, bytes)
        .map_err(|e| loader::io_error(path, &e).into_compile_error(None))?;
    tracing::debug!(path = %path.display(), nodes = graph.len(), "wrote precompiled schema");
    Ok(())
}

/// Reflect over a file written by [`write_precompiled`].
pub fn load_precompiled(path: impl AsRef<Path>) -> Result<NodeRef, CompileError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| loader::io_error(path, &e).into_compile_error(None))?;
    let graph = SchemaGraph::from_bytes(&bytes)?;
    Ok(NodeRef::root(Arc::new(graph)))
}

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber when `RUST_LOG` is set.
///
/// Safe to call more than once. Enable with `RUST_LOG=capn_schema=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    });
}
