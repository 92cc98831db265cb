//! Compiled graphs shared across compiles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use capn_schema::SchemaGraph;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::CompileOptions;

/// Graphs by the canonical path of their root file and the options they
/// were compiled with.
///
/// Entries are never invalidated: edits to a file, or to anything it
/// imports, are not seen until the entry is removed.
#[derive(Debug, Default)]
pub struct SchemaCache {
    graphs: Mutex<FxHashMap<(PathBuf, CompileOptions), Arc<SchemaGraph>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, root: &Path, options: &CompileOptions) -> Option<Arc<SchemaGraph>> {
        let key = (root.to_path_buf(), options.clone());
        let graph = self.graphs.lock().get(&key).map(Arc::clone);
        if graph.is_some() {
            tracing::debug!(root = %root.display(), "schema cache hit");
        }
        graph
    }

    pub fn insert(&self, root: PathBuf, options: CompileOptions, graph: Arc<SchemaGraph>) {
        self.graphs.lock().insert((root, options), graph);
    }

    /// Drop every entry for `root`, whatever its options. Returns how many
    /// were dropped.
    pub fn remove(&self, root: &Path) -> usize {
        let mut graphs = self.graphs.lock();
        let before = graphs.len();
        graphs.retain(|(path, _), _| path != root);
        before - graphs.len()
    }

    pub fn len(&self) -> usize {
        self.graphs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.graphs.lock().clear();
    }
}
