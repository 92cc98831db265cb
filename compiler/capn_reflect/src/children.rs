//! Child name iteration.

use std::sync::Arc;

use capn_schema::SchemaGraph;

/// Names of a node's children. Leaves produce an empty iterator.
///
/// Names are read from the graph as the iterator advances.
#[derive(Clone, Debug, Default)]
pub struct Children {
    source: Option<(Arc<SchemaGraph>, usize)>,
    next: usize,
}

impl Children {
    pub(crate) fn of(graph: Arc<SchemaGraph>, index: usize) -> Self {
        Children {
            source: Some((graph, index)),
            next: 0,
        }
    }

    pub(crate) fn empty() -> Self {
        Children::default()
    }

    fn total(&self) -> usize {
        self.source
            .as_ref()
            .map_or(0, |(graph, index)| graph.nodes()[*index].children.len())
    }
}

impl Iterator for Children {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let (graph, index) = self.source.as_ref()?;
        let name = graph.nodes()[*index].children.get(self.next)?.name.clone();
        self.next += 1;
        Some(name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Children {}

impl std::iter::FusedIterator for Children {}
