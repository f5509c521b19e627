use crate::index::document::Document;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Index { id: String, doc: Document },
    Delete { id: String },
}

impl BatchOp {
    pub fn id(&self) -> &str {
        match self {
            BatchOp::Index { id, .. } | BatchOp::Delete { id } => id,
        }
    }
}

/// Operations submitted to the index as one unit.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace the document stored under `id`.
    pub fn index(&mut self, id: impl Into<String>, doc: Document) {
        self.ops.push(BatchOp::Index { id: id.into(), doc });
    }

    pub fn delete(&mut self, id: impl Into<String>) {
        self.ops.push(BatchOp::Delete { id: id.into() });
    }

    pub fn size(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}
