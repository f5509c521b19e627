use crate::index::analyzer::LOG_ANALYZER;
use std::collections::HashMap;
use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing,
    TextOptions,
};

/// Stored id of every document; deletes and upserts go through it.
pub(crate) const ID_FIELD: &str = "_id";
const TOKENS_SUFFIX: &str = "_tokens";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole value is one term.
    Keyword,
    /// Analyzed into tokens for match queries. Not term-indexed.
    Text,
    /// Analyzed into tokens and also term-indexed on the whole value.
    TextKeyword,
    /// Range-queryable and sortable number (timestamps are Unix seconds).
    Numeric,
}

impl FieldKind {
    pub fn is_term_indexed(&self) -> bool {
        matches!(self, FieldKind::Keyword | FieldKind::TextKeyword)
    }

    pub fn is_analyzed(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::TextKeyword)
    }
}

/// Field → kind. Unmapped fields are neither indexed nor stored.
#[derive(Debug, Clone, Default)]
pub struct IndexMapping {
    fields: HashMap<String, FieldKind>,
}

impl IndexMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.insert(name.to_string(), kind);
        self
    }

    pub fn kind(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }

    /// Mapping for parsed access-log documents.
    pub fn nginx_log() -> Self {
        let mut mapping = Self::new().field("timestamp", FieldKind::Numeric);

        for keyword in [
            "file_path",
            "main_log_path",
            "source_file",
            "ip",
            "method",
            "protocol",
            "browser",
            "browser_version",
            "os",
            "os_version",
            "device_type",
            "region_code",
            "province",
            "city",
        ] {
            mapping = mapping.field(keyword, FieldKind::Keyword);
        }

        for text in ["path", "referer", "user_agent"] {
            mapping = mapping.field(text, FieldKind::TextKeyword);
        }
        mapping = mapping.field("raw", FieldKind::Text);

        for numeric in ["status", "bytes_sent", "request_time", "upstream_time"] {
            mapping = mapping.field(numeric, FieldKind::Numeric);
        }

        mapping
    }

    /// Tantivy schema for this mapping.
    ///
    /// Keyword values are raw-tokenized and fast so they sort. `TextKeyword`
    /// fields get a second, analyzed field holding their tokens. Numbers are
    /// `f64` fast fields.
    pub(crate) fn schema(&self) -> LogSchema {
        let mut builder = Schema::builder();
        let id = builder.add_text_field(ID_FIELD, STRING | STORED);

        let analyzed = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(LOG_ANALYZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );

        // Sorted for a stable schema across opens.
        let mut names: Vec<(&String, &FieldKind)> = self.fields.iter().collect();
        names.sort_by(|a, b| a.0.cmp(b.0));

        let mut fields = HashMap::with_capacity(names.len());
        for (name, kind) in names {
            let mapped = match kind {
                FieldKind::Numeric => MappedField {
                    kind: *kind,
                    value: builder.add_f64_field(name, INDEXED | STORED | FAST),
                    tokens: None,
                },
                FieldKind::Keyword => MappedField {
                    kind: *kind,
                    value: builder.add_text_field(name, STRING | STORED | FAST),
                    tokens: None,
                },
                FieldKind::Text => MappedField {
                    kind: *kind,
                    value: builder.add_text_field(name, analyzed.clone() | STORED),
                    tokens: None,
                },
                FieldKind::TextKeyword => {
                    let tokens_name = format!("{name}{TOKENS_SUFFIX}");
                    MappedField {
                        kind: *kind,
                        value: builder.add_text_field(name, STRING | STORED | FAST),
                        tokens: Some(builder.add_text_field(&tokens_name, analyzed.clone())),
                    }
                }
            };
            fields.insert(name.clone(), mapped);
        }

        LogSchema {
            schema: builder.build(),
            id,
            fields,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MappedField {
    pub kind: FieldKind,
    /// Stored value; the exact term for keyword kinds.
    pub value: Field,
    /// Analyzed tokens, when the kind has them apart from `value`.
    pub tokens: Option<Field>,
}

impl MappedField {
    /// Field match and phrase queries run against.
    pub fn analyzed(&self) -> Option<Field> {
        match self.kind {
            FieldKind::Text => Some(self.value),
            FieldKind::TextKeyword => self.tokens,
            FieldKind::Keyword | FieldKind::Numeric => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LogSchema {
    pub schema: Schema,
    pub id: Field,
    pub fields: HashMap<String, MappedField>,
}

impl LogSchema {
    pub fn field(&self, name: &str) -> Option<&MappedField> {
        self.fields.get(name)
    }
}
