use crate::index::analyzer::{LOG_ANALYZER, log_analyzer, tokenize};
use crate::index::batch::BatchOp;
use crate::index::document::{Document, FieldValue};
use crate::index::error::IndexError;
use crate::index::mapping::{FieldKind, LogSchema, MappedField};
use crate::index::query::{MatchOperator, Query, SortField};
use parking_lot::Mutex;
use std::cmp::{Ordering, Reverse};
use std::fs;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{
    AllQuery, BooleanQuery, ConstScoreQuery, EmptyQuery, PhraseQuery, Query as TantivyQuery,
    QueryClone, RangeQuery, RegexQuery, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{
    DocAddress, DocId, Index, IndexReader, IndexWriter, SegmentReader, Searcher,
    TantivyDocument, Term,
};

/// Indexing heap per shard writer.
const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// Sort key of one hit. Missing values sort after present ones in both directions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortValue {
    Number(f64),
    Text(String),
    Missing,
}

pub(crate) fn compare_sort_values(a: &SortValue, b: &SortValue, descending: bool) -> Ordering {
    let ord = match (a, b) {
        (SortValue::Missing, SortValue::Missing) => return Ordering::Equal,
        (SortValue::Missing, _) => return Ordering::Greater,
        (_, SortValue::Missing) => return Ordering::Less,
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    };
    if descending { ord.reverse() } else { ord }
}

/// Collector score: a hit that sorts first ranks highest.
#[derive(Debug, Clone, PartialEq)]
struct SortScore {
    value: SortValue,
    descending: bool,
}

impl PartialOrd for SortScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(compare_sort_values(&self.value, &other.value, self.descending).reverse())
    }
}

/// A hit located in one shard, not loaded yet.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub value: SortValue,
    pub shard: usize,
    pub address: DocAddress,
}

impl Candidate {
    /// Tie-break matching the collector's: lower address first.
    pub fn position(&self) -> (usize, u32, DocId) {
        (self.shard, self.address.segment_ord, self.address.doc_id)
    }
}

/// One tantivy index holding a slice of the documents.
pub(crate) struct Shard {
    schema: Arc<LogSchema>,
    reader: IndexReader,
    writer: Mutex<Option<IndexWriter>>,
}

impl Shard {
    pub fn in_memory(schema: Arc<LogSchema>) -> Result<Self, IndexError> {
        let index = Index::create_in_ram(schema.schema.clone());
        Self::from_index(schema, index)
    }

    /// Open the shard stored in `dir`, creating it when missing.
    pub fn open(schema: Arc<LogSchema>, dir: &Path) -> Result<Self, IndexError> {
        fs::create_dir_all(dir).map_err(|e| IndexError::storage(dir, e))?;
        let directory = MmapDirectory::open(dir).map_err(|source| IndexError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
        let index = Index::open_or_create(directory, schema.schema.clone())?;
        Self::from_index(schema, index)
    }

    fn from_index(schema: Arc<LogSchema>, index: Index) -> Result<Self, IndexError> {
        index.tokenizers().register(LOG_ANALYZER, log_analyzer());

        let writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
        let reader = index.reader()?;

        Ok(Self {
            schema,
            reader,
            writer: Mutex::new(Some(writer)),
        })
    }

    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Apply `ops` in order and commit them before returning.
    ///
    /// An index op replaces any live document with the same id.
    pub fn apply(&self, ops: Vec<BatchOp>) -> Result<(), IndexError> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or(IndexError::Closed)?;

        for op in ops {
            match op {
                BatchOp::Index { id, doc } => {
                    writer.delete_term(Term::from_field_text(self.schema.id, &id));
                    writer.add_document(self.to_tantivy(&id, &doc))?;
                }
                BatchOp::Delete { id } => {
                    writer.delete_term(Term::from_field_text(self.schema.id, &id));
                }
            }
        }

        // Visible to searches only once durable.
        writer.commit()?;
        drop(guard);
        self.reader.reload()?;
        Ok(())
    }

    /// Commit anything pending and release the writer.
    pub fn close(&self) -> Result<(), IndexError> {
        let Some(mut writer) = self.writer.lock().take() else {
            return Ok(());
        };
        writer.commit()?;
        writer.wait_merging_threads()?;
        Ok(())
    }

    /// Release the writer without committing.
    pub fn discard(&self) {
        drop(self.writer.lock().take());
    }

    pub fn count(&self, searcher: &Searcher, query: &dyn TantivyQuery) -> Result<u64, IndexError> {
        Ok(searcher.search(query, &Count)? as u64)
    }

    /// Up to `limit` matches in index order, after skipping `skip`.
    pub fn collect_in_order(
        &self,
        shard: usize,
        searcher: &Searcher,
        query: &dyn TantivyQuery,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Candidate>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        // Equal scores fall back to address order.
        let constant = ConstScoreQuery::new(query.box_clone(), 1.0);
        let top = searcher.search(&constant, &TopDocs::with_limit(limit).and_offset(skip))?;

        Ok(top
            .into_iter()
            .map(|(_, address)| Candidate {
                value: SortValue::Missing,
                shard,
                address,
            })
            .collect())
    }

    /// The best `limit` matches under `sort`.
    pub fn collect_sorted(
        &self,
        shard: usize,
        searcher: &Searcher,
        query: &dyn TantivyQuery,
        sort: &SortField,
        limit: usize,
    ) -> Result<Vec<Candidate>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let kind = self.schema.field(&sort.field).map(|f| f.kind);
        let field = sort.field.clone();
        let descending = sort.descending;

        let top: Vec<(SortScore, DocAddress)> = match kind {
            Some(FieldKind::Numeric) => {
                let collector =
                    TopDocs::with_limit(limit).custom_score(move |segment: &SegmentReader| {
                        let column = segment.fast_fields().f64(&field).ok();
                        move |doc: DocId| SortScore {
                            value: column
                                .as_ref()
                                .and_then(|c| c.first(doc))
                                .map_or(SortValue::Missing, SortValue::Number),
                            descending,
                        }
                    });
                searcher.search(query, &collector)?
            }
            Some(FieldKind::Keyword | FieldKind::TextKeyword) => {
                let collector =
                    TopDocs::with_limit(limit).custom_score(move |segment: &SegmentReader| {
                        let column = segment.fast_fields().str(&field).ok().flatten();
                        move |doc: DocId| {
                            let text = column.as_ref().and_then(|c| {
                                let ord = c.term_ords(doc).next()?;
                                let mut text = String::new();
                                c.ord_to_str(ord, &mut text).ok()?.then_some(text)
                            });
                            SortScore {
                                value: text.map_or(SortValue::Missing, SortValue::Text),
                                descending,
                            }
                        }
                    });
                searcher.search(query, &collector)?
            }
            // Not sortable: every hit ties and keeps address order.
            Some(FieldKind::Text) | None => {
                let collector = TopDocs::with_limit(limit).custom_score(|_: &SegmentReader| {
                    |doc: DocId| Reverse(doc)
                });
                searcher
                    .search(query, &collector)?
                    .into_iter()
                    .map(|(_, address)| {
                        let score = SortScore {
                            value: SortValue::Missing,
                            descending,
                        };
                        (score, address)
                    })
                    .collect()
            }
        };

        Ok(top
            .into_iter()
            .map(|(score, address)| Candidate {
                value: score.value,
                shard,
                address,
            })
            .collect())
    }

    /// Load the id and the requested stored fields of one hit.
    pub fn load(
        &self,
        searcher: &Searcher,
        address: DocAddress,
        fields: &[String],
    ) -> Result<(String, Document), IndexError> {
        let stored: TantivyDocument = searcher.doc(address)?;
        let id = stored
            .get_first(self.schema.id)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let all = fields.is_empty() || fields.iter().any(|f| f == "*");
        let mut doc = Document::new();
        for (name, mapped) in &self.schema.fields {
            if !all && !fields.iter().any(|f| f == name) {
                continue;
            }
            let Some(value) = stored.get_first(mapped.value) else {
                continue;
            };
            match mapped.kind {
                FieldKind::Numeric => {
                    if let Some(n) = value.as_f64() {
                        doc.insert(name, n);
                    }
                }
                _ => {
                    if let Some(text) = value.as_str() {
                        doc.insert(name, text);
                    }
                }
            }
        }

        Ok((id, doc))
    }

    fn to_tantivy(&self, id: &str, doc: &Document) -> TantivyDocument {
        let mut out = TantivyDocument::default();
        out.add_text(self.schema.id, id);

        for (name, value) in doc.iter() {
            let Some(mapped) = self.schema.field(name) else {
                continue;
            };
            match (mapped.kind, value) {
                (FieldKind::Numeric, _) => {
                    if let Some(n) = value.as_f64().filter(|n| !n.is_nan()) {
                        out.add_f64(mapped.value, n);
                    }
                }
                (_, FieldValue::Text(text)) => {
                    out.add_text(mapped.value, text);
                    if let Some(tokens) = mapped.tokens {
                        out.add_text(tokens, text);
                    }
                }
                (_, FieldValue::Number(_)) => {}
            }
        }
        out
    }

    /// Translate a query for this shard's schema.
    pub fn compile(&self, query: &Query) -> Result<Box<dyn TantivyQuery>, IndexError> {
        let compiled: Box<dyn TantivyQuery> = match query {
            Query::MatchAll => Box::new(AllQuery),
            Query::MatchNone => Box::new(EmptyQuery),
            Query::Term { field, value } => self.compile_term(field, value),
            Query::Prefix { field, prefix } => {
                let pattern = format!("{}.*", regex::escape(prefix));
                self.compile_regex(field, &pattern)?
            }
            Query::Regexp { field, pattern } => self.compile_regex(field, pattern)?,
            Query::Match {
                field,
                text,
                operator,
            } => self.compile_match(field, text, *operator),
            Query::MatchPhrase { field, text } => self.compile_phrase(field, text),
            Query::NumericRange {
                field,
                min,
                max,
                inclusive_min,
                inclusive_max,
            } => self.compile_range(field, *min, *max, *inclusive_min, *inclusive_max),
            Query::Conjunction(queries) if queries.is_empty() => Box::new(AllQuery),
            Query::Conjunction(queries) => Box::new(BooleanQuery::intersection(
                queries
                    .iter()
                    .map(|q| self.compile(q))
                    .collect::<Result<_, _>>()?,
            )),
            Query::Disjunction(queries) if queries.is_empty() => Box::new(EmptyQuery),
            Query::Disjunction(queries) => Box::new(BooleanQuery::union(
                queries
                    .iter()
                    .map(|q| self.compile(q))
                    .collect::<Result<_, _>>()?,
            )),
        };
        Ok(compiled)
    }

    fn compile_term(&self, field: &str, value: &str) -> Box<dyn TantivyQuery> {
        match self.schema.field(field) {
            Some(mapped) if mapped.kind == FieldKind::Numeric => match value.parse::<f64>() {
                Ok(v) => self.compile_range(field, Some(v), Some(v), true, true),
                Err(_) => Box::new(EmptyQuery),
            },
            Some(mapped) if mapped.kind.is_term_indexed() => Box::new(TermQuery::new(
                Term::from_field_text(mapped.value, value),
                IndexRecordOption::Basic,
            )),
            _ => Box::new(EmptyQuery),
        }
    }

    fn compile_regex(
        &self,
        field: &str,
        pattern: &str,
    ) -> Result<Box<dyn TantivyQuery>, IndexError> {
        let query: Box<dyn TantivyQuery> = match self.schema.field(field) {
            Some(mapped) if mapped.kind.is_term_indexed() => Box::new(
                RegexQuery::from_pattern(pattern, mapped.value)
                    .map_err(|e| IndexError::InvalidQuery(e.to_string()))?,
            ),
            _ => Box::new(EmptyQuery),
        };
        Ok(query)
    }

    /// Query-side tokens of `text`, or `None` when `field` is not analyzed.
    fn analyzed_terms(&self, field: &str, text: &str) -> Option<Vec<Term>> {
        let target: Field = self.schema.field(field).and_then(MappedField::analyzed)?;
        Some(
            tokenize(text)
                .iter()
                .map(|token| Term::from_field_text(target, token))
                .collect(),
        )
    }

    fn compile_match(
        &self,
        field: &str,
        text: &str,
        operator: MatchOperator,
    ) -> Box<dyn TantivyQuery> {
        let Some(terms) = self.analyzed_terms(field, text) else {
            return self.compile_term(field, text);
        };

        let mut queries: Vec<Box<dyn TantivyQuery>> = terms
            .into_iter()
            .map(|term| {
                Box::new(TermQuery::new(term, IndexRecordOption::Basic)) as Box<dyn TantivyQuery>
            })
            .collect();

        match (queries.len(), operator) {
            (0, _) => Box::new(EmptyQuery),
            (1, _) => queries.remove(0),
            (_, MatchOperator::And) => Box::new(BooleanQuery::intersection(queries)),
            (_, MatchOperator::Or) => Box::new(BooleanQuery::union(queries)),
        }
    }

    fn compile_phrase(&self, field: &str, text: &str) -> Box<dyn TantivyQuery> {
        let Some(mut terms) = self.analyzed_terms(field, text) else {
            return self.compile_term(field, text);
        };

        match terms.len() {
            0 => Box::new(EmptyQuery),
            1 => Box::new(TermQuery::new(terms.remove(0), IndexRecordOption::Basic)),
            _ => Box::new(PhraseQuery::new(terms)),
        }
    }

    fn compile_range(
        &self,
        field: &str,
        min: Option<f64>,
        max: Option<f64>,
        inclusive_min: bool,
        inclusive_max: bool,
    ) -> Box<dyn TantivyQuery> {
        match self.schema.field(field) {
            Some(mapped) if mapped.kind == FieldKind::Numeric => {}
            _ => return Box::new(EmptyQuery),
        }

        if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
            return Box::new(EmptyQuery);
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi || (lo == hi && !(inclusive_min && inclusive_max)) {
                return Box::new(EmptyQuery);
            }
        }

        let lower = match min {
            Some(v) if inclusive_min => Bound::Included(v),
            Some(v) => Bound::Excluded(v),
            None => Bound::Unbounded,
        };
        let upper = match max {
            Some(v) if inclusive_max => Bound::Included(v),
            Some(v) => Bound::Excluded(v),
            None => Bound::Unbounded,
        };
        Box::new(RangeQuery::new_f64_bounds(field.to_string(), lower, upper))
    }
}
