use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};

/// Tokenizer name registered on every shard for analyzed fields.
pub const LOG_ANALYZER: &str = "nginx_log";

/// Lowercased alphanumeric runs, the same split `tokenize` does on the query side.
pub(crate) fn log_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(255))
        .filter(LowerCaser)
        .build()
}

/// Standard analyzer: lowercase, split on anything that is not alphanumeric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && t.len() < 255)
        .map(str::to_lowercase)
        .collect()
}
