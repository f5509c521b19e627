use crate::index::{
    Batch, Document, IndexError, IndexMapping, Query, SearchIndex, SearchRequest, ShardedIndex,
    SortField,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn doc(ts: i64, status: i64, path: &str, file_path: &str) -> Document {
    Document::new()
        .with("timestamp", ts)
        .with("status", status)
        .with("path", path)
        .with("file_path", file_path)
        .with("ip", "1.2.3.4")
        .with("user_agent", "Mozilla/5.0 Chrome Safari")
}

fn index_with(docs: Vec<(String, Document)>) -> ShardedIndex {
    let index = ShardedIndex::in_memory(4, IndexMapping::nginx_log()).unwrap();
    let mut batch = Batch::new();
    for (id, d) in docs {
        batch.index(id, d);
    }
    index.execute(batch).unwrap();
    index
}

fn ids(index: &ShardedIndex, request: SearchRequest) -> Vec<String> {
    index
        .search(&request)
        .unwrap()
        .hits
        .into_iter()
        .map(|h| h.id)
        .collect()
}

#[test]
fn term_queries_match_whole_keyword_values() {
    // Arrange
    let index = index_with(vec![
        ("a".into(), doc(1, 200, "/x", "/var/log/nginx/access.log")),
        ("b".into(), doc(2, 200, "/x", "/var/log/nginx/access.log.bak")),
    ]);

    // Act
    let result = index
        .search(&SearchRequest::new(Query::term("file_path", "/var/log/nginx/access.log")))
        .unwrap();

    // Assert
    assert_eq!(result.total, 1);
    assert_eq!(result.hits[0].id, "a");
}

#[test]
fn status_disjunction_sorted_by_timestamp_desc() {
    // Arrange
    let statuses = [200, 301, 404, 500, 200];
    let index = index_with(
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("doc{i}"), doc(100 + i as i64, *s, "/", "/a.log")))
            .collect(),
    );
    let query = Query::or(vec![
        Query::range_inclusive("status", 200.0, 200.0),
        Query::range_inclusive("status", 404.0, 404.0),
    ]);

    // Act
    let hits = ids(
        &index,
        SearchRequest::new(query).size(10).sort(SortField::desc("timestamp")),
    );

    // Assert
    assert_eq!(hits, vec!["doc4", "doc2", "doc0"]);
}

#[test]
fn pagination_is_applied_after_merge() {
    // Arrange
    let index = index_with(
        (0..50)
            .map(|i| (format!("doc{i:02}"), doc(i, 200, "/", "/a.log")))
            .collect(),
    );
    let sort = SortField::asc("timestamp");

    // Act
    let page = ids(
        &index,
        SearchRequest::new(Query::MatchAll).offset(10).size(5).sort(sort),
    );

    // Assert
    assert_eq!(page, vec!["doc10", "doc11", "doc12", "doc13", "doc14"]);
}

#[test]
fn unsorted_pages_cover_every_document_once() {
    // Arrange
    let index = index_with(
        (0..237)
            .map(|i| (format!("doc{i}"), doc(i, 200, "/", "/a.log")))
            .collect(),
    );

    // Act
    let mut seen = Vec::new();
    let mut from = 0;
    loop {
        let page = ids(&index, SearchRequest::new(Query::MatchAll).offset(from).size(50));
        if page.is_empty() {
            break;
        }
        from += page.len();
        seen.extend(page);
    }

    // Assert
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 237);
}

#[test]
fn size_zero_counts_only() {
    let index = index_with(vec![("a".into(), doc(1, 200, "/", "/a.log"))]);

    let result = index.search(&SearchRequest::count(Query::MatchAll)).unwrap();

    assert_eq!(result.total, 1);
    assert!(result.hits.is_empty());
}

#[test]
fn prefix_and_regexp_queries() {
    let index = index_with(vec![
        ("a".into(), doc(1, 200, "/api/users", "/a.log")),
        ("b".into(), doc(2, 200, "/api/orders", "/a.log")),
        ("c".into(), doc(3, 200, "/static/app.js", "/a.log")),
    ]);

    let mut prefixed = ids(&index, SearchRequest::new(Query::prefix("path", "/api/")));
    prefixed.sort();
    assert_eq!(prefixed, vec!["a", "b"]);

    let regexp = ids(&index, SearchRequest::new(Query::regexp("path", ".*app.*")));
    assert_eq!(regexp, vec!["c"]);

    let bad = index.search(&SearchRequest::new(Query::regexp("path", "(")));
    assert!(matches!(bad, Err(IndexError::InvalidQuery(_))));
}

#[test]
fn match_and_phrase_queries_use_tokens() {
    let index = index_with(vec![
        ("a".into(), doc(1, 200, "/", "/a.log").with("raw", "GET /login chrome")),
        ("b".into(), doc(2, 200, "/", "/a.log").with("raw", "chrome GET /home")),
    ]);

    let mut both = ids(&index, SearchRequest::new(Query::matching("raw", "get CHROME")));
    both.sort();
    assert_eq!(both, vec!["a", "b"]);

    let phrase = ids(&index, SearchRequest::new(Query::phrase("raw", "chrome get")));
    assert_eq!(phrase, vec!["b"]);
}

#[test]
fn half_open_time_ranges_exclude_the_end() {
    let index = index_with(
        (0..10)
            .map(|i| (format!("doc{i}"), doc(i, 200, "/", "/a.log")))
            .collect(),
    );

    let result = index
        .search(&SearchRequest::count(Query::range_half_open("timestamp", 2.0, 5.0)))
        .unwrap();
    assert_eq!(result.total, 3);

    let inverted = index
        .search(&SearchRequest::count(Query::range_half_open("timestamp", 5.0, 2.0)))
        .unwrap();
    assert_eq!(inverted.total, 0);
}

#[test]
fn reindexing_an_id_replaces_the_document() {
    // Arrange
    let index = index_with(vec![("a".into(), doc(1, 200, "/old", "/a.log"))]);

    // Act
    let mut batch = Batch::new();
    batch.index("a", doc(1, 500, "/new", "/a.log"));
    index.execute(batch).unwrap();

    // Assert
    assert_eq!(index.doc_count().unwrap(), 1);
    let old = index.search(&SearchRequest::count(Query::term("path", "/old"))).unwrap();
    assert_eq!(old.total, 0);
    let new = index.search(&SearchRequest::count(Query::term("status", "500"))).unwrap();
    assert_eq!(new.total, 1);
}

#[test]
fn deletes_remove_documents_from_every_posting() {
    // Arrange
    let index = index_with(
        (0..20)
            .map(|i| (format!("doc{i}"), doc(i, 200, "/", "/a.log")))
            .collect(),
    );

    // Act
    let mut batch = Batch::new();
    for i in 0..20 {
        batch.delete(format!("doc{i}"));
    }
    index.execute(batch).unwrap();

    // Assert
    assert_eq!(index.doc_count().unwrap(), 0);
    let by_file = index.search(&SearchRequest::count(Query::term("file_path", "/a.log"))).unwrap();
    assert_eq!(by_file.total, 0);
}

#[test]
fn field_projection_limits_returned_fields() {
    let index = index_with(vec![("a".into(), doc(1, 200, "/x", "/a.log"))]);

    let result = index
        .search(&SearchRequest::new(Query::MatchAll).fields(&["ip", "path"]))
        .unwrap();

    let fields = &result.hits[0].fields;
    assert_eq!(fields.len(), 2);
    assert_eq!(fields.text("ip"), Some("1.2.3.4"));
}

#[test]
fn closed_index_rejects_operations() {
    let index = ShardedIndex::in_memory(2, IndexMapping::nginx_log()).unwrap();

    index.close().unwrap();

    assert!(matches!(index.doc_count(), Err(IndexError::Closed)));
    assert!(matches!(index.execute(Batch::new()), Err(IndexError::Closed)));
}

#[test]
fn deep_sorted_pages_stay_in_order() {
    // Arrange
    let index = index_with(
        (0..300)
            .map(|i| (format!("doc{i:03}"), doc(i, 200, "/", "/a.log")))
            .collect(),
    );

    // Act
    let page = ids(
        &index,
        SearchRequest::new(Query::MatchAll)
            .offset(290)
            .size(20)
            .sort(SortField::desc("timestamp")),
    );

    // Assert
    let expected: Vec<String> = (0..10).rev().map(|i| format!("doc{i:03}")).collect();
    assert_eq!(page, expected);
}

#[test]
fn keyword_sort_puts_missing_values_last() {
    // Arrange
    let index = index_with(vec![
        ("a".into(), doc(1, 200, "/", "/a.log").with("browser", "Safari")),
        ("b".into(), doc(2, 200, "/", "/a.log")),
        ("c".into(), doc(3, 200, "/", "/a.log").with("browser", "Chrome")),
    ]);

    // Act
    let asc = ids(&index, SearchRequest::new(Query::MatchAll).sort(SortField::asc("browser")));
    let desc = ids(&index, SearchRequest::new(Query::MatchAll).sort(SortField::desc("browser")));

    // Assert
    assert_eq!(asc, vec!["c", "a", "b"]);
    assert_eq!(desc, vec!["a", "c", "b"]);
}

#[test]
fn committed_batches_survive_a_drop_without_close() {
    // Arrange
    let dir = tempdir().unwrap();
    let index = ShardedIndex::open(dir.path(), 3, IndexMapping::nginx_log()).unwrap();
    let mut batch = Batch::new();
    for i in 0..30 {
        batch.index(format!("doc{i}"), doc(i, 200, "/", "/a.log"));
    }
    index.execute(batch).unwrap();

    // Act
    drop(index);
    let reopened = ShardedIndex::open(dir.path(), 3, IndexMapping::nginx_log()).unwrap();

    // Assert
    assert_eq!(reopened.doc_count().unwrap(), 30);
    let by_file = reopened
        .search(&SearchRequest::count(Query::term("file_path", "/a.log")))
        .unwrap();
    assert_eq!(by_file.total, 30);
}

#[test]
fn reopen_keeps_the_original_shard_count() {
    // Arrange
    let dir = tempdir().unwrap();
    let index = ShardedIndex::open(dir.path(), 4, IndexMapping::nginx_log()).unwrap();
    let mut batch = Batch::new();
    for i in 0..30 {
        batch.index(format!("doc{i}"), doc(i, 200, "/", "/a.log"));
    }
    index.execute(batch).unwrap();

    // Act
    index.close().unwrap();
    drop(index);
    let reopened = ShardedIndex::open(dir.path(), 2, IndexMapping::nginx_log()).unwrap();

    // Assert
    assert_eq!(reopened.shard_count(), 4);
    assert_eq!(reopened.doc_count().unwrap(), 30);
}
