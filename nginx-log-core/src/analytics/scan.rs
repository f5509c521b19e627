use crate::index::{Document, IndexError, Query, SearchIndex, SearchRequest};

/// Pages through every match of `query`, fetching only `fields`.
pub(crate) fn for_each_document(
    index: &dyn SearchIndex,
    query: &Query,
    fields: &[&str],
    page_size: usize,
    mut visit: impl FnMut(&Document),
) -> Result<u64, IndexError> {
    let page_size = page_size.max(1);
    let mut offset = 0usize;

    loop {
        let request = SearchRequest::new(query.clone())
            .size(page_size)
            .offset(offset)
            .fields(fields);
        let page = index.search(&request)?;

        for hit in &page.hits {
            visit(&hit.fields);
        }

        offset += page.hits.len();
        if page.hits.len() < page_size {
            return Ok(offset as u64);
        }
    }
}

pub(crate) fn count(index: &dyn SearchIndex, query: &Query) -> Result<u64, IndexError> {
    Ok(index.search(&SearchRequest::count(query.clone()))?.total)
}
