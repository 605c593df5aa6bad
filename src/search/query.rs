use std::path::Path;
use tantivy::{
    DocAddress, Index, IndexReader, Order, ReloadPolicy, Searcher, TantivyDocument,
    collector::{Count, TopDocs},
    query::{Query, QueryParser},
    schema::{Field, Value},
};

use crate::archive::Message;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::search::config::{MAX_QUERY_LENGTH, MAX_SEARCH_HITS};
use crate::search::indexer::{IndexFields, ORDINAL_FIELD, register_tokenizers};

/// Runs queries against the message index and resolves hits against a dataset
pub struct MessageSearcher {
    index: Index,
    reader: IndexReader,
    fields: IndexFields,
}

/// Messages matching one search, produced lazily in index order
///
/// Hits whose id is missing from the dataset are skipped and remembered in
/// [`SearchHits::orphaned`]; they mean the index was built from another import.
pub struct SearchHits<'a> {
    dataset: &'a Dataset,
    searcher: Searcher,
    id_field: Field,
    addresses: std::vec::IntoIter<DocAddress>,
    total_matches: usize,
    orphaned: Vec<String>,
}

/// The fully collected outcome of a search
#[derive(Debug)]
pub struct SearchResults<'a> {
    pub messages: Vec<&'a Message>,
    pub total_matches: usize,
    pub orphaned: Vec<String>,
}

impl MessageSearcher {
    /// Open the index at `index_path` with a fresh reader
    pub fn open(index_path: &Path) -> Result<Self> {
        let index = Index::open_in_dir(index_path)?;
        register_tokenizers(&index)?;
        let fields = IndexFields::from_schema(&index.schema())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    /// Number of messages in the index
    pub fn document_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Parse `query_text`; free text matches the `text` field
    pub fn parse(&self, query_text: &str) -> Result<Box<dyn Query>> {
        let syntax_error = |message: String| Error::QuerySyntax {
            message,
            input: query_text.to_string(),
        };

        if query_text.chars().count() > MAX_QUERY_LENGTH {
            return Err(syntax_error(format!(
                "query is longer than {MAX_QUERY_LENGTH} characters"
            )));
        }
        check_balanced(query_text).map_err(syntax_error)?;

        let parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
        parser
            .parse_query(query_text)
            .map_err(|e| syntax_error(e.to_string()))
    }

    /// Run a query and return its hits in index order, at most [`MAX_SEARCH_HITS`]
    pub fn search<'a>(&self, query_text: &str, dataset: &'a Dataset) -> Result<SearchHits<'a>> {
        let query = self.parse(query_text)?;
        let searcher = self.reader.searcher();

        let collector = (
            Count,
            TopDocs::with_limit(MAX_SEARCH_HITS).order_by_fast_field::<u64>(ORDINAL_FIELD, Order::Asc),
        );
        let (total_matches, top_docs) = searcher.search(&*query, &collector)?;

        tracing::debug!(
            "Query '{}' matched {} documents, returning {}",
            query_text,
            total_matches,
            top_docs.len()
        );

        let addresses: Vec<DocAddress> = top_docs.into_iter().map(|(_, address)| address).collect();
        Ok(SearchHits {
            dataset,
            searcher,
            id_field: self.fields.id,
            addresses: addresses.into_iter(),
            total_matches,
            orphaned: Vec::new(),
        })
    }
}

/// Search the index at `index_path` and resolve the hits against `dataset`
pub fn search<'a>(query_text: &str, dataset: &'a Dataset, index_path: &Path) -> Result<SearchHits<'a>> {
    MessageSearcher::open(index_path)?.search(query_text, dataset)
}

impl<'a> SearchHits<'a> {
    /// Documents that matched, before the hit cap was applied
    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    /// Ids of hits seen so far that are not part of the dataset
    pub fn orphaned(&self) -> &[String] {
        &self.orphaned
    }

    /// Drain the remaining hits
    pub fn collect_results(mut self) -> Result<SearchResults<'a>> {
        let messages = self.by_ref().collect::<Result<Vec<_>>>()?;
        Ok(SearchResults {
            messages,
            total_matches: self.total_matches,
            orphaned: self.orphaned,
        })
    }
}

impl<'a> Iterator for SearchHits<'a> {
    type Item = Result<&'a Message>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let address = self.addresses.next()?;
            let doc: TantivyDocument = match self.searcher.doc(address) {
                Ok(doc) => doc,
                Err(e) => return Some(Err(e.into())),
            };

            let message_id = doc
                .get_first(self.id_field)
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string();

            match self.dataset.message(&message_id) {
                Some(message) => return Some(Ok(message)),
                None => {
                    tracing::warn!(
                        "Couldn't find message #{} matching the search index. The search index may be out of sync.",
                        message_id
                    );
                    self.orphaned.push(message_id);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.addresses.len()))
    }
}

/// Reject unbalanced parentheses and unterminated phrases before parsing
fn check_balanced(query_text: &str) -> std::result::Result<(), String> {
    let mut depth = 0usize;
    let mut in_phrase = false;
    let mut chars = query_text.char_indices();

    while let Some((position, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => in_phrase = !in_phrase,
            '(' if !in_phrase => depth += 1,
            ')' if !in_phrase => {
                if depth == 0 {
                    return Err(format!("unexpected ')' at position {position}"));
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    if in_phrase {
        return Err("unterminated quoted phrase".to_string());
    }
    if depth > 0 {
        return Err(format!("{depth} unclosed '('"));
    }
    Ok(())
}
