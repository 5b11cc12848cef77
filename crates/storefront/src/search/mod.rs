//! Full-text search using Tantivy.
//!
//! An in-memory index of products (from the commerce backend) and blog posts
//! (from the content database), keyed by `(index_type, object_id)`.
//!
//! The app starts immediately with an empty index. A background task fills it
//! (see [`spawn_initial_sync`]) and product webhooks keep it current through
//! [`SearchIndex::index_data`] and [`SearchIndex::delete_from_index`].

mod indexer;

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, instrument};

pub use indexer::{
    SyncOutcome, blog_document, product_document, remove_product, spawn_initial_sync, sync_product,
};
pub(crate) use indexer::index_blogs;

/// Writer heap budget (tantivy requires at least 15MB per thread).
const WRITER_HEAP_BYTES: usize = 20_000_000;

/// Kinds of indexed objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Product,
    Blog,
}

impl IndexType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Blog => "blog",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(Self::Product),
            "blog" => Some(Self::Blog),
            _ => None,
        }
    }
}

/// A document to index.
///
/// `body` is searchable but not stored, so it is always empty on documents
/// read back from the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub object_id: String,
    /// Product handle or blog slug.
    pub handle: String,
    pub title: String,
    /// Short plain-text summary shown in results.
    pub description: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub body: String,
}

/// A search result item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub index_type: IndexType,
    #[serde(flatten)]
    pub document: SearchDocument,
    pub score: f32,
}

/// Search results for one query.
#[derive(Debug, Default, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

/// Schema field handles for the search index.
#[derive(Clone)]
struct SearchFields {
    // Exact-match keys
    key: Field,
    index_type: Field,
    object_id: Field,
    // Stored fields (returned in results)
    handle: Field,
    title: Field,
    description: Field,
    image_url: Field,
    price: Field,
    tags: Field,
    // Text fields for full-text search (not stored, just indexed)
    title_text: Field,
    body_text: Field,
    tags_text: Field,
}

struct SearchIndexInner {
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: SearchFields,
}

/// The search index.
#[derive(Clone)]
pub struct SearchIndex {
    inner: Arc<SearchIndexInner>,
}

impl SearchIndex {
    /// Create a new empty in-memory index.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Index` if the writer or reader cannot be created.
    pub fn new() -> Result<Self, SearchError> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);

        // Register the English stemmer tokenizer
        index.tokenizers().register(
            "en_stem",
            tantivy::tokenizer::TextAnalyzer::builder(
                tantivy::tokenizer::SimpleTokenizer::default(),
            )
            .filter(tantivy::tokenizer::RemoveLongFilter::limit(40))
            .filter(tantivy::tokenizer::LowerCaser)
            .filter(tantivy::tokenizer::Stemmer::new(
                tantivy::tokenizer::Language::English,
            ))
            .build(),
        );

        let writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_HEAP_BYTES)
            .map_err(|e| SearchError::Index(format!("Failed to create writer: {e}")))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::Index(format!("Failed to create reader: {e}")))?;

        Ok(Self {
            inner: Arc::new(SearchIndexInner {
                reader,
                writer: Mutex::new(writer),
                fields,
            }),
        })
    }

    /// Insert or replace documents of one type.
    ///
    /// Returns the number of documents written.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Index` if the commit fails.
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    pub fn index_data(
        &self,
        index_type: IndexType,
        docs: &[SearchDocument],
    ) -> Result<usize, SearchError> {
        let fields = &self.inner.fields;
        self.write(|writer| {
            for doc in docs {
                writer.delete_term(key_term(fields, index_type, &doc.object_id));
                writer
                    .add_document(to_tantivy(fields, index_type, doc))
                    .map_err(|e| {
                        SearchError::Index(format!("Failed to add {}: {e}", doc.object_id))
                    })?;
            }
            Ok(docs.len())
        })
    }

    /// Remove documents by object id. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Index` if the commit fails.
    #[instrument(skip(self))]
    pub fn delete_from_index(
        &self,
        index_type: IndexType,
        object_ids: &[String],
    ) -> Result<(), SearchError> {
        let fields = &self.inner.fields;
        self.write(|writer| {
            for id in object_ids {
                writer.delete_term(key_term(fields, index_type, id));
            }
            Ok(())
        })
    }

    /// Fetch one stored document.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Query` if the lookup fails.
    pub fn retrieve_from_index(
        &self,
        index_type: IndexType,
        object_id: &str,
    ) -> Result<Option<SearchDocument>, SearchError> {
        let fields = &self.inner.fields;
        let searcher = self.inner.reader.searcher();
        let query = TermQuery::new(
            key_term(fields, index_type, object_id),
            IndexRecordOption::Basic,
        );

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(|e| SearchError::Query(format!("Lookup failed: {e}")))?;

        top_docs
            .into_iter()
            .next()
            .map(|(_, address)| {
                searcher
                    .doc::<TantivyDocument>(address)
                    .map(|doc| from_tantivy(fields, &doc))
                    .map_err(|e| SearchError::Query(format!("Failed to retrieve doc: {e}")))
            })
            .transpose()
    }

    /// Search titles, bodies and tags.
    ///
    /// Each word matches exactly, by prefix, and (from three characters) with
    /// one typo. `index_type` restricts results to one kind of object.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Query` if the search fails.
    #[instrument(skip(self))]
    pub fn search(
        &self,
        index_type: Option<IndexType>,
        query_str: &str,
        limit: usize,
    ) -> Result<SearchResults, SearchError> {
        let query_str = query_str.trim().to_lowercase();
        if query_str.is_empty() || limit == 0 {
            return Ok(SearchResults {
                query: query_str,
                hits: Vec::new(),
            });
        }

        let fields = &self.inner.fields;
        let searcher = self.inner.reader.searcher();

        let mut query: Box<dyn Query> = Box::new(text_query(fields, &query_str));
        if let Some(index_type) = index_type {
            let type_term = Term::from_field_text(fields.index_type, index_type.as_str());
            query = Box::new(BooleanQuery::new(vec![
                (Occur::Must, query),
                (
                    Occur::Must,
                    Box::new(TermQuery::new(type_term, IndexRecordOption::Basic)),
                ),
            ]));
        }

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| SearchError::Query(format!("Search failed: {e}")))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc = searcher
                .doc::<TantivyDocument>(address)
                .map_err(|e| SearchError::Query(format!("Failed to retrieve doc: {e}")))?;

            let type_str = doc
                .get_first(fields.index_type)
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let hit_type = IndexType::parse(type_str)
                .ok_or_else(|| SearchError::Query(format!("Invalid index type: {type_str}")))?;

            hits.push(SearchHit {
                index_type: hit_type,
                document: from_tantivy(fields, &doc),
                score,
            });
        }

        debug!(hits = hits.len(), "Search complete");
        Ok(SearchResults {
            query: query_str,
            hits,
        })
    }

    /// Number of live documents.
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.inner.reader.searcher().num_docs()
    }

    /// Run `f` against the writer, commit, and make the changes visible.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut IndexWriter) -> Result<T, SearchError>,
    ) -> Result<T, SearchError> {
        let mut writer = self
            .inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let result = match f(&mut writer) {
            Ok(result) => result,
            Err(e) => {
                writer
                    .rollback()
                    .map_err(|re| SearchError::Index(format!("Rollback failed: {re}")))?;
                return Err(e);
            }
        };
        writer
            .commit()
            .map_err(|e| SearchError::Index(format!("Failed to commit index: {e}")))?;
        drop(writer);

        self.inner
            .reader
            .reload()
            .map_err(|e| SearchError::Index(format!("Failed to reload reader: {e}")))?;
        Ok(result)
    }
}

/// Build the schema for the search index.
fn build_schema() -> (Schema, SearchFields) {
    let mut schema_builder = Schema::builder();

    // STRING means indexed but not tokenized (exact match)
    let key = schema_builder.add_text_field("key", STRING);
    let index_type = schema_builder.add_text_field("index_type", STRING | STORED);
    let object_id = schema_builder.add_text_field("object_id", STRING | STORED);

    let handle = schema_builder.add_text_field("handle", STORED);
    let title = schema_builder.add_text_field("title", STORED);
    let description = schema_builder.add_text_field("description", STORED);
    let image_url = schema_builder.add_text_field("image_url", STORED);
    let price = schema_builder.add_text_field("price", STORED);
    let tags = schema_builder.add_text_field("tags", STORED);

    // Text indexing options for full-text search
    let text_indexing = TextFieldIndexing::default()
        .set_tokenizer("en_stem")
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default().set_indexing_options(text_indexing);

    let title_text = schema_builder.add_text_field("title_text", text_options.clone());
    let body_text = schema_builder.add_text_field("body_text", text_options.clone());
    let tags_text = schema_builder.add_text_field("tags_text", text_options);

    let fields = SearchFields {
        key,
        index_type,
        object_id,
        handle,
        title,
        description,
        image_url,
        price,
        tags,
        title_text,
        body_text,
        tags_text,
    };

    (schema_builder.build(), fields)
}

fn key_term(fields: &SearchFields, index_type: IndexType, object_id: &str) -> Term {
    Term::from_field_text(fields.key, &format!("{}:{object_id}", index_type.as_str()))
}

fn to_tantivy(fields: &SearchFields, index_type: IndexType, doc: &SearchDocument) -> TantivyDocument {
    let mut out = TantivyDocument::default();
    out.add_text(fields.key, format!("{}:{}", index_type.as_str(), doc.object_id));
    out.add_text(fields.index_type, index_type.as_str());
    out.add_text(fields.object_id, &doc.object_id);
    out.add_text(fields.handle, &doc.handle);
    out.add_text(fields.title, &doc.title);
    out.add_text(fields.description, &doc.description);
    if let Some(image_url) = &doc.image_url {
        out.add_text(fields.image_url, image_url);
    }
    if let Some(price) = &doc.price {
        out.add_text(fields.price, price);
    }
    for tag in &doc.tags {
        out.add_text(fields.tags, tag);
    }
    out.add_text(fields.title_text, &doc.title);
    out.add_text(fields.body_text, format!("{} {}", doc.description, doc.body));
    out.add_text(fields.tags_text, doc.tags.join(" "));
    out
}

fn from_tantivy(fields: &SearchFields, doc: &TantivyDocument) -> SearchDocument {
    let get_text = |field: Field| -> Option<String> {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    SearchDocument {
        object_id: get_text(fields.object_id).unwrap_or_default(),
        handle: get_text(fields.handle).unwrap_or_default(),
        title: get_text(fields.title).unwrap_or_default(),
        description: get_text(fields.description).unwrap_or_default(),
        image_url: get_text(fields.image_url),
        price: get_text(fields.price),
        tags: doc
            .get_all(fields.tags)
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        body: String::new(),
    }
}

/// Build a boolean query combining exact, prefix and fuzzy matches.
fn text_query(fields: &SearchFields, query_str: &str) -> BooleanQuery {
    let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    for term in query_str.split_whitespace() {
        // Prefix match on title and tags (e.g., "rai" matches "rainbow")
        let escaped: String = term
            .chars()
            .flat_map(|c| match c {
                '.' | '*' | '+' | '?' | '^' | '$' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
                | '\\' => vec!['\\', c],
                _ => vec![c],
            })
            .collect();
        let prefix_pattern = format!("{escaped}.*");
        for field in [fields.title_text, fields.tags_text] {
            if let Ok(regex_query) = RegexQuery::from_pattern(&prefix_pattern, field) {
                subqueries.push((Occur::Should, Box::new(regex_query)));
            }
        }

        for field in [fields.title_text, fields.body_text, fields.tags_text] {
            let exact = Term::from_field_text(field, term);
            subqueries.push((
                Occur::Should,
                Box::new(TermQuery::new(exact.clone(), IndexRecordOption::Basic)),
            ));

            // Fuzzy match (1 edit distance) for longer words only
            if term.chars().count() >= 3 {
                subqueries.push((Occur::Should, Box::new(FuzzyTermQuery::new(exact, 1, true))));
            }
        }
    }

    BooleanQuery::new(subqueries)
}

/// Search errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Index error: {0}")]
    Index(String),
    #[error("Query error: {0}")]
    Query(String),
}
