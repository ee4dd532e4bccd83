//! Free-text relevance search over store names and descriptions.
//!
//! Builds an in-memory Tantivy index from a store scan. Each whitespace
//! term in a query becomes an exact `TermQuery` on the name and description
//! fields plus, for terms of three or more characters, a distance-1
//! `FuzzyTermQuery`. Fuzzy matches score a constant 1.0 while exact matches
//! additionally accrue BM25, so a whole-word match always outranks a
//! fuzzy-only one.
//!
//! Ties are broken deterministically: equal scores order by store creation
//! time ascending, then slug ascending.

use serde::Serialize;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, STORED, Schema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, Term};
use tracing::instrument;

use storefinder_core::Slug;

use crate::models::Store;

use super::DiscoveryError;

/// Minimum term length for fuzzy matching.
const FUZZY_MIN_LEN: usize = 3;

/// A search result: a store reference plus its relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// URL identifier.
    pub slug: Slug,
    /// Display name.
    pub name: String,
    /// Relevance score; higher is better. Comparable only within one result
    /// list.
    pub score: f32,
}

/// Schema field handles for the relevance index.
#[derive(Clone, Copy)]
struct RelevanceFields {
    // Stored fields (returned in results)
    slug: Field,
    name: Field,
    created_ts: Field,
    // Indexed text fields (searched, not stored)
    name_text: Field,
    description_text: Field,
}

/// In-memory relevance index over all stores.
pub struct RelevanceIndex {
    reader: IndexReader,
    fields: RelevanceFields,
}

impl RelevanceIndex {
    /// Build the index from a store scan.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Index`] if the index cannot be created or
    /// committed.
    pub fn build(stores: &[Store]) -> Result<Self, DiscoveryError> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);

        // Word tokenizer with lowercasing; exact terms, no stemming, so a
        // query token matches exactly the indexed token
        index.tokenizers().register(
            "store_text",
            tantivy::tokenizer::TextAnalyzer::builder(
                tantivy::tokenizer::SimpleTokenizer::default(),
            )
            .filter(tantivy::tokenizer::RemoveLongFilter::limit(40))
            .filter(tantivy::tokenizer::LowerCaser)
            .build(),
        );

        let mut writer = index
            .writer(15_000_000)
            .map_err(|e| DiscoveryError::Index(format!("failed to create writer: {e}")))?;

        for store in stores {
            let created_ts = u64::try_from(store.created_at.timestamp()).unwrap_or(0);
            let doc = tantivy::doc!(
                fields.slug => store.slug.as_str(),
                fields.name => store.name.clone(),
                fields.created_ts => created_ts,
                fields.name_text => store.name.clone(),
                fields.description_text => store.description.clone()
            );
            writer
                .add_document(doc)
                .map_err(|e| DiscoveryError::Index(format!("failed to index store: {e}")))?;
        }

        writer
            .commit()
            .map_err(|e| DiscoveryError::Index(format!("failed to commit index: {e}")))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| DiscoveryError::Index(format!("failed to create reader: {e}")))?;

        Ok(Self { reader, fields })
    }

    /// Search store names and descriptions.
    ///
    /// Results are sorted by descending score; ties order by store creation
    /// time ascending, then slug. No matches yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::EmptyQuery`] for an empty or whitespace-only
    /// query, [`DiscoveryError::Query`] if the search itself fails.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, DiscoveryError> {
        let query_str = query.trim().to_lowercase();
        if query_str.is_empty() {
            return Err(DiscoveryError::EmptyQuery);
        }

        let searcher = self.reader.searcher();

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for term in query_str.split_whitespace() {
            let name_term = Term::from_field_text(self.fields.name_text, term);
            subqueries.push((
                Occur::Should,
                Box::new(TermQuery::new(name_term.clone(), IndexRecordOption::Basic)),
            ));

            let desc_term = Term::from_field_text(self.fields.description_text, term);
            subqueries.push((
                Occur::Should,
                Box::new(TermQuery::new(desc_term.clone(), IndexRecordOption::Basic)),
            ));

            if term.len() >= FUZZY_MIN_LEN {
                subqueries.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new(name_term, 1, true)),
                ));
                subqueries.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new(desc_term, 1, true)),
                ));
            }
        }

        let boolean = BooleanQuery::new(subqueries);

        // Over-fetch so the deterministic re-sort sees every tie candidate
        let fetch = limit.max(1).saturating_mul(4);
        let top_docs = searcher
            .search(&boolean, &TopDocs::with_limit(fetch))
            .map_err(|e| DiscoveryError::Query(format!("search failed: {e}")))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc = searcher
                .doc::<TantivyDocument>(doc_address)
                .map_err(|e| DiscoveryError::Query(format!("failed to retrieve doc: {e}")))?;

            let get_text = |field: Field| -> String {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_owned()
            };
            let created_ts = doc
                .get_first(self.fields.created_ts)
                .and_then(|v| v.as_u64())
                .unwrap_or(0);

            hits.push((score, created_ts, get_text(self.fields.slug), get_text(self.fields.name)));
        }

        hits.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        hits.truncate(limit);

        Ok(hits
            .into_iter()
            .filter_map(|(score, _, slug, name)| {
                let slug = Slug::base(&slug).ok()?;
                Some(SearchHit { slug, name, score })
            })
            .collect())
    }

    /// Number of indexed stores.
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Build the schema for the relevance index.
fn build_schema() -> (Schema, RelevanceFields) {
    let mut schema_builder = Schema::builder();

    let slug = schema_builder.add_text_field("slug", STORED);
    let name = schema_builder.add_text_field("name", STORED);
    let created_ts = schema_builder.add_u64_field(
        "created_ts",
        tantivy::schema::NumericOptions::default().set_stored(),
    );

    let text_indexing = TextFieldIndexing::default()
        .set_tokenizer("store_text")
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default().set_indexing_options(text_indexing);

    let name_text = schema_builder.add_text_field("name_text", text_options.clone());
    let description_text = schema_builder.add_text_field("description_text", text_options);

    let schema = schema_builder.build();
    let fields = RelevanceFields {
        slug,
        name,
        created_ts,
        name_text,
        description_text,
    };

    (schema, fields)
}
