//! Full-text fragment search over class names, backed by `tantivy`. No
//! crate in this lineage uses `tantivy` directly, but a sibling example in
//! the same retrieval pack (a code-search engine) reaches for it to answer
//! exactly this kind of "substring-ish" name query, so it is the grounded
//! choice here over hand-rolling a trigram index.

use crate::error::{CoreError, Result};
use jarscope_api::{ArtifactId, ClassEntry};
use std::path::Path;
use std::sync::Mutex;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, INDEXED, STORED};
use tantivy::tokenizer::{LowerCaser, NgramTokenizer, TextAnalyzer};
use tantivy::{doc, Index, IndexReader, IndexWriter, TantivyDocument};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Registered tokenizer name for the trigram analyzer applied to
/// `fq_name`/`simple_name` (base spec §4.2: "Minimum viable tokenizer:
/// trigrams"). Re-registered on every open since tantivy doesn't persist
/// custom tokenizers in `meta.json`.
const NGRAM_TOKENIZER: &str = "jarscope_trigram";

fn ngram_field_options() -> TextOptions {
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(NGRAM_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    TextOptions::default().set_indexing_options(indexing).set_stored()
}

fn register_ngram_tokenizer(index: &Index) {
    let analyzer = TextAnalyzer::builder(
        NgramTokenizer::new(3, 3, false).expect("trigram tokenizer bounds are valid"),
    )
    .filter(LowerCaser)
    .build();
    index.tokenizers().register(NGRAM_TOKENIZER, analyzer);
}

pub struct FtsIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fq_name_field: tantivy::schema::Field,
    simple_name_field: tantivy::schema::Field,
    artifact_id_field: tantivy::schema::Field,
}

impl FtsIndex {
    /// Open the index at `path`, creating it (and the schema) on first use.
    pub fn open_or_create(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut schema_builder = Schema::builder();
        let fq_name_field = schema_builder.add_text_field("fq_name", ngram_field_options());
        let simple_name_field = schema_builder.add_text_field("simple_name", ngram_field_options());
        let artifact_id_field = schema_builder.add_u64_field("artifact_id", STORED | INDEXED);
        let schema = schema_builder.build();

        let index = if path.join("meta.json").is_file() {
            Index::open_in_dir(path).map_err(|e| CoreError::Index(e.to_string()))?
        } else {
            Index::create_in_dir(path, schema).map_err(|e| CoreError::Index(e.to_string()))?
        };
        register_ngram_tokenizer(&index);

        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| CoreError::Index(e.to_string()))?;
        let reader = index
            .reader()
            .map_err(|e| CoreError::Index(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            fq_name_field,
            simple_name_field,
            artifact_id_field,
        })
    }

    /// Queue a class for indexing. Not visible to searches until [`commit`].
    pub fn add_class(&self, entry: &ClassEntry) -> Result<()> {
        let writer = self.writer.lock().expect("fts writer lock poisoned");
        writer.add_document(doc!(
            self.fq_name_field => entry.fq_name.clone(),
            self.simple_name_field => entry.simple_name.clone(),
            self.artifact_id_field => entry.artifact_id.0,
        ))
        .map_err(|e| CoreError::Index(e.to_string()))?;
        Ok(())
    }

    /// Drop every queued-for-indexing document belonging to `artifact_id`
    /// (used before a re-scan replaces an artifact's classes).
    pub fn delete_artifact(&self, artifact_id: ArtifactId) -> Result<()> {
        let writer = self.writer.lock().expect("fts writer lock poisoned");
        let term = tantivy::Term::from_field_u64(self.artifact_id_field, artifact_id.0);
        writer.delete_term(term);
        Ok(())
    }

    /// Drop every document in the index (`refreshAll`'s full reset).
    pub fn clear_all(&self) -> Result<()> {
        let writer = self.writer.lock().expect("fts writer lock poisoned");
        writer
            .delete_all_documents()
            .map_err(|e| CoreError::Index(e.to_string()))?;
        Ok(())
    }

    /// Make prior `add_class`/`delete_artifact` calls visible to searches.
    pub fn commit(&self) -> Result<()> {
        {
            let mut writer = self.writer.lock().expect("fts writer lock poisoned");
            writer
                .commit()
                .map_err(|e| CoreError::Index(e.to_string()))?;
        }
        self.reader
            .reload()
            .map_err(|e| CoreError::Index(e.to_string()))?;
        Ok(())
    }

    /// Fragment search across `fq_name` and `simple_name`, ranked by
    /// `tantivy`'s default BM25 scoring. Both fields are trigram-tokenized,
    /// and matching requires every trigram of `text` to be present, so a
    /// mid-token fragment like `"Service"` finds `UserService` the same way
    /// a substring search would.
    pub fn search_fragment(&self, text: &str, limit: usize) -> Result<Vec<String>> {
        let mut query_parser =
            QueryParser::for_index(&self.index, vec![self.fq_name_field, self.simple_name_field]);
        query_parser.set_conjunction_by_default();
        let query = query_parser
            .parse_query(text)
            .map_err(|e| CoreError::InvalidQuery(e.to_string()))?;

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| CoreError::Index(e.to_string()))?;

        let mut names = Vec::with_capacity(top_docs.len());
        for (_score, doc_address) in top_docs {
            let retrieved: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| CoreError::Index(e.to_string()))?;
            if let Some(value) = retrieved.get_first(self.fq_name_field) {
                if let Some(name) = value.as_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }
}
