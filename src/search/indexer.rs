use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tantivy::{
    Index, IndexWriter, doc,
    schema::{
        FAST, Field, IndexRecordOption, STORED, STRING, Schema, TEXT, TextFieldIndexing,
        TextOptions,
    },
    tokenizer::{RegexTokenizer, TextAnalyzer},
};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::search::config::DEFAULT_BUFFER_SIZE;

pub const ID_FIELD: &str = "id";
pub const DATE_FIELD: &str = "date";
pub const CHANNEL_FIELD: &str = "channel";
pub const USER_FIELD: &str = "user";
pub const TEXT_FIELD: &str = "text";
pub const ORDINAL_FIELD: &str = "ordinal";

/// Splits `2015-01-30T15:00:00` into its digit groups so partial dates match
const DATE_TOKENIZER: &str = "date_digits";

/// Handles to the fields of the message index
#[derive(Debug, Clone, Copy)]
pub struct IndexFields {
    pub id: Field,
    pub date: Field,
    pub channel: Field,
    pub user: Field,
    pub text: Field,
    pub ordinal: Field,
}

impl IndexFields {
    /// Look up the fields in the schema of an existing index
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        Ok(Self {
            id: schema.get_field(ID_FIELD)?,
            date: schema.get_field(DATE_FIELD)?,
            channel: schema.get_field(CHANNEL_FIELD)?,
            user: schema.get_field(USER_FIELD)?,
            text: schema.get_field(TEXT_FIELD)?,
            ordinal: schema.get_field(ORDINAL_FIELD)?,
        })
    }
}

/// Build the schema for message documents
///
/// - `id`: STRING | STORED, the message id, matched exactly
/// - `date`: digit-group tokenized | STORED, `YYYY-MM-DDTHH:MM:SS` in UTC
/// - `channel`, `user`, `text`: TEXT | STORED
/// - `ordinal`: u64 FAST | STORED, position in the dataset, used to return hits in insertion order
pub fn build_schema() -> (Schema, IndexFields) {
    let mut schema_builder = Schema::builder();

    let date_options = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(DATE_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored();

    let fields = IndexFields {
        id: schema_builder.add_text_field(ID_FIELD, STRING | STORED),
        date: schema_builder.add_text_field(DATE_FIELD, date_options),
        channel: schema_builder.add_text_field(CHANNEL_FIELD, TEXT | STORED),
        user: schema_builder.add_text_field(USER_FIELD, TEXT | STORED),
        text: schema_builder.add_text_field(TEXT_FIELD, TEXT | STORED),
        ordinal: schema_builder.add_u64_field(ORDINAL_FIELD, FAST | STORED),
    };

    (schema_builder.build(), fields)
}

/// Register the tokenizers the schema refers to
///
/// Tokenizers are not persisted with the index, so this runs for every opened index.
pub fn register_tokenizers(index: &Index) -> Result<()> {
    let date_analyzer = TextAnalyzer::from(RegexTokenizer::new(r"\d+")?);
    index.tokenizers().register(DATE_TOKENIZER, date_analyzer);
    Ok(())
}

/// Render a timestamp the way the `date` field indexes it
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Writes a fresh message index
pub struct SearchIndexer {
    index: Index,
    fields: IndexFields,
}

impl SearchIndexer {
    /// Create an empty index at `index_path`, deleting whatever was there
    pub fn create(index_path: &Path) -> Result<Self> {
        if index_path.exists() {
            tracing::debug!("Removing previous search index at {}", index_path.display());
            fs::remove_dir_all(index_path)?;
        }
        fs::create_dir_all(index_path)?;

        let (schema, fields) = build_schema();
        let index = Index::create_in_dir(index_path, schema)?;
        register_tokenizers(&index)?;

        Ok(Self { index, fields })
    }

    /// Add one document per message and commit them together
    ///
    /// Returns the number of documents written.
    pub fn index_dataset(&self, dataset: &Dataset) -> Result<u64> {
        let mut writer: IndexWriter = self.index.writer_with_num_threads(1, DEFAULT_BUFFER_SIZE)?;

        let mut count = 0u64;
        for message in dataset.messages() {
            writer.add_document(doc!(
                self.fields.id => message.message_id.clone(),
                self.fields.date => format_date(&message.timestamp()),
                self.fields.channel => message.channel_name.clone(),
                self.fields.user => message.resolved_author_handle.clone(),
                self.fields.text => message.text().to_string(),
                self.fields.ordinal => count,
            ))?;
            count += 1;
        }

        writer.commit()?;
        writer.wait_merging_threads()?;
        Ok(count)
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}

/// Replace the index at `index_path` with one built from `dataset`
///
/// A rebuild that is interrupted leaves the index unusable; run it again from scratch.
pub fn rebuild(dataset: &Dataset, index_path: &Path) -> Result<()> {
    tracing::info!("Building search index at {}", index_path.display());
    let indexer = SearchIndexer::create(index_path)?;
    let count = indexer.index_dataset(dataset)?;
    tracing::info!("Indexed {} messages", count);
    Ok(())
}
