pub mod error;
pub mod index;
pub mod levenshtein;
pub mod persist;
pub mod project;
pub mod query;
pub mod ranker;
pub mod searchbox;
pub mod tokenizer;

pub use error::Error;
pub use index::{build, parse_documents, BuildReport, InvertedIndex, MetadataTable, ParsedDocuments, SkipReason, SkippedDocument};
pub use project::{project, Breadcrumb, ResultRecord};
pub use query::{compile, Clause, CompiledQuery, MatchStrategy};
pub use ranker::{execute, MatchResult, SCORE_THRESHOLD};
pub use searchbox::{Popover, SearchBox, SearchBoxConfig};
pub use tokenizer::Analyzer;

use serde::{Deserialize, Serialize};

pub type TermId = u32;
pub type DocId = u32;

/// A searchable field of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Categories,
    Tags,
    Description,
    Body,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Title, Field::Categories, Field::Tags, Field::Description, Field::Body];

    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Categories => "categories",
            Field::Tags => "tags",
            Field::Description => "description",
            Field::Body => "body",
        }
    }
}

/// Boost multiplier per indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldWeights {
    pub title: f64,
    pub categories: f64,
    pub tags: f64,
    pub description: f64,
    pub body: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { title: 15.0, categories: 3.0, tags: 10.0, description: 10.0, body: 5.0 }
    }
}

impl FieldWeights {
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.title,
            Field::Categories => self.categories,
            Field::Tags => self.tags,
            Field::Description => self.description,
            Field::Body => self.body,
        }
    }

    /// Every weight must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), Error> {
        for field in Field::ALL {
            let weight = self.get(field);
            if !weight.is_finite() || weight <= 0.0 {
                return Err(Error::InvalidFieldWeight { field: field.name(), weight });
            }
        }
        Ok(())
    }
}

/// One entry of the index data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "ref")]
    pub reference: String,
    pub title: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub description: String,
    pub body: String,
    /// Display only, never indexed.
    pub excerpt: String,
    /// Display only, never indexed.
    pub last_mod: String,
}

impl Document {
    /// Text of a searchable field; list fields are joined with spaces.
    pub fn field_text(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::Categories => self.categories.join(" "),
            Field::Tags => self.tags.join(" "),
            Field::Description => self.description.clone(),
            Field::Body => self.body.clone(),
        }
    }
}

/// Display projection of a document, keyed by its ref.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub title: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub last_mod: String,
    pub description: String,
}

impl From<&Document> for DocMeta {
    fn from(doc: &Document) -> Self {
        Self {
            title: doc.title.clone(),
            excerpt: doc.excerpt.clone(),
            tags: doc.tags.clone(),
            last_mod: doc.last_mod.clone(),
            description: doc.description.clone(),
        }
    }
}

/// A loaded, immutable index together with its metadata side table.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchEngine {
    pub index: InvertedIndex,
    pub metadata: MetadataTable,
}

impl SearchEngine {
    pub fn new(documents: &[Document]) -> Result<(Self, BuildReport), Error> {
        Self::with_options(documents, FieldWeights::default(), Analyzer::default())
    }

    pub fn with_options(documents: &[Document], weights: FieldWeights, analyzer: Analyzer) -> Result<(Self, BuildReport), Error> {
        let (index, metadata, report) = index::build_with(documents, weights, analyzer)?;
        Ok((Self { index, metadata }, report))
    }

    /// Parse an index data file (JSON array of documents) and build the engine.
    pub fn from_json(bytes: &[u8]) -> Result<(Self, BuildReport), Error> {
        let parsed = index::parse_documents(bytes)?;
        let (engine, mut report) = Self::new(&parsed.documents)?;
        // build positions refer to the parsed subset, map them back to the file
        for skipped in report.skipped.iter_mut() {
            skipped.position = parsed.positions[skipped.position];
        }
        report.skipped.extend(parsed.skipped);
        report.skipped.sort_by_key(|s| s.position);
        Ok((engine, report))
    }

    /// Run the whole pipeline for one raw query.
    pub fn search(&self, raw_query: &str, max_results: usize, base_href: &str) -> Popover {
        let compiled = compile(raw_query, &self.index.analyzer);
        if compiled.is_noop() {
            return Popover::Hidden;
        }
        let matches = execute(&self.index, &compiled, max_results);
        let results = project(&matches, &self.metadata, base_href);
        Popover::from_results(compiled.raw(), results)
    }
}
