use crate::{Analyzer, DocId, DocMeta, Document, Error, Field, FieldWeights, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Postings and length statistics of one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldIndex {
    pub field: Field,
    pub boost: f64,
    pub postings: HashMap<TermId, Vec<Posting>>, // postings sorted by doc_id
    /// Token count of this field, per document.
    pub lengths: Vec<u32>,
    pub avg_length: f64,
}

impl FieldIndex {
    fn new(field: Field, boost: f64) -> Self {
        Self { field, boost, postings: HashMap::new(), lengths: Vec::new(), avg_length: 0.0 }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub analyzer: Analyzer,
    /// Sorted so that vocabulary scans are deterministic.
    pub dictionary: BTreeMap<String, TermId>,
    /// Documents containing the term in any field, by term id.
    pub df: Vec<u32>,
    pub fields: Vec<FieldIndex>,
    /// DocId -> ref
    pub refs: Vec<String>,
    pub num_docs: u32,
}

impl InvertedIndex {
    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, TermId)> {
        self.dictionary.iter().map(|(term, &id)| (term.as_str(), id))
    }

    pub fn reference(&self, doc_id: DocId) -> Option<&str> {
        self.refs.get(doc_id as usize).map(String::as_str)
    }

    pub fn field(&self, field: Field) -> Option<&FieldIndex> {
        self.fields.iter().find(|f| f.field == field)
    }

    /// BM25 inverse document frequency of a term.
    pub fn idf(&self, term_id: TermId) -> f64 {
        let n = self.num_docs as f64;
        let df = *self.df.get(term_id as usize).unwrap_or(&0) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Idf of a query term; a term missing from the vocabulary has df 0.
    pub fn idf_of(&self, term: &str) -> f64 {
        let n = self.num_docs as f64;
        let df = self.term_id(term).map_or(0, |tid| self.df[tid as usize]) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }
}

/// ref -> display metadata.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MetadataTable {
    entries: HashMap<String, DocMeta>,
}

impl MetadataTable {
    pub fn get(&self, reference: &str) -> Option<&DocMeta> { self.entries.get(reference) }
    pub fn contains(&self, reference: &str) -> bool { self.entries.contains_key(reference) }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn insert(&mut self, reference: String, meta: DocMeta) { self.entries.insert(reference, meta); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingRef,
    DuplicateRef(String),
    Malformed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingRef => write!(f, "missing ref"),
            SkipReason::DuplicateRef(r) => write!(f, "duplicate ref {r:?}"),
            SkipReason::Malformed(msg) => write!(f, "malformed document: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    /// Position in the input collection.
    pub position: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub indexed: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// Wire shape of an index data file entry; every attribute may be absent or null.
#[derive(Debug, Deserialize)]
struct InputDoc {
    #[serde(rename = "ref")]
    reference: Option<String>,
    title: Option<String>,
    categories: Option<Vec<String>>,
    tags: Option<Vec<String>>,
    description: Option<String>,
    body: Option<String>,
    excerpt: Option<String>,
    last_mod: Option<String>,
}

/// Documents read from an index data file.
#[derive(Debug, Default)]
pub struct ParsedDocuments {
    pub documents: Vec<Document>,
    /// Position in the file of each entry of `documents`.
    pub positions: Vec<usize>,
    pub skipped: Vec<SkippedDocument>,
}

/// Parse an index data file. Entries that are not document objects are
/// skipped and reported; a missing ref is left empty for `build` to reject.
pub fn parse_documents(bytes: &[u8]) -> Result<ParsedDocuments, Error> {
    let json: serde_json::Value = serde_json::from_slice(bytes)?;
    let arr = match json {
        serde_json::Value::Array(arr) => arr,
        _ => return Err(Error::NotAnArray),
    };
    let mut parsed = ParsedDocuments::default();
    for (position, v) in arr.into_iter().enumerate() {
        match serde_json::from_value::<InputDoc>(v) {
            Ok(doc) => {
                parsed.positions.push(position);
                parsed.documents.push(Document {
                    reference: doc.reference.unwrap_or_default(),
                    title: doc.title.unwrap_or_default(),
                    categories: doc.categories.unwrap_or_default(),
                    tags: doc.tags.unwrap_or_default(),
                    description: doc.description.unwrap_or_default(),
                    body: doc.body.unwrap_or_default(),
                    excerpt: doc.excerpt.unwrap_or_default(),
                    last_mod: doc.last_mod.unwrap_or_default(),
                });
            }
            Err(e) => {
                tracing::warn!(position, error = %e, "skipping malformed document");
                parsed.skipped.push(SkippedDocument { position, reason: SkipReason::Malformed(e.to_string()) });
            }
        }
    }
    Ok(parsed)
}

/// Build the index and metadata table with the default weights and analyzer.
pub fn build(documents: &[Document]) -> Result<(InvertedIndex, MetadataTable, BuildReport), Error> {
    build_with(documents, FieldWeights::default(), Analyzer::default())
}

/// Documents without a ref, and any document repeating an earlier ref, are
/// skipped with a warning; the first document for a ref wins.
pub fn build_with(documents: &[Document], weights: FieldWeights, analyzer: Analyzer) -> Result<(InvertedIndex, MetadataTable, BuildReport), Error> {
    weights.validate()?;

    let mut index = InvertedIndex { analyzer, ..Default::default() };
    index.fields = Field::ALL.iter().map(|&f| FieldIndex::new(f, weights.get(f))).collect();
    let mut metadata = MetadataTable::default();
    let mut report = BuildReport::default();
    let mut next_term_id: TermId = 0;

    for (position, doc) in documents.iter().enumerate() {
        if doc.reference.is_empty() {
            tracing::warn!(position, "skipping document without ref");
            report.skipped.push(SkippedDocument { position, reason: SkipReason::MissingRef });
            continue;
        }
        if metadata.contains(&doc.reference) {
            tracing::warn!(position, reference = %doc.reference, "skipping document with duplicate ref");
            report.skipped.push(SkippedDocument { position, reason: SkipReason::DuplicateRef(doc.reference.clone()) });
            continue;
        }

        let doc_id = index.refs.len() as DocId;
        index.refs.push(doc.reference.clone());
        let mut seen_in_doc: HashSet<TermId> = HashSet::new();

        for field_index in index.fields.iter_mut() {
            let tokens = analyzer.tokenize(&doc.field_text(field_index.field));
            field_index.lengths.push(tokens.len() as u32);
            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for (term, _pos) in tokens {
                let tid = *index.dictionary.entry(term).or_insert_with(|| {
                    let id = next_term_id;
                    next_term_id += 1;
                    id
                });
                *tf_counts.entry(tid).or_insert(0) += 1;
                if seen_in_doc.insert(tid) {
                    if index.df.len() <= tid as usize { index.df.resize(tid as usize + 1, 0); }
                    index.df[tid as usize] += 1;
                }
            }
            for (tid, tf) in tf_counts {
                field_index.postings.entry(tid).or_default().push(Posting { doc_id, tf });
            }
        }

        metadata.insert(doc.reference.clone(), DocMeta::from(doc));
        report.indexed += 1;
    }

    index.num_docs = index.refs.len() as u32;
    index.df.resize(next_term_id as usize, 0);
    for field_index in index.fields.iter_mut() {
        let total: u64 = field_index.lengths.iter().map(|&l| l as u64).sum();
        field_index.avg_length = if index.num_docs == 0 { 0.0 } else { total as f64 / index.num_docs as f64 };
    }

    tracing::info!(
        num_docs = index.num_docs,
        num_terms = index.dictionary.len(),
        skipped = report.skipped.len(),
        "built search index"
    );
    Ok((index, metadata, report))
}
