use crate::Analyzer;
use serde::Serialize;

pub const EXACT_BOOST: f64 = 100.0;
pub const WILDCARD_BOOST: f64 = 10.0;
pub const FUZZY_BOOST: f64 = 1.0;
pub const FUZZY_EDIT_DISTANCE: usize = 2;

/// How a clause term is matched against the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Indexed term equals the clause term.
    Exact,
    /// Leading and trailing wildcard: the clause term occurs anywhere inside the indexed term.
    Wildcard,
    /// Indexed term within `edit_distance` edits of the clause term.
    Fuzzy { edit_distance: usize },
}

impl MatchStrategy {
    pub fn matches(&self, clause_term: &str, indexed: &str) -> bool {
        match *self {
            MatchStrategy::Exact => clause_term == indexed,
            MatchStrategy::Wildcard => indexed.contains(clause_term),
            MatchStrategy::Fuzzy { edit_distance } => crate::levenshtein::within(clause_term, indexed, edit_distance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    pub term: String,
    pub strategy: MatchStrategy,
    pub boost: f64,
}

/// A raw query compiled into OR-combined clauses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    raw: String,
    clauses: Vec<Clause>,
}

impl CompiledQuery {
    /// No search performed. Distinct from a search that matches nothing.
    pub fn noop() -> Self {
        Self { raw: String::new(), clauses: Vec::new() }
    }

    pub fn is_noop(&self) -> bool { self.raw.is_empty() }
    pub fn raw(&self) -> &str { &self.raw }
    pub fn clauses(&self) -> &[Clause] { &self.clauses }
}

/// Every token gets an exact, a wildcard and a fuzzy clause, in that order.
pub fn compile(raw_query: &str, analyzer: &Analyzer) -> CompiledQuery {
    if raw_query.trim().is_empty() {
        return CompiledQuery::noop();
    }

    let mut clauses = Vec::new();
    for term in analyzer.query_terms(&raw_query.to_lowercase()) {
        clauses.push(Clause { term: term.clone(), strategy: MatchStrategy::Exact, boost: EXACT_BOOST });
        clauses.push(Clause { term: term.clone(), strategy: MatchStrategy::Wildcard, boost: WILDCARD_BOOST });
        clauses.push(Clause {
            term,
            strategy: MatchStrategy::Fuzzy { edit_distance: FUZZY_EDIT_DISTANCE },
            boost: FUZZY_BOOST,
        });
    }
    tracing::debug!(query = raw_query, clauses = clauses.len(), "compiled query");
    CompiledQuery { raw: raw_query.to_string(), clauses }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_is_noop() {
        assert!(compile("", &Analyzer::default()).is_noop());
        assert!(compile("   \t", &Analyzer::default()).is_noop());
    }

    #[test]
    fn three_clauses_per_token() {
        let q = compile("Install Guide", &Analyzer::default());
        assert!(!q.is_noop());
        let clauses = q.clauses();
        assert_eq!(clauses.len(), 6);
        assert_eq!(clauses[0], Clause { term: "install".into(), strategy: MatchStrategy::Exact, boost: 100.0 });
        assert_eq!(clauses[1].strategy, MatchStrategy::Wildcard);
        assert_eq!(clauses[1].boost, 10.0);
        assert_eq!(clauses[2].strategy, MatchStrategy::Fuzzy { edit_distance: 2 });
        assert_eq!(clauses[2].boost, 1.0);
        assert_eq!(clauses[3].term, "guide");
    }

    #[test]
    fn stopwords_compile_to_clauses() {
        let q = compile("over", &Analyzer::default());
        assert_eq!(q.clauses().len(), 3);
        assert_eq!(q.clauses()[1], Clause { term: "over".into(), strategy: MatchStrategy::Wildcard, boost: 10.0 });
    }

    #[test]
    fn stopword_queries_find_longer_words() {
        let docs = vec![
            crate::Document { reference: "/overview".into(), title: "Overview".into(), ..Default::default() },
            crate::Document { reference: "/home".into(), title: "Docs Home".into(), ..Default::default() },
            crate::Document { reference: "/upgrade".into(), title: "Upgrade".into(), ..Default::default() },
        ];
        let (index, _, _) = crate::build(&docs).unwrap();
        let first = |raw: &str| {
            crate::execute(&index, &compile(raw, &index.analyzer), 10).into_iter().next().map(|m| m.reference)
        };
        assert_eq!(first("over").as_deref(), Some("/overview"));
        assert_eq!(first("do").as_deref(), Some("/home"));
        assert_eq!(first("up").as_deref(), Some("/upgrade"));
    }

    #[test]
    fn punctuation_splits_tokens() {
        let q = compile("config-file,setup", &Analyzer::default());
        let terms: Vec<&str> = q.clauses().iter().step_by(3).map(|c| c.term.as_str()).collect();
        assert_eq!(terms, vec!["config", "file", "setup"]);
    }

    #[test]
    fn wildcard_is_substring() {
        assert!(MatchStrategy::Wildcard.matches("install", "uninstall"));
        assert!(!MatchStrategy::Exact.matches("install", "uninstall"));
    }
}
