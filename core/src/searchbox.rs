//! Embedding API for a search input.
//!
//! A host reads a [`SearchBoxConfig`] from its markup, creates a [`SearchBox`],
//! attaches the engine once it has loaded and forwards every input change.
//! The `indexer search` command drives its queries through this type.

use crate::project::ResultRecord;
use crate::{Error, SearchEngine};
use serde::Serialize;
use std::sync::Arc;

pub const ATTR_INDEX_SOURCE: &str = "data-offline-search-index-json-src";
pub const ATTR_MAX_RESULTS: &str = "data-offline-search-max-results";
pub const ATTR_BASE_HREF: &str = "data-offline-search-base-href";

/// Settings a search box reads from its host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchBoxConfig {
    pub index_source_url: String,
    pub max_results: usize,
    pub base_href: String,
}

impl SearchBoxConfig {
    /// Read the configuration from markup attributes. All three are required.
    pub fn from_attributes<'a, I>(attrs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut index_source_url = None;
        let mut max_results = None;
        let mut base_href = None;
        for (name, value) in attrs {
            match name {
                ATTR_INDEX_SOURCE => index_source_url = Some(value.to_string()),
                ATTR_MAX_RESULTS => max_results = Some(parse_max_results(value)?),
                ATTR_BASE_HREF => base_href = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(Self {
            index_source_url: index_source_url.ok_or(Error::MissingAttribute(ATTR_INDEX_SOURCE))?,
            max_results: max_results.ok_or(Error::MissingAttribute(ATTR_MAX_RESULTS))?,
            base_href: base_href.ok_or(Error::MissingAttribute(ATTR_BASE_HREF))?,
        })
    }
}

pub fn parse_max_results(value: &str) -> Result<usize, Error> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidMaxResults(value.to_string())),
    }
}

/// What the results popover should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Popover {
    /// No search was performed: blank input or index not loaded yet.
    Hidden,
    NoResults { query: String, message: String },
    Results { query: String, results: Vec<ResultRecord> },
}

impl Popover {
    pub fn from_results(query: &str, results: Vec<ResultRecord>) -> Self {
        if results.is_empty() {
            Popover::NoResults { query: query.to_string(), message: no_results_message(query) }
        } else {
            Popover::Results { query: query.to_string(), results }
        }
    }

    pub fn is_hidden(&self) -> bool { matches!(self, Popover::Hidden) }
}

pub fn no_results_message(query: &str) -> String {
    format!("No results found for query \"{query}\"")
}

/// Identifies the input value a render was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    generation: u64,
    query: String,
}

impl RenderTicket {
    pub fn query(&self) -> &str { &self.query }
}

/// A finished render, tagged with the ticket it was produced for.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    ticket: RenderTicket,
    pub popover: Popover,
}

/// Input state of one search box.
///
/// Every input change bumps a generation counter. A render started for an
/// older generation is discarded on `accept`, so a slow render can never
/// overwrite the popover of a later input.
#[derive(Debug)]
pub struct SearchBox {
    config: SearchBoxConfig,
    engine: Option<Arc<SearchEngine>>,
    input: String,
    generation: u64,
}

impl SearchBox {
    pub fn new(config: SearchBoxConfig) -> Self {
        Self { config, engine: None, input: String::new(), generation: 0 }
    }

    pub fn config(&self) -> &SearchBoxConfig { &self.config }
    pub fn input(&self) -> &str { &self.input }
    pub fn is_ready(&self) -> bool { self.engine.is_some() }

    /// Install the loaded engine and re-render the current input.
    pub fn attach(&mut self, engine: Arc<SearchEngine>) -> Popover {
        tracing::info!(num_docs = engine.index.num_docs, "search index ready");
        self.engine = Some(engine);
        let value = self.input.clone();
        self.input_changed(&value)
    }

    /// Record a failed index load. The box stays unready and every query is a no-op.
    pub fn load_failed(&self, error: &dyn std::fmt::Display) {
        tracing::error!(source = %self.config.index_source_url, error = %error, "failed to load search index");
    }

    /// Register a new input value and hand out the ticket to render it with.
    pub fn change(&mut self, value: &str) -> RenderTicket {
        self.generation += 1;
        self.input = value.to_string();
        RenderTicket { generation: self.generation, query: self.input.clone() }
    }

    /// Run the pipeline for a ticket. Does not touch the box state.
    pub fn render(&self, ticket: RenderTicket) -> Rendered {
        let popover = match &self.engine {
            Some(engine) => engine.search(&ticket.query, self.config.max_results, &self.config.base_href),
            None => Popover::Hidden,
        };
        Rendered { ticket, popover }
    }

    /// Take a finished render if it still belongs to the current input.
    pub fn accept(&self, rendered: Rendered) -> Option<Popover> {
        if rendered.ticket.generation != self.generation {
            tracing::debug!(query = %rendered.ticket.query, "discarding stale render");
            return None;
        }
        Some(rendered.popover)
    }

    /// Change, render and accept in one step.
    pub fn input_changed(&mut self, value: &str) -> Popover {
        let ticket = self.change(value);
        let rendered = self.render(ticket);
        self.accept(rendered).unwrap_or(Popover::Hidden)
    }

    /// The close button: empty the input, which hides the popover.
    pub fn clear(&mut self) -> Popover {
        self.input_changed("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    fn config() -> SearchBoxConfig {
        SearchBoxConfig { index_source_url: "/index.json".into(), max_results: 10, base_href: "/".into() }
    }

    fn engine() -> Arc<SearchEngine> {
        let docs = vec![Document { reference: "/a".into(), title: "Install Guide".into(), ..Default::default() }];
        Arc::new(SearchEngine::new(&docs).unwrap().0)
    }

    #[test]
    fn config_from_attributes() {
        let attrs = [
            (ATTR_INDEX_SOURCE, "/offline-search-index.json"),
            ("class", "td-search-input"),
            (ATTR_MAX_RESULTS, "10"),
            (ATTR_BASE_HREF, "/docs/"),
        ];
        let cfg = SearchBoxConfig::from_attributes(attrs).unwrap();
        assert_eq!(cfg.max_results, 10);
        assert_eq!(cfg.base_href, "/docs/");
    }

    #[test]
    fn config_requires_every_attribute() {
        let err = SearchBoxConfig::from_attributes([(ATTR_INDEX_SOURCE, "/i.json"), (ATTR_MAX_RESULTS, "5")]).unwrap_err();
        assert!(matches!(err, Error::MissingAttribute(ATTR_BASE_HREF)));
    }

    #[test]
    fn config_rejects_zero_max_results() {
        assert!(matches!(parse_max_results("0"), Err(Error::InvalidMaxResults(_))));
        assert!(matches!(parse_max_results("ten"), Err(Error::InvalidMaxResults(_))));
    }

    #[test]
    fn queries_before_load_are_noops() {
        let mut sb = SearchBox::new(config());
        assert!(!sb.is_ready());
        assert_eq!(sb.input_changed("install"), Popover::Hidden);
    }

    #[test]
    fn failed_load_stays_unready() {
        let mut sb = SearchBox::new(config());
        sb.load_failed(&"connection refused");
        assert!(!sb.is_ready());
        assert!(sb.input_changed("install").is_hidden());
    }

    #[test]
    fn attach_renders_pending_input() {
        let mut sb = SearchBox::new(config());
        sb.input_changed("install");
        match sb.attach(engine()) {
            Popover::Results { query, results } => {
                assert_eq!(query, "install");
                assert_eq!(results[0].reference, "/a");
            }
            other => panic!("unexpected popover {other:?}"),
        }
    }

    #[test]
    fn empty_query_differs_from_no_results() {
        let mut sb = SearchBox::new(config());
        sb.attach(engine());
        assert_eq!(sb.input_changed("  "), Popover::Hidden);
        assert_eq!(
            sb.input_changed("zzzzzzzz"),
            Popover::NoResults { query: "zzzzzzzz".into(), message: "No results found for query \"zzzzzzzz\"".into() }
        );
    }

    #[test]
    fn clear_hides_popover() {
        let mut sb = SearchBox::new(config());
        sb.attach(engine());
        assert!(!sb.input_changed("install").is_hidden());
        assert!(sb.clear().is_hidden());
        assert_eq!(sb.input(), "");
    }

    #[test]
    fn stale_render_is_discarded() {
        let mut sb = SearchBox::new(config());
        sb.attach(engine());
        let slow = sb.change("instal");
        let fast = sb.change("install");
        let late = sb.render(slow);
        let current = sb.render(fast);
        assert!(sb.accept(current).is_some());
        assert!(sb.accept(late).is_none());
    }
}
