use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Text analysis shared by index construction and query compilation.
///
/// The analyzer is stored inside the index, so a query is always analyzed the
/// same way as the documents it runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    /// Reduce tokens to their English stem. Off by default: stemming makes
    /// partial words like "instal" exact matches, which hides typo handling.
    pub stemming: bool,
}

impl Analyzer {
    pub fn stemming() -> Self { Self { stemming: true } }

    /// Tokenize text into (term, position) using NFKC normalization, lowercase and stopword removal.
    pub fn tokenize(&self, text: &str) -> Vec<(String, usize)> {
        self.tokenize_with(text, true)
    }

    /// Terms only, in input order.
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.tokenize(text).into_iter().map(|(term, _)| term).collect()
    }

    /// Query-side terms. Stopwords are kept: a short query like "over" is
    /// usually the prefix of a real word and has to reach the wildcard and
    /// fuzzy clauses.
    pub fn query_terms(&self, text: &str) -> Vec<String> {
        self.tokenize_with(text, false).into_iter().map(|(term, _)| term).collect()
    }

    fn tokenize_with(&self, text: &str, drop_stopwords: bool) -> Vec<(String, usize)> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for (pos, mat) in RE.find_iter(&normalized).enumerate() {
            let token = mat.as_str().trim_end_matches('\'');
            if token.is_empty() || (drop_stopwords && is_stopword(token)) { continue; }
            let term = if self.stemming { STEMMER.stem(token).to_string() } else { token.to_string() };
            tokens.push((term, pos));
        }
        tokens
    }
}

/// Tokenize with the default analyzer.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    Analyzer::default().tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Install, the Guide!");
        let words: Vec<&str> = t.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["install", "guide"]);
        // positions keep counting through removed stopwords
        assert_eq!(t[1].1, 2);
    }

    #[test]
    fn stemming_is_opt_in() {
        assert!(tokenize("running").iter().any(|(w, _)| w == "running"));
        assert!(Analyzer::stemming().tokenize("running").iter().any(|(w, _)| w == "run"));
    }

    #[test]
    fn trailing_apostrophe_is_trimmed() {
        let words = Analyzer::default().terms("the runners' club");
        assert_eq!(words, vec!["runners", "club"]);
    }

    #[test]
    fn query_terms_keep_stopwords() {
        let a = Analyzer::default();
        assert!(a.terms("over").is_empty());
        assert_eq!(a.query_terms("Over, up"), vec!["over", "up"]);
    }
}
