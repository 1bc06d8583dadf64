//! Query routing and the document question-answering seam
//!
//! Answers about trade policy come from an external document QA service;
//! this module only defines the interface and how its answers are rendered.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\.\d{2}\.\d{2}\b").expect("code pattern"));

const CALCULATION_KEYWORDS: [&str; 6] = [
    "calculate",
    "duty",
    "cost",
    "freight",
    "insurance",
    "landed cost",
];

const COUNTRY_NAMES: [(&str, &str); 12] = [
    ("AU", "Australia"),
    ("CA", "Canada"),
    ("CN", "China"),
    ("DE", "Germany"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("IN", "India"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("MX", "Mexico"),
    ("RU", "Russia"),
    ("US", "United States"),
];

/// What a free-text query is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Mentions a classification code and a cost/duty keyword
    Calculation,
    /// Mentions a classification code only
    HtsLookup,
    General,
}

impl QueryKind {
    pub fn detect(query: &str) -> Self {
        let has_code = CODE_PATTERN.is_match(query);
        let lowered = query.to_lowercase();
        let has_keyword = CALCULATION_KEYWORDS.iter().any(|k| lowered.contains(k));

        match (has_code, has_keyword) {
            (true, true) => QueryKind::Calculation,
            (true, false) => QueryKind::HtsLookup,
            _ => QueryKind::General,
        }
    }
}

/// First classification code mentioned in a query
pub fn extract_code(query: &str) -> Option<&str> {
    CODE_PATTERN.find(query).map(|m| m.as_str())
}

/// Answer returned by the document QA service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Number of source documents cited
    pub citation_count: usize,
}

/// External document question-answering service
pub trait DocumentAnswerer: Send + Sync {
    fn answer(&self, question: &str) -> Answer;
}

/// Render an answer with its citation count
pub fn format_answer(answer: &Answer) -> String {
    let mut out = format!("Answer: {}\n", answer.text);
    if answer.citation_count > 0 {
        out.push_str(&format!(
            "\nSources: {} documents found",
            answer.citation_count
        ));
    }
    out
}

/// Full name for a known origin country code
pub fn country_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    COUNTRY_NAMES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}
