//! Task complexity heuristic
//!
//! Deterministic and explainable: every point of the score can be traced
//! back to a word count, a matched keyword or a matched capability domain.

use serde::{Deserialize, Serialize};

/// Default threshold at or above which a task is considered complex
pub const DEFAULT_COMPLEXITY_THRESHOLD: f64 = 7.0;

/// Maximum points contributed by task length
const LENGTH_CAP: f64 = 5.0;
const WORDS_PER_POINT: f64 = 10.0;
const KEYWORD_WEIGHT: f64 = 0.5;
const DOMAIN_WEIGHT: f64 = 1.0;

const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    (
        "comparison",
        &["compare", "comparison", "versus", "vs", "contrast", "difference", "better", "worse"],
    ),
    (
        "optimization",
        &["optimize", "optimise", "optimal", "efficient", "minimize", "maximize", "improve", "fastest"],
    ),
    (
        "conditional",
        &["if", "unless", "otherwise", "whether", "depending", "when"],
    ),
    ("chaining", &["then", "after", "afterwards", "before", "next", "finally"]),
    (
        "enumeration",
        &["each", "every", "all", "list", "multiple", "several", "various", "both"],
    ),
    (
        "general",
        &["complex", "difficult", "challenging", "analyze", "analyse", "design", "create", "solve"],
    ),
];

const DOMAINS: &[(&str, &[&str])] = &[
    (
        "math",
        &["calculate", "compute", "sum", "add", "subtract", "multiply", "divide", "equation", "math"],
    ),
    (
        "text",
        &["reverse", "uppercase", "lowercase", "capitalize", "words", "characters", "text", "string"],
    ),
    ("search", &["search", "find", "lookup", "research", "investigate", "browse"]),
    (
        "code",
        &["code", "implement", "program", "function", "debug", "refactor", "script", "compile"],
    ),
];

/// Breakdown of a complexity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityScore {
    pub words: usize,
    pub length_points: f64,
    pub keyword_points: f64,
    pub domain_points: f64,

    /// Matched keywords, one entry per occurrence, as `group:keyword`
    pub keywords: Vec<String>,

    /// Distinct capability domains implied by the task
    pub domains: Vec<String>,
}

impl ComplexityScore {
    pub fn total(&self) -> f64 {
        self.length_points + self.keyword_points + self.domain_points
    }
}

fn tokens(task: &str) -> Vec<String> {
    task.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn has_arithmetic(task: &str) -> bool {
    let mut prev_digit = false;
    let mut seen_operator = false;
    for c in task.chars() {
        if c.is_ascii_digit() {
            if seen_operator {
                return true;
            }
            prev_digit = true;
        } else if prev_digit && "+-*/^".contains(c) {
            seen_operator = true;
        } else if !c.is_whitespace() {
            prev_digit = false;
            seen_operator = false;
        }
    }
    false
}

/// Score a task; higher values mean a more complex task
pub fn score_task(task: &str) -> ComplexityScore {
    let words = task.split_whitespace().count();
    let length_points = (words as f64 / WORDS_PER_POINT).min(LENGTH_CAP);

    let tokens = tokens(task);

    let mut keywords = Vec::new();
    for (group, group_words) in KEYWORD_GROUPS {
        for token in &tokens {
            if group_words.contains(&token.as_str()) {
                keywords.push(format!("{}:{}", group, token));
            }
        }
    }

    let mut domains: Vec<String> = DOMAINS
        .iter()
        .filter(|(_, domain_words)| tokens.iter().any(|t| domain_words.contains(&t.as_str())))
        .map(|(domain, _)| domain.to_string())
        .collect();
    if !domains.iter().any(|d| d == "math") && has_arithmetic(task) {
        domains.insert(0, "math".to_string());
    }

    ComplexityScore {
        words,
        length_points,
        keyword_points: keywords.len() as f64 * KEYWORD_WEIGHT,
        domain_points: domains.len() as f64 * DOMAIN_WEIGHT,
        keywords,
        domains,
    }
}
