//! Reasoning collaborator
//!
//! The execution loop asks a [`Reasoner`] for a thought, an action and, when
//! no tool produced a usable answer, a summary. A reasoner may be backed by a
//! model or by any deterministic function. [`RuleBasedReasoner`] is the
//! built-in deterministic one.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;

use super::context::{Action, TaskContext};
use crate::tools::{calculator, noop, text};

/// Failure reported by a reasoning collaborator
#[derive(Debug, thiserror::Error)]
pub enum ReasonerError {
    #[error("Reasoner failed: {0}")]
    Failed(String),
}

/// Source of thoughts, actions and summaries for an execution loop
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn think(&self, context: &TaskContext) -> Result<String, ReasonerError>;

    /// Choose the next action. Must always produce an action for any task.
    async fn decide(&self, context: &TaskContext) -> Result<Action, ReasonerError>;

    async fn summarize(&self, context: &TaskContext) -> Result<String, ReasonerError>;

    /// Termination predicate evaluated after every iteration
    ///
    /// Satisfied when the latest observation is a successful result from a
    /// real capability, or when the loop has stopped making progress.
    fn is_satisfied(&self, context: &TaskContext) -> bool {
        match context.last_observation() {
            Some(obs) if obs.is_success() && obs.tool() != noop::NAME => true,
            _ => context.is_stalled(),
        }
    }
}

static ARITHMETIC_RUN: OnceLock<Regex> = OnceLock::new();
static BINARY_OPERATION: OnceLock<Regex> = OnceLock::new();
static QUOTED_TEXT: OnceLock<Regex> = OnceLock::new();
static TEXT_OPERATIONS: OnceLock<Vec<(Regex, text::TextOperation)>> = OnceLock::new();

fn arithmetic_run() -> &'static Regex {
    ARITHMETIC_RUN.get_or_init(|| Regex::new(r"[0-9.+\-*/^()\s]+").expect("Invalid arithmetic pattern"))
}

fn binary_operation() -> &'static Regex {
    BINARY_OPERATION.get_or_init(|| {
        Regex::new(r"\d\s*\)*\s*(\*\*|[-+*/^])\s*\(*\s*-?\s*\d").expect("Invalid operator pattern")
    })
}

fn quoted_text() -> &'static Regex {
    QUOTED_TEXT.get_or_init(|| {
        Regex::new(r#""([^"]*)"|'([^']*)'"#).expect("Invalid quoted text pattern")
    })
}

fn text_operations() -> &'static Vec<(Regex, text::TextOperation)> {
    use text::TextOperation::*;

    TEXT_OPERATIONS.get_or_init(|| {
        // Order matters: word counts must be tried before character counts
        vec![
            (
                Regex::new(r"(?i)\b(word\s*count|count\s+(the\s+)?words|how\s+many\s+words)\b")
                    .expect("Invalid wordcount pattern"),
                WordCount,
            ),
            (
                Regex::new(r"(?i)\b(character\s+count|count\s+(the\s+)?(characters|chars|letters)|how\s+many\s+(characters|letters)|length\s+of)\b")
                    .expect("Invalid count pattern"),
                Count,
            ),
            (
                Regex::new(r"(?i)\breverse\b").expect("Invalid reverse pattern"),
                Reverse,
            ),
            (
                Regex::new(r"(?i)\b(upper\s*case|uppercase|to\s+upper)\b")
                    .expect("Invalid uppercase pattern"),
                Uppercase,
            ),
            (
                Regex::new(r"(?i)\b(lower\s*case|lowercase|to\s+lower)\b")
                    .expect("Invalid lowercase pattern"),
                Lowercase,
            ),
            (
                Regex::new(r"(?i)\b(capitalize|title\s*case)\b")
                    .expect("Invalid capitalize pattern"),
                Capitalize,
            ),
        ]
    })
}

/// Extract an arithmetic expression from free text, if one is present.
///
/// Only runs containing a binary operation between two numbers qualify, so
/// stray numbers or hyphens in prose are ignored.
pub fn extract_expression(task: &str) -> Option<String> {
    arithmetic_run()
        .find_iter(task)
        .map(|m| balance_parens(m.as_str().trim().trim_end_matches('.').trim()))
        .find(|candidate| binary_operation().is_match(candidate))
}

fn balance_parens(candidate: &str) -> String {
    let mut expr = candidate.to_string();
    let count = |s: &str, c: char| s.chars().filter(|&x| x == c).count();

    while expr.ends_with(')') && count(expr.as_str(), ')') > count(expr.as_str(), '(') {
        expr.pop();
        expr = expr.trim_end().to_string();
    }
    while expr.starts_with('(') && count(expr.as_str(), '(') > count(expr.as_str(), ')') {
        expr.remove(0);
        expr = expr.trim_start().to_string();
    }
    expr
}

/// Pick the text a text operation applies to: quoted text first, then
/// whatever follows a colon, then whatever follows the operation keyword.
fn extract_text_operand(task: &str, keyword_end: usize) -> String {
    if let Some(caps) = quoted_text().captures(task) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            return m.as_str().to_string();
        }
    }

    if let Some((_, after)) = task.split_once(':') {
        let after = after.trim();
        if !after.is_empty() {
            return after.to_string();
        }
    }

    let mut rest = task[keyword_end..].trim();
    loop {
        let lowered = rest.to_lowercase();
        let stripped = ["of ", "in ", "the ", "text ", "string ", "to "]
            .iter()
            .find(|prefix| lowered.starts_with(*prefix))
            .and_then(|prefix| rest.get(prefix.len()..))
            .map(str::trim_start);
        match stripped {
            Some(next) => rest = next,
            None => break,
        }
    }

    if rest.is_empty() {
        task.trim().to_string()
    } else {
        rest.to_string()
    }
}

/// Deterministic, total mapping from task text to an action.
///
/// Text manipulation requests go to `text`, arithmetic to `calculator`,
/// and everything else to `noop`.
pub fn classify(task: &str) -> Action {
    for (pattern, operation) in text_operations() {
        if let Some(m) = pattern.find(task) {
            let operand = extract_text_operand(task, m.end());
            return Action::new(
                text::NAME,
                json!({ "text": operand, "operation": operation.as_str() }),
            );
        }
    }

    if let Some(expression) = extract_expression(task) {
        return Action::new(calculator::NAME, json!({ "expression": expression }));
    }

    Action::new(noop::NAME, json!({ "task": task }))
}

/// Reasoner that decides with [`classify`] and never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedReasoner;

#[async_trait]
impl Reasoner for RuleBasedReasoner {
    async fn think(&self, context: &TaskContext) -> Result<String, ReasonerError> {
        Ok(format!(
            "Thinking about how to {} (iteration {})",
            context.task,
            context.iteration()
        ))
    }

    async fn decide(&self, context: &TaskContext) -> Result<Action, ReasonerError> {
        Ok(classify(&context.task))
    }

    async fn summarize(&self, context: &TaskContext) -> Result<String, ReasonerError> {
        if let Some(error) = context
            .last_observation()
            .and_then(|obs| obs.error_message())
        {
            return Ok(format!(
                "Unable to process task: {} ({})",
                context.task, error
            ));
        }

        Ok(format!(
            "No tool could act on the task: {} (after {} iterations)",
            context.task,
            context.observations.len()
        ))
    }
}
