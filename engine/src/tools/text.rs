//! Text capability
//!
//! Simple text manipulation: character and word counts, reversal and case
//! changes.

use async_trait::async_trait;
use sdk::{Capability, ToolError, ToolInput};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::info;

pub const NAME: &str = "text";

/// Inputs longer than this are truncated when echoed back in the result
const ECHO_LIMIT: usize = 50;

/// Supported text operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOperation {
    Count,
    Reverse,
    Uppercase,
    Lowercase,
    Capitalize,
    WordCount,
}

impl TextOperation {
    pub const ALL: [TextOperation; 6] = [
        Self::Count,
        Self::Reverse,
        Self::Uppercase,
        Self::Lowercase,
        Self::Capitalize,
        Self::WordCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Reverse => "reverse",
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Capitalize => "capitalize",
            Self::WordCount => "wordcount",
        }
    }

    pub fn apply(&self, text: &str) -> Value {
        match self {
            Self::Count => json!(text.chars().count()),
            Self::Reverse => json!(text.chars().rev().collect::<String>()),
            Self::Uppercase => json!(text.to_uppercase()),
            Self::Lowercase => json!(text.to_lowercase()),
            Self::Capitalize => json!(title_case(text)),
            Self::WordCount => json!(text.split_whitespace().count()),
        }
    }
}

impl FromStr for TextOperation {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ToolError::InvalidParameter(format!("Unknown operation: {}", s)))
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn echo(text: &str) -> String {
    if text.chars().count() > ECHO_LIMIT {
        let head: String = text.chars().take(ECHO_LIMIT).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextTool;

#[async_trait]
impl Capability for TextTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Process and manipulate text"
    }

    fn parameters_schema(&self) -> Value {
        let operations: Vec<&str> = TextOperation::ALL.iter().map(|op| op.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to process"
                },
                "operation": {
                    "type": "string",
                    "description": "The operation to perform",
                    "enum": operations
                }
            },
            "required": ["text", "operation"]
        })
    }

    async fn execute(&self, input: ToolInput) -> Result<Value, ToolError> {
        let text = input.param_str("text")?;
        let operation: TextOperation = input.param_str("operation")?.parse()?;
        info!("Text tool applying {}", operation.as_str());

        Ok(json!({
            "text": echo(&text),
            "operation": operation.as_str(),
            "result": operation.apply(&text),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(text: &str, operation: &str) -> Result<Value, ToolError> {
        TextTool
            .execute(
                ToolInput::new()
                    .with_param("text", json!(text))
                    .with_param("operation", json!(operation)),
            )
            .await
    }

    #[tokio::test]
    async fn test_operations() {
        assert_eq!(run("hello", "count").await.unwrap()["result"], 5);
        assert_eq!(run("hello", "reverse").await.unwrap()["result"], "olleh");
        assert_eq!(run("hello", "uppercase").await.unwrap()["result"], "HELLO");
        assert_eq!(run("HeLLo", "lowercase").await.unwrap()["result"], "hello");
        assert_eq!(
            run("hello wORLD", "capitalize").await.unwrap()["result"],
            "Hello World"
        );
        assert_eq!(run("one two  three", "wordcount").await.unwrap()["result"], 3);
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let err = run("hello", "shout").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_long_text_is_truncated_in_echo() {
        let long = "a".repeat(80);
        let out = run(&long, "count").await.unwrap();
        assert_eq!(out["result"], 80);
        assert_eq!(out["text"].as_str().unwrap().len(), ECHO_LIMIT + 3);
    }

    #[test]
    fn test_operation_parse_is_case_insensitive() {
        assert_eq!(
            "WordCount".parse::<TextOperation>().unwrap(),
            TextOperation::WordCount
        );
    }

    #[test]
    fn test_title_case_handles_punctuation() {
        assert_eq!(title_case("it's a-test"), "It'S A-Test");
    }
}
