/*!
 * Line encodings for batch prompts.
 *
 * A batch of subtitle texts travels to the model inside one prompt and comes
 * back as one blob of text. An encoding decides how the units are framed on the
 * way out and how they are recovered on the way back:
 *
 * - `Numbered`: one unit per line, prefixed with `"{n}. "`
 * - `Separator`: all units on one line, joined with a sentinel token
 *
 * Decoding never fails. A response with the wrong number of units decodes to a
 * sequence of the wrong length, which the batch translator reports.
 */

use std::fmt::Debug;
use serde::{Deserialize, Serialize};

/// Encoding selected for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptEncoding {
    /// `"1. text"` per line
    #[default]
    Numbered,
    /// Texts joined with a sentinel token
    Separator,
}

impl PromptEncoding {
    /// Build the codec for this encoding
    ///
    /// `separator` is only used by [`PromptEncoding::Separator`].
    pub fn codec(&self, separator: &str) -> Box<dyn LineEncoding> {
        match self {
            Self::Numbered => Box::new(NumberedLines),
            Self::Separator => Box::new(SeparatorJoined::new(separator)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numbered => "numbered",
            Self::Separator => "separator",
        }
    }
}

/// Prompt framing and response parsing for one encoding
pub trait LineEncoding: Send + Sync + Debug {
    /// The encoding this codec implements
    fn kind(&self) -> PromptEncoding;

    /// Format instruction appended to the structural rules
    fn format_rule(&self) -> String;

    /// Render source texts as the prompt body
    fn encode(&self, texts: &[&str]) -> String;

    /// Text placed after the body, cueing the model to answer
    fn trailer(&self, target_language: &str) -> String;

    /// Recover translated units from a raw response
    fn decode(&self, response: &str) -> Vec<String>;
}

/// Replace internal line breaks with single spaces
pub fn flatten(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"{n}. {text}"` per line, numbering from 1 in every batch
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedLines;

impl NumberedLines {
    /// Drop everything through the first `". "`, then trim; lines without one are only trimmed
    fn strip_index(line: &str) -> &str {
        match line.split_once(". ") {
            Some((_, rest)) => rest.trim(),
            None => line.trim(),
        }
    }
}

impl LineEncoding for NumberedLines {
    fn kind(&self) -> PromptEncoding {
        PromptEncoding::Numbered
    }

    fn format_rule(&self) -> String {
        "Each line starts with its number followed by \". \". Start every translated line with the same number.".to_string()
    }

    fn encode(&self, texts: &[&str]) -> String {
        texts.iter()
            .enumerate()
            .map(|(i, text)| format!("{}. {}", i + 1, flatten(text)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn trailer(&self, target_language: &str) -> String {
        format!("\n\n{} subtitles:\n", target_language)
    }

    // Only blank lines around the answer are dropped; inner blank lines still count as units.
    fn decode(&self, response: &str) -> Vec<String> {
        let lines: Vec<&str> = response.lines().collect();
        let start = lines.iter().position(|line| !line.trim().is_empty()).unwrap_or(lines.len());
        let end = lines.iter().rposition(|line| !line.trim().is_empty()).map_or(start, |i| i + 1);
        lines[start..end]
            .iter()
            .map(|line| Self::strip_index(line).to_string())
            .collect()
    }
}

/// All texts on one line, joined with a sentinel token
#[derive(Debug, Clone)]
pub struct SeparatorJoined {
    separator: String,
}

impl SeparatorJoined {
    pub fn new(separator: impl Into<String>) -> Self {
        Self { separator: separator.into() }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl LineEncoding for SeparatorJoined {
    fn kind(&self) -> PromptEncoding {
        PromptEncoding::Separator
    }

    fn format_rule(&self) -> String {
        format!(
            "The text blocks are separated by '{0}'. Keep the '{0}' delimiter between the translated blocks and return only the translated blocks.",
            self.separator
        )
    }

    fn encode(&self, texts: &[&str]) -> String {
        texts.iter()
            .map(|text| flatten(text))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    // The body is the last line of the prompt.
    fn trailer(&self, _target_language: &str) -> String {
        String::new()
    }

    fn decode(&self, response: &str) -> Vec<String> {
        response.split(self.separator.as_str())
            .map(|piece| piece.trim().to_string())
            .collect()
    }
}
