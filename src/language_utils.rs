use anyhow::{Result, anyhow};
use isolang::Language;

use crate::errors::ConfigError;

/// Language utilities for prompt language names
///
/// The prompt speaks in language names ("Persian"), while users often type
/// ISO 639-1 (2-letter) or ISO 639-2 (3-letter) codes. This module maps the
/// latter onto the former.

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        if let Some((_, part2t)) = PART2B_TO_PART2T.iter().find(|(b, _)| *b == normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Get the English language name from an ISO code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Resolve a user-supplied language into the name used in prompts
///
/// A known English language name ("Ga", "Lao") or any free-form name such as
/// "Chinese (Simplified)" is passed through trimmed. A 2 or 3 letter word that is
/// not a name must be an ISO code ("fa", "per", "fas") and becomes its English name.
pub fn resolve_language_name(input: &str) -> std::result::Result<String, ConfigError> {
    let trimmed = input.trim();
    let invalid = || ConfigError::InvalidLanguage(input.to_string());

    if Language::from_name(trimmed).is_some() {
        return Ok(trimmed.to_string());
    }

    let code_like = (2..=3).contains(&trimmed.len()) && trimmed.chars().all(|c| c.is_ascii_alphabetic());
    if code_like {
        return get_language_name(trimmed).map_err(|_| invalid());
    }

    if !trimmed.chars().any(char::is_alphabetic) {
        return Err(invalid());
    }

    Ok(trimmed.to_string())
}
