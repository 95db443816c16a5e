/*!
 * Tests for language utilities
 */

use subtranslate::errors::ConfigError;
use subtranslate::language_utils::{get_language_name, normalize_to_part2t, resolve_language_name};

/// Test ISO 639-1 to 639-2/T normalization
#[test]
fn test_normalize_to_part2t_withValidCodes_shouldNormalize() {
    assert_eq!(normalize_to_part2t("fa").unwrap(), "fas");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("jpn").unwrap(), "jpn");
    assert!(normalize_to_part2t("english").is_err());
}

/// Test language name lookup
#[test]
fn test_get_language_name_withValidCode_shouldReturnEnglishName() {
    assert_eq!(get_language_name("de").unwrap(), "German");
    assert_eq!(get_language_name("spa").unwrap(), "Spanish");
}

/// Prompt names come from codes or are taken as written
#[test]
fn test_resolve_language_name_withNamesAndCodes_shouldReturnPromptName() {
    assert_eq!(resolve_language_name("Persian").unwrap(), "Persian");
    assert_eq!(resolve_language_name("fa").unwrap(), "Persian");
    assert_eq!(
        resolve_language_name("12"),
        Err(ConfigError::InvalidLanguage("12".to_string()))
    );
}

/// Names with punctuation go into the prompt as written
#[test]
fn test_resolve_language_name_withParenthesisedName_shouldPassThrough() {
    assert_eq!(resolve_language_name("Portuguese (Brazil)").unwrap(), "Portuguese (Brazil)");
    assert_eq!(resolve_language_name(" Chinese (Simplified) ").unwrap(), "Chinese (Simplified)");
    assert_eq!(resolve_language_name("Ga").unwrap(), "Ga");
    assert!(resolve_language_name("(42)").is_err());
}
