/*!
 * Tests for application configuration
 */

use anyhow::Result;
use subtranslate::app_config::{Config, Credentials, LogLevel};
use subtranslate::errors::ConfigError;
use subtranslate::providers::BackendFamily;
use subtranslate::translation::PromptEncoding;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoChanges_shouldHaveDocumentedDefaults() {
    let config = Config::default();
    assert_eq!(config.source_language, "English");
    assert_eq!(config.target_language, "Persian");
    assert_eq!(config.model, None);
    assert_eq!(config.batch_size, 200);
    assert_eq!(config.rpm_limit, 15);
    assert_eq!(config.cooldown_secs, 30);
    assert_eq!(config.encoding, PromptEncoding::Numbered);
    assert_eq!(config.separator, "||SEP||");
    assert_eq!(config.log_level, LogLevel::Info);
}

/// A missing config file falls back to defaults
#[test]
fn test_load_or_default_withMissingFile_shouldReturnDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let config = Config::load_or_default(dir.path().join("absent.json"))?;
    assert_eq!(config, Config::default());
    Ok(())
}

/// Values from the file override defaults, the rest stay default
#[test]
fn test_load_or_default_withPartialFile_shouldMergeDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{"model": "gemma-3-27b-it", "batch_size": 50, "target_language": "fr", "log_level": "debug"}"#,
    )?;

    let config = Config::load_or_default(&path)?;
    assert_eq!(config.model_name(), Some("gemma-3-27b-it"));
    assert_eq!(config.batch_size, 50);
    assert_eq!(config.rpm_limit, 15);
    assert_eq!(config.target_language_name()?, "French");
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    Ok(())
}

/// A malformed file is an error, not silently replaced by defaults
#[test]
fn test_load_or_default_withInvalidJson_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_default(&path).is_err());
    Ok(())
}

/// Validation rejects non-positive limits and unknown languages
#[test]
fn test_validate_withInvalidValues_shouldReturnConfigErrors() {
    let base = common::test_config("gpt-4o");
    assert_eq!(base.validate(), Ok(()));

    let config = Config { rpm_limit: 0, ..base.clone() };
    assert_eq!(config.validate(), Err(ConfigError::InvalidRateLimit(0)));

    let config = Config { source_language: "zz".to_string(), ..base };
    assert_eq!(config.validate(), Err(ConfigError::InvalidLanguage("zz".to_string())));
}

/// Each family needs its own variables
#[test]
fn test_credentials_resolve_withMissingVariables_shouldNameTheVariable() {
    let result = Credentials::resolve(BackendFamily::OpenAI, common::lookup_from(&[]));
    assert_eq!(result, Err(ConfigError::MissingCredential { variable: "OPENAI_API_KEY".to_string() }));

    let result = Credentials::resolve(BackendFamily::Gemini, common::lookup_from(&[("GOOGLE_API_KEY", "  ")]));
    assert_eq!(result, Err(ConfigError::MissingCredential { variable: "GOOGLE_API_KEY".to_string() }));
}

/// Optional Gemini endpoint override is picked up
#[test]
fn test_credentials_resolve_withGeminiBaseUrl_shouldUseIt() {
    let credentials = Credentials::resolve(
        BackendFamily::Gemini,
        common::lookup_from(&[("GOOGLE_API_KEY", "g"), ("GEMINI_BASE_URL", "http://127.0.0.1:9000")]),
    ).unwrap();
    assert_eq!(credentials.base_url.as_deref(), Some("http://127.0.0.1:9000"));
}
