/*!
 * End-to-end tests of the batch translation pipeline against scripted backends
 */

use subtranslate::errors::{BatchError, TranslationError};
use subtranslate::providers::mock::MockBackend;
use subtranslate::subtitle_processor::SubtitleEntry;
use subtranslate::translation::{BatchState, PromptEncoding, RunLog, TranslationService};
use crate::common;
use crate::common::mock_providers::reversed_prefix;

/// Three entries in batches of two: two calls, everything translated in order
#[tokio::test]
async fn test_translate_entries_withThreeEntriesAndBatchOfTwo_shouldTranslateAllInOrder() {
    let config = subtranslate::Config { batch_size: 2, ..common::test_config("gpt-4o-mini") };
    let backend = MockBackend::working().with_transform(reversed_prefix);
    let service = TranslationService::with_backend(config, backend).unwrap();
    let mut entries = common::numbered_entries(3);
    let original = entries.clone();

    let report = service.translate_entries(&mut entries, &RunLog::captured(), |_, _| {}).await.unwrap();

    assert_eq!(service.backend().call_count(), 2);
    let sizes: Vec<usize> = report.batches.iter().map(|b| b.seq_nums.len()).collect();
    assert_eq!(sizes, vec![2, 1]);
    assert!(report.is_complete());

    assert_eq!(entries.len(), 3);
    for (translated, source) in entries.iter().zip(&original) {
        assert_eq!(translated.seq_num, source.seq_num);
        assert_eq!(translated.time_range, source.time_range);
        assert!(!translated.text.is_empty());
        assert_eq!(translated.text, reversed_prefix(&source.text));
    }
}

/// No entries: no calls, no batches, no errors
#[tokio::test]
async fn test_translate_entries_withNoEntries_shouldMakeNoCalls() {
    let service = TranslationService::with_backend(common::test_config("gemini-2.0-flash"), MockBackend::working()).unwrap();
    let mut entries: Vec<SubtitleEntry> = Vec::new();

    let report = service.translate_entries(&mut entries, &RunLog::captured(), |_, _| {}).await.unwrap();

    assert_eq!(service.backend().call_count(), 0);
    assert!(report.batches.is_empty());
    assert!(report.is_complete());
    assert!(entries.is_empty());
}

/// Only blank entries behaves like no entries
#[tokio::test]
async fn test_translate_entries_withOnlyBlankEntries_shouldMakeNoCalls() {
    let service = TranslationService::with_backend(common::test_config("gpt-4o"), MockBackend::working()).unwrap();
    let mut entries = vec![SubtitleEntry::new(1, "00:00:01,000 --> 00:00:02,000", "")];

    let report = service.translate_entries(&mut entries, &RunLog::captured(), |_, _| {}).await.unwrap();

    assert_eq!(service.backend().call_count(), 0);
    assert!(report.batches.is_empty());
    assert_eq!(entries[0].text, "");
}

/// An unknown model aborts before any batch is built
#[tokio::test]
async fn test_with_backend_withUnknownModel_shouldAbortBeforeAnyCall() {
    let backend = MockBackend::working();
    let result = TranslationService::with_backend(common::test_config("unknown-model-x"), backend);
    assert!(matches!(result, Err(TranslationError::UnknownModel(model)) if model == "unknown-model-x"));
}

/// Same through the credential-resolving constructor
#[test]
fn test_from_config_withUnknownModel_shouldReturnUnknownModel() {
    let result = TranslationService::from_config(common::test_config("unknown-model-x"), common::lookup_from(&[]));
    assert!(matches!(result, Err(TranslationError::UnknownModel(_))));
}

/// Sixteen full batches with a limit of fifteen: one pause, after the fifteenth
#[tokio::test]
async fn test_translate_entries_withSixteenBatches_shouldCoolDownOnce() {
    let config = subtranslate::Config { batch_size: 200, rpm_limit: 15, ..common::test_config("gemini-2.0-flash") };
    let service = TranslationService::with_backend(config, MockBackend::working()).unwrap();
    let mut entries = common::numbered_entries(16 * 200);
    let run_log = RunLog::captured();

    let report = service.translate_entries(&mut entries, &run_log, |_, _| {}).await.unwrap();

    assert_eq!(service.backend().call_count(), 16);
    assert_eq!(report.batches.len(), 16);
    assert_eq!(report.cooldowns, 1);
    assert!(report.is_complete());

    let pauses: Vec<String> = run_log.entries().into_iter()
        .map(|e| e.message)
        .filter(|m| m.contains("pausing"))
        .collect();
    assert_eq!(pauses, vec!["Sent 15 batches, pausing 0s for the rate limit"]);
}

/// Exactly rpm_limit batches: no trailing pause at the end of the run
#[tokio::test]
async fn test_translate_entries_withExactlyLimitBatches_shouldNotPause() {
    let config = subtranslate::Config { batch_size: 1, rpm_limit: 3, ..common::test_config("gpt-4o") };
    let service = TranslationService::with_backend(config, MockBackend::working()).unwrap();
    let mut entries = common::numbered_entries(3);

    let report = service.translate_entries(&mut entries, &RunLog::captured(), |_, _| {}).await.unwrap();

    assert_eq!(report.cooldowns, 0);
}

/// Pauses happen regardless of batch failures
#[tokio::test]
async fn test_translate_entries_withFailingBackend_shouldStillCoolDown() {
    let config = subtranslate::Config { batch_size: 1, rpm_limit: 2, ..common::test_config("gpt-4o") };
    let service = TranslationService::with_backend(config, MockBackend::failing()).unwrap();
    let mut entries = common::numbered_entries(5);
    let original = entries.clone();

    let report = service.translate_entries(&mut entries, &RunLog::captured(), |_, _| {}).await.unwrap();

    assert_eq!(report.cooldowns, 2);
    assert_eq!(report.failed_batches().len(), 5);
    assert_eq!(entries, original);
}

/// One line short: batch failed with a mismatch, entries untouched, others translated
#[tokio::test]
async fn test_translate_entries_withShortResponse_shouldFailOnlyThatBatch() {
    let config = subtranslate::Config { batch_size: 4, ..common::test_config("gpt-4o") };
    let service = TranslationService::with_backend(config, MockBackend::drop_last()).unwrap();
    let mut entries = common::numbered_entries(4);
    let original = entries.clone();
    let run_log = RunLog::captured();

    let report = service.translate_entries(&mut entries, &run_log, |_, _| {}).await.unwrap();

    assert_eq!(report.batches[0].state, BatchState::Failed);
    assert!(matches!(report.batches[0].error, Some(BatchError::LineCountMismatch { expected: 4, actual: 3 })));
    assert_eq!(entries, original);
    assert_eq!(report.untranslated_entries(), vec![1, 2, 3, 4]);

    let issue = &run_log.issues()[0].message;
    assert!(issue.contains("expected 4 lines, got 3"));
    assert!(issue.contains("Line 4"));
}

/// A backend error on one batch does not stop the following batches
#[tokio::test]
async fn test_translate_entries_withOneBackendFailure_shouldContinueWithNextBatches() {
    let config = subtranslate::Config { batch_size: 2, ..common::test_config("gemma-3-27b-it") };
    let backend = MockBackend::fail_on(1).with_encoding(PromptEncoding::Separator, "||SEP||");
    let config = subtranslate::Config { encoding: PromptEncoding::Separator, ..config };
    let service = TranslationService::with_backend(config, backend).unwrap();
    let mut entries = common::numbered_entries(6);

    let report = service.translate_entries(&mut entries, &RunLog::captured(), |_, _| {}).await.unwrap();

    assert_eq!(service.backend().call_count(), 3);
    let states: Vec<BatchState> = report.batches.iter().map(|b| b.state).collect();
    assert_eq!(states, vec![BatchState::Parsed, BatchState::Failed, BatchState::Parsed]);
    assert!(matches!(report.batches[1].error, Some(BatchError::Backend(_))));
    assert_eq!(report.untranslated_entries(), vec![3, 4]);

    let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec![
        "[translated] Line 1", "[translated] Line 2",
        "Line 3", "Line 4",
        "[translated] Line 5", "[translated] Line 6",
    ]);
}

/// Blank entries stay in place and never reach the prompt
#[tokio::test]
async fn test_translate_entries_withBlankEntries_shouldKeepThemOutOfPrompts() {
    let config = subtranslate::Config { batch_size: 2, ..common::test_config("gpt-4o") };
    let service = TranslationService::with_backend(config, MockBackend::working()).unwrap();
    let mut entries = vec![
        SubtitleEntry::new(1, "00:00:01,000 --> 00:00:02,000", "One"),
        SubtitleEntry::new(2, "00:00:02,000 --> 00:00:03,000", "   "),
        SubtitleEntry::new(3, "00:00:03,000 --> 00:00:04,000", "Three"),
        SubtitleEntry::new(4, "00:00:04,000 --> 00:00:05,000", ""),
        SubtitleEntry::new(5, "00:00:05,000 --> 00:00:06,000", "Five"),
    ];

    let report = service.translate_entries(&mut entries, &RunLog::captured(), |_, _| {}).await.unwrap();

    let covered: Vec<Vec<usize>> = report.batches.iter().map(|b| b.seq_nums.clone()).collect();
    assert_eq!(covered, vec![vec![1, 3], vec![5]]);
    assert_eq!(entries[1].text, "   ");
    assert_eq!(entries[3].text, "");
    assert_eq!(entries[4].text, "[translated] Five");

    let prompts = service.backend().prompts();
    assert!(prompts[0].contains("1. One\n2. Three\n"));
}

/// Progress is reported once per batch
#[tokio::test]
async fn test_translate_entries_withProgressCallback_shouldReportEachBatch() {
    let config = subtranslate::Config { batch_size: 2, ..common::test_config("gpt-4o") };
    let service = TranslationService::with_backend(config, MockBackend::working()).unwrap();
    let mut entries = common::numbered_entries(5);
    let seen = std::sync::Mutex::new(Vec::new());

    service.translate_entries(&mut entries, &RunLog::captured(), |done, total| {
        seen.lock().unwrap().push((done, total));
    }).await.unwrap();

    assert_eq!(seen.into_inner().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}
