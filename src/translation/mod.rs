/*!
 * Subtitle translation through LLM backends.
 *
 * This module contains the batch translation pipeline. It is split into several submodules:
 *
 * - `core`: Translation service definition and run diagnostics
 * - `batch`: Chunking and sequential batch processing
 * - `encoding`: How subtitle lines are framed in prompts and recovered from responses
 * - `prompts`: Instruction template, calibration examples and prompt builder
 */

// Re-export main types for easier usage
pub use self::batch::{BatchReport, BatchState, BatchTranslator, TranslationReport};
pub use self::core::{LogEntry, RunLog, TranslationService};
pub use self::encoding::{LineEncoding, PromptEncoding};

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod batch;
pub mod core;
pub mod encoding;
pub mod prompts;
