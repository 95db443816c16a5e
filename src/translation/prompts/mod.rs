/*!
 * Prompt construction for subtitle translation.
 *
 * This module provides:
 * - The instruction template with the line-preserving rules
 * - Static calibration examples that carry inline markup
 * - The per-batch prompt builder
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptTemplate, TranslationPromptBuilder, FEW_SHOT_EXAMPLES};
