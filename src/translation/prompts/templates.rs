/*!
 * Prompt templates for subtitle translation.
 *
 * A prompt is the instruction template, the format rule of the active encoding,
 * an optional block of calibration examples, and the encoded batch.
 */

use crate::translation::encoding::LineEncoding;

/// Instruction template shared by all encodings.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default instructions for subtitle translation.
    pub const SUBTITLE_TRANSLATOR: &'static str = "Translate the following {source_language} subtitles to {target_language}.
Rules:
- Translate each line individually.
- Do NOT merge adjacent lines into one.
- Do NOT split one line into several lines.
- Return exactly as many {target_language} lines as given, in the same order.
- Keep HTML-like tags such as <i>, <b>, <u> and <font> exactly as they appear, around the corresponding translated words.";

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default subtitle translator template.
    pub fn subtitle_translator() -> Self {
        Self::new(Self::SUBTITLE_TRANSLATOR)
    }

    /// Render the template with the given languages.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::subtitle_translator()
    }
}

/// Language pair of the calibration examples.
pub const FEW_SHOT_LANGUAGES: (&str, &str) = ("English", "Persian");

/// Calibration pairs, original cue followed by its translation.
///
/// Inline markup is part of the example: the model sees that tags survive translation.
pub const FEW_SHOT_EXAMPLES: &[(&str, &str)] = &[
    ("I can't believe they're going to show it!", "!باورم نمی‌شه که می‌خوان نشونش بدن"),
    ("What are you talking about?", "راجع به چی صحبت می‌کنین؟"),
    (
        "Pet? I thought you preferred\n<i>Animal Companions?</i>",
        "حیوان خانگی؟\nفکر می‌کردم برنامه <i>«همراهان حیوانات»</i> رو بیشتر دوست دارین",
    ),
    (
        "Oh, who cares about moral principles?\nThis is TV we're talking about!",
        "آه، کی به اصول اخلاقی اهمیت می‌ده؟\nناسلامتی داریم در مورد تلویزیون صحبت می‌کنیم",
    ),
    ("Yeah, that makes sense.", ".آره، منطقیه"),
    ("Can I please watch<i> Daisy?</i>", "می‌تونم لطفاً<i> «دیزی»</i> رو تماشا کنم؟"),
];

/// Builder for the prompt of one batch.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: String,
    target_language: String,
    template: PromptTemplate,
    few_shot: bool,
}

impl TranslationPromptBuilder {
    /// Create a new prompt builder.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            template: PromptTemplate::default(),
            few_shot: false,
        }
    }

    /// Embed the calibration examples in every prompt.
    pub fn with_few_shot(mut self, few_shot: bool) -> Self {
        self.few_shot = few_shot;
        self
    }

    /// Use a custom instruction template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Render the example block in the given encoding.
    fn examples(&self, codec: &dyn LineEncoding) -> String {
        let (source, target) = FEW_SHOT_LANGUAGES;
        let originals: Vec<&str> = FEW_SHOT_EXAMPLES.iter().map(|(original, _)| *original).collect();
        let translations: Vec<&str> = FEW_SHOT_EXAMPLES.iter().map(|(_, translation)| *translation).collect();

        format!(
            "Example, {} subtitles:\n{}\n\nExample, {} translation:\n{}",
            source,
            codec.encode(&originals),
            target,
            codec.encode(&translations)
        )
    }

    /// Build the prompt for one batch of source texts.
    ///
    /// The output only depends on the languages, the options and `texts`.
    pub fn build(&self, codec: &dyn LineEncoding, texts: &[&str]) -> String {
        let mut prompt = self.template.render(&self.source_language, &self.target_language);
        prompt.push_str("\n- ");
        prompt.push_str(&codec.format_rule());

        if self.few_shot {
            prompt.push_str("\n\n");
            prompt.push_str(&self.examples(codec));
        }

        prompt.push_str(&format!("\n\n{} subtitles:\n", self.source_language));
        prompt.push_str(&codec.encode(texts));
        prompt.push_str(&codec.trailer(&self.target_language));
        prompt
    }
}
