use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Context, Result};
use log::{debug, warn};

use crate::errors::SubtitleError;

// @module: SRT subtitle reading and writing

// @const: SRT timing line
static TIMECODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}:\d{2}[,.]\d{1,3}\s*-->\s*\d{1,2}:\d{2}:\d{2}[,.]\d{1,3}").unwrap()
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Timing line, kept verbatim
    pub time_range: String,

    // @field: Subtitle text
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, time_range: impl Into<String>, text: impl Into<String>) -> Self {
        SubtitleEntry {
            seq_num,
            time_range: time_range.into(),
            text: text.into(),
        }
    }

    /// Whether the entry carries anything worth sending for translation
    pub fn is_translatable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{}", self.time_range)?;
        if !self.text.is_empty() {
            writeln!(f, "{}", self.text)?;
        }
        writeln!(f)
    }
}

/// Collection of subtitle entries read from one file
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Create a new subtitle collection
    pub fn new(source_file: PathBuf, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection {
            source_file,
            entries,
        }
    }

    /// Read and parse an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        let entries = Self::parse_srt_string(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;

        debug!("Parsed {} subtitle entries from {}", entries.len(), path.display());
        Ok(Self::new(path.to_path_buf(), entries))
    }

    /// Render the collection as SRT text
    pub fn to_srt_string(&self) -> String {
        let mut output = String::new();
        for entry in &self.entries {
            output.push_str(&entry.to_string());
        }
        output
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
        file.write_all(self.to_srt_string().as_bytes())
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;

        Ok(())
    }

    /// Parse SRT format string into subtitle entries
    ///
    /// Cue blocks are separated by blank lines. Each block is a sequence number,
    /// a timing line and zero or more text lines. Cues with no text are kept so the
    /// output has the same shape as the input.
    pub fn parse_srt_string(content: &str) -> std::result::Result<Vec<SubtitleEntry>, SubtitleError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut entries = Vec::new();

        let mut block: Vec<(usize, &str)> = Vec::new();
        let lines = content.lines().enumerate().map(|(i, line)| (i + 1, line.trim_end_matches('\r')));

        for (line_number, line) in lines.chain(std::iter::once((0, ""))) {
            if !line.trim().is_empty() {
                block.push((line_number, line));
                continue;
            }

            // A blank line directly after a timing line is an empty cue, not a separator
            if block.len() == 2 && line_number != 0 && TIMECODE_REGEX.is_match(block[1].1.trim()) {
                entries.push(Self::parse_block(&block)?);
                block.clear();
                continue;
            }

            if !block.is_empty() {
                entries.push(Self::parse_block(&block)?);
                block.clear();
            }
        }

        if entries.is_empty() {
            return Err(SubtitleError::NoEntries);
        }

        Ok(entries)
    }

    fn parse_block(block: &[(usize, &str)]) -> std::result::Result<SubtitleEntry, SubtitleError> {
        let (line, first) = block[0];
        let seq_num = first.trim().parse::<usize>()
            .map_err(|_| SubtitleError::InvalidSequenceNumber { line, content: first.to_string() })?;

        let time_range = match block.get(1) {
            Some((_, timing)) if TIMECODE_REGEX.is_match(timing.trim()) => timing.trim().to_string(),
            _ => return Err(SubtitleError::MissingTimecode { seq_num }),
        };

        let text = block[2..].iter()
            .map(|(_, text)| *text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            warn!("Subtitle entry {} has no text", seq_num);
        }

        Ok(SubtitleEntry { seq_num, time_range, text })
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
