use serde::Deserialize;
use std::sync::OnceLock;

use crate::language::core::read_embedded;
use crate::language::{find_language_by_id, Language};
use crate::scanner::{leading_skip_end, CommentConfig};

/// Default cap on the size of a sample, in characters
pub const DEFAULT_MAX_CHARS: usize = 2000;

static SAMPLES: OnceLock<Vec<CodeSample>> = OnceLock::new();

/// A piece of code to type
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CodeSample {
    pub id: String,
    /// display name of the language
    pub language: String,
    pub language_id: String,
    pub title: String,
    pub code: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl CodeSample {
    /// Build a sample from user-provided text, normalised the same way as
    /// fetched code.
    pub fn from_text(title: &str, raw: &str, language: Option<&Language>, max_chars: usize) -> Self {
        let (language_name, language_id) = match language {
            Some(language) => (language.name.clone(), language.id.clone()),
            None => ("Plain text".to_string(), String::new()),
        };

        Self {
            id: format!("custom-{title}"),
            language: language_name,
            language_id,
            title: title.to_string(),
            code: sanitize_code(raw, max_chars),
            source_url: None,
        }
    }

    pub fn comment_config(&self) -> CommentConfig {
        find_language_by_id(&self.language_id)
            .map(Language::comment_config)
            .unwrap_or_default()
    }

    /// Whether anything is left to type once leading blank lines and comments
    /// are skipped.
    pub fn has_typable_content(&self) -> bool {
        let text: Vec<char> = self.code.chars().collect();
        leading_skip_end(&text, &self.comment_config()) < text.len()
    }
}

/// Built-in samples bundled with the binary.
pub fn all_samples() -> &'static [CodeSample] {
    SAMPLES.get_or_init(|| {
        read_embedded("samples.json").expect("Unable to deserialize bundled samples.json")
    })
}

pub fn find_sample(id: &str) -> Option<&'static CodeSample> {
    all_samples().iter().find(|sample| sample.id == id)
}

/// Normalise raw source text for typing.
///
/// Line endings become `\n`, tabs become four spaces, trailing whitespace is
/// stripped, blank lines at either end are dropped, and the result is cut to
/// whole lines fitting in `max_chars` characters.
pub fn sanitize_code(raw: &str, max_chars: usize) -> String {
    let normalized = raw.replace("\r\n", "\n");
    let lines: Vec<String> = normalized
        .split('\n')
        .map(|line| line.replace('\t', "    ").trim_end().to_string())
        .collect();

    let start = lines.iter().position(|line| !line.is_empty());
    let Some(start) = start else {
        return String::new();
    };
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(start, |last| last + 1);

    truncate_to_limit(&lines[start..end], max_chars)
}

fn truncate_to_limit(lines: &[String], max_chars: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut total = 0;

    for line in lines {
        let len = line.chars().count();
        let addition = if kept.is_empty() { len } else { len + 1 };
        if total + addition > max_chars {
            break;
        }
        kept.push(line);
        total += addition;
    }

    kept.join("\n")
}
