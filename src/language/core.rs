use include_dir::{include_dir, Dir};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;
use std::sync::OnceLock;

use crate::scanner::CommentConfig;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

static LANGUAGES: OnceLock<Vec<Language>> = OnceLock::new();

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CommentPair {
    pub start: String,
    pub end: String,
}

/// A programming language samples can be written in
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Language {
    pub id: String,
    pub name: String,
    pub github_query: String,
    pub extensions: Vec<String>,
    pub line_comment_tokens: Vec<String>,
    pub block_comment_pairs: Vec<CommentPair>,
}

impl Language {
    pub fn comment_config(&self) -> CommentConfig {
        CommentConfig::new(
            self.line_comment_tokens.iter().cloned(),
            self.block_comment_pairs
                .iter()
                .map(|pair| (pair.start.clone(), pair.end.clone())),
        )
    }

    pub fn matches_path(&self, path: &str) -> bool {
        matches_extension(path, self.extensions.as_slice())
    }
}

/// Deserialize one of the JSON files bundled into the binary.
pub(crate) fn read_embedded<T: DeserializeOwned>(file_name: &str) -> Result<T, Box<dyn Error>> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| format!("embedded file {file_name} not found"))?;

    let file_as_str = file
        .contents_utf8()
        .ok_or_else(|| format!("embedded file {file_name} is not utf-8"))?;

    Ok(from_str(file_as_str)?)
}

/// Every language the app knows about, in menu order.
pub fn all_languages() -> &'static [Language] {
    LANGUAGES.get_or_init(|| {
        read_embedded("languages.json").expect("Unable to deserialize bundled languages.json")
    })
}

pub fn find_language_by_id(id: &str) -> Option<&'static Language> {
    all_languages().iter().find(|language| language.id == id)
}

pub fn matches_extension<S: AsRef<str>>(path: &str, extensions: &[S]) -> bool {
    extensions.iter().any(|ext| path.ends_with(ext.as_ref()))
}
