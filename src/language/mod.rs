pub mod core;

// Re-export the main types for convenience
pub use self::core::{
    all_languages, find_language_by_id, matches_extension, CommentPair, Language,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::skippable_region_end;

    #[test]
    fn test_registry_drives_comment_skipping() {
        let text: Vec<char> = "x = 1\n# note\ny = 2".chars().collect();

        let python = find_language_by_id("python").unwrap().comment_config();
        assert_eq!(skippable_region_end(&text, 6, &python), 13);

        let go = find_language_by_id("go").unwrap().comment_config();
        assert_eq!(skippable_region_end(&text, 6, &go), 6);
    }
}
