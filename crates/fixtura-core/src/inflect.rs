use inflector::string::pluralize::to_plural;

/// Pluralization used to derive default table names.
pub trait Inflector: Send + Sync {
    fn pluralize(&self, word: &str) -> String;
}

/// English pluralizer backed by the `Inflector` crate's rule set.
///
/// Only the last word of a phrase is inflected, so `"capital and space"`
/// becomes `"capital and spaces"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishInflector;

impl Inflector for EnglishInflector {
    fn pluralize(&self, phrase: &str) -> String {
        let split = phrase
            .rfind(|c: char| !c.is_alphanumeric())
            .map(|idx| idx + phrase[idx..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        let (head, word) = phrase.split_at(split);
        if word.is_empty() {
            return phrase.to_string();
        }
        format!("{head}{}", to_plural(word))
    }
}

/// Default storage table for a blueprint name.
pub fn derive_table_name(name: &str, inflector: &dyn Inflector) -> String {
    inflector.pluralize(&name.to_lowercase()).replace(' ', "_")
}
