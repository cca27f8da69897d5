use crate::alias::DEFAULT_PREFIXES;

/// Default marker after which every token is a literal value.
pub const DEFAULT_END_OF_OPTIONS: &str = "--";

/// Lexical settings shared by the tokenizer and the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Prefixes that mark a named-token candidate and that are ignored when
    /// comparing aliases.
    pub prefixes: Vec<String>,
    /// Characters splitting `--name=value` / `-n:value` into name and value.
    pub argument_delimiters: Vec<char>,
    /// Marker ending option recognition, `None` to disable.
    pub end_of_options: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            argument_delimiters: vec!['=', ':'],
            end_of_options: Some(DEFAULT_END_OF_OPTIONS.to_string()),
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        self
    }

    pub fn with_argument_delimiters(mut self, delimiters: impl IntoIterator<Item = char>) -> Self {
        self.argument_delimiters = delimiters.into_iter().collect();
        self
    }

    pub fn with_end_of_options(mut self, marker: Option<String>) -> Self {
        self.end_of_options = marker.filter(|m| !m.trim().is_empty());
        self
    }

    pub(crate) fn is_end_of_options(&self, token: &str) -> bool {
        self.end_of_options.as_deref() == Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_prefixes() {
        let config = ParserConfig::default();
        assert_eq!(config.prefixes, ["--", "-", "/"]);
        assert_eq!(config.argument_delimiters, ['=', ':']);
        assert!(config.is_end_of_options("--"));
    }

    #[test]
    fn blank_markers_are_ignored() {
        let config = ParserConfig::new()
            .with_prefixes(["-", ""])
            .with_end_of_options(Some(" ".to_string()));
        assert_eq!(config.prefixes, ["-"]);
        assert_eq!(config.end_of_options, None);
        assert!(!config.is_end_of_options("--"));
    }
}
