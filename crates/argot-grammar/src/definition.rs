//! Symbol definitions: the declarative description of a grammar.
//!
//! Definitions nest by value while they are being declared. Nothing here is
//! mutable once built: every `with_*` method consumes `self` and returns the
//! extended definition. Freeze a root [`CommandDefinition`] into a
//! [`Grammar`](crate::Grammar) to parse against it.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::alias::{self, DEFAULT_PREFIXES};

/// Invalid symbol declarations.
///
/// The messages are fixed and callers may compare against them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("An option must have at least one alias.")]
    NoAliases,
    #[error("An option alias cannot be null, empty, or consist entirely of whitespace.")]
    BlankAlias,
}

/// How many values a symbol accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Arity {
    /// No values: the symbol is a presence flag.
    #[default]
    None,
    ExactlyOne,
    ZeroOrOne,
    OneOrMore,
    ZeroOrMore,
}

impl Arity {
    pub fn min(self) -> usize {
        match self {
            Self::None | Self::ZeroOrOne | Self::ZeroOrMore => 0,
            Self::ExactlyOne | Self::OneOrMore => 1,
        }
    }

    /// Upper bound on values; `None` means unbounded.
    pub fn max(self) -> Option<usize> {
        match self {
            Self::None => Some(0),
            Self::ExactlyOne | Self::ZeroOrOne => Some(1),
            Self::OneOrMore | Self::ZeroOrMore => None,
        }
    }

    /// Whether `count` values satisfy this arity.
    pub fn accepts(self, count: usize) -> bool {
        count >= self.min() && self.max().is_none_or(|max| count <= max)
    }

    /// Whether a symbol already holding `count` values can take another.
    pub fn accepts_more(self, count: usize) -> bool {
        self.max().is_none_or(|max| count < max)
    }

    /// Whether the arity allows more than one value.
    pub fn is_multiple(self) -> bool {
        self.max().is_none()
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::None => "no value",
            Self::ExactlyOne => "exactly one value",
            Self::ZeroOrOne => "at most one value",
            Self::OneOrMore => "at least one value",
            Self::ZeroOrMore => "any number of values",
        };
        f.write_str(text)
    }
}

/// Accept/reject check applied to every value bound to a symbol.
///
/// A rejection carries a human-readable reason. Validators run during
/// matching and never abort it; rejections are collected on the result.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>);

impl Validator {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Accept only the listed values (exact, case-sensitive).
    pub fn one_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<String> = allowed.into_iter().map(Into::into).collect();
        Self::new(move |value| {
            if allowed.iter().any(|a| a == value) {
                Ok(())
            } else {
                Err(format!("possible values: {}", allowed.join(", ")))
            }
        })
    }

    pub fn validate(&self, value: &str) -> Result<(), String> {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Display metadata for an argument (`<NAME>` in usage lines).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentHelp {
    pub name: String,
    pub description: String,
}

/// The values a symbol accepts.
#[derive(Debug, Clone, Default)]
pub struct ArgumentDefinition {
    arity: Arity,
    help: Option<ArgumentHelp>,
    validator: Option<Validator>,
}

impl ArgumentDefinition {
    pub fn new(arity: Arity) -> Self {
        Self {
            arity,
            help: None,
            validator: None,
        }
    }

    pub fn exactly_one() -> Self {
        Self::new(Arity::ExactlyOne)
    }

    pub fn zero_or_one() -> Self {
        Self::new(Arity::ZeroOrOne)
    }

    pub fn one_or_more() -> Self {
        Self::new(Arity::OneOrMore)
    }

    pub fn zero_or_more() -> Self {
        Self::new(Arity::ZeroOrMore)
    }

    pub fn with_help(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.help = Some(ArgumentHelp {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_allowed_values<I, S>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_validator(Validator::one_of(allowed))
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn help(&self) -> Option<&ArgumentHelp> {
        self.help.as_ref()
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Run the validator, if any.
    pub fn validate(&self, value: &str) -> Result<(), String> {
        match &self.validator {
            Some(v) => v.validate(value),
            None => Ok(()),
        }
    }
}

/// Fields shared by options and commands.
#[derive(Debug, Clone)]
pub(crate) struct SymbolHeader {
    pub(crate) raw_aliases: Vec<String>,
    pub(crate) name: String,
    pub(crate) argument: Option<ArgumentDefinition>,
    pub(crate) help: Option<String>,
}

impl SymbolHeader {
    fn new<I, S>(aliases: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw_aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        if raw_aliases.is_empty() {
            return Err(DefinitionError::NoAliases);
        }
        if raw_aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(DefinitionError::BlankAlias);
        }
        let name = longest_alias(&raw_aliases, &DEFAULT_PREFIXES).to_string();
        Ok(Self {
            raw_aliases,
            name,
            argument: None,
            help: None,
        })
    }

    pub(crate) fn arity(&self) -> Arity {
        self.argument.as_ref().map_or(Arity::None, ArgumentDefinition::arity)
    }

    pub(crate) fn has_help(&self) -> bool {
        !self.name.trim().is_empty() && self.help.as_deref().is_some_and(|h| !h.trim().is_empty())
    }

    pub(crate) fn has_alias_with<P: AsRef<str>>(&self, alias: &str, prefixes: &[P]) -> bool {
        self.raw_aliases
            .iter()
            .any(|a| a == alias || alias::aliases_match(a, alias, prefixes))
    }

    pub(crate) fn rename<P: AsRef<str>>(&mut self, prefixes: &[P]) {
        self.name = longest_alias(&self.raw_aliases, prefixes).to_string();
    }
}

// First alias wins among equally long ones.
fn longest_alias<'a, P: AsRef<str>>(aliases: &'a [String], prefixes: &[P]) -> &'a str {
    let mut best = "";
    for alias in aliases {
        let stripped = alias::strip_prefix(alias, prefixes);
        if stripped.len() > best.len() {
            best = stripped;
        }
    }
    best
}

macro_rules! symbol_accessors {
    ($ty:ty) => {
        impl $ty {
            /// The longest alias with its prefix removed.
            pub fn name(&self) -> &str {
                &self.header.name
            }

            /// Aliases exactly as declared.
            pub fn raw_aliases(&self) -> &[String] {
                &self.header.raw_aliases
            }

            /// Prefix-insensitive, case-sensitive alias check.
            pub fn has_alias(&self, alias: &str) -> bool {
                self.header.has_alias_with(alias, &DEFAULT_PREFIXES)
            }

            pub fn argument(&self) -> Option<&ArgumentDefinition> {
                self.header.argument.as_ref()
            }

            /// Arity of the argument, `Arity::None` without one.
            pub fn arity(&self) -> Arity {
                self.header.arity()
            }

            pub fn help(&self) -> Option<&str> {
                self.header.help.as_deref()
            }

            pub fn has_help(&self) -> bool {
                self.header.has_help()
            }

            pub fn with_argument(mut self, argument: ArgumentDefinition) -> Self {
                self.header.argument = Some(argument);
                self
            }

            pub fn with_help(mut self, description: impl Into<String>) -> Self {
                self.header.help = Some(description.into());
                self
            }
        }
    };
}

/// A named option such as `-o <FILE>` or `--verbose`.
#[derive(Debug, Clone)]
pub struct OptionDefinition {
    pub(crate) header: SymbolHeader,
}

impl OptionDefinition {
    pub fn new<I, S>(aliases: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            header: SymbolHeader::new(aliases)?,
        })
    }
}

symbol_accessors!(OptionDefinition);

/// A command: a scope holding options and nested commands.
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    pub(crate) header: SymbolHeader,
    pub(crate) symbols: Vec<SymbolDefinition>,
    pub(crate) treat_unmatched_tokens_as_errors: bool,
}

impl CommandDefinition {
    pub fn new<I, S>(aliases: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            header: SymbolHeader::new(aliases)?,
            symbols: Vec::new(),
            treat_unmatched_tokens_as_errors: false,
        })
    }

    pub fn with_option(self, option: OptionDefinition) -> Self {
        self.with_symbol(SymbolDefinition::Option(option))
    }

    pub fn with_command(self, command: CommandDefinition) -> Self {
        self.with_symbol(SymbolDefinition::Command(command))
    }

    /// Append a child. Declaration order drives positional inference.
    pub fn with_symbol(mut self, symbol: SymbolDefinition) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// Turn leftover tokens in this command's scope into a parse error.
    pub fn treat_unmatched_tokens_as_errors(mut self, enabled: bool) -> Self {
        self.treat_unmatched_tokens_as_errors = enabled;
        self
    }

    pub fn symbols(&self) -> &[SymbolDefinition] {
        &self.symbols
    }

    pub fn treats_unmatched_tokens_as_errors(&self) -> bool {
        self.treat_unmatched_tokens_as_errors
    }
}

symbol_accessors!(CommandDefinition);

/// Either kind of symbol.
#[derive(Debug, Clone)]
pub enum SymbolDefinition {
    Option(OptionDefinition),
    Command(CommandDefinition),
}

impl SymbolDefinition {
    fn header(&self) -> &SymbolHeader {
        match self {
            Self::Option(o) => &o.header,
            Self::Command(c) => &c.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn raw_aliases(&self) -> &[String] {
        &self.header().raw_aliases
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.header().has_alias_with(alias, &DEFAULT_PREFIXES)
    }

    pub fn argument(&self) -> Option<&ArgumentDefinition> {
        self.header().argument.as_ref()
    }

    pub fn help(&self) -> Option<&str> {
        self.header().help.as_deref()
    }

    pub fn has_help(&self) -> bool {
        self.header().has_help()
    }
}

impl From<OptionDefinition> for SymbolDefinition {
    fn from(option: OptionDefinition) -> Self {
        Self::Option(option)
    }
}

impl From<CommandDefinition> for SymbolDefinition {
    fn from(command: CommandDefinition) -> Self {
        Self::Command(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_requires_an_alias() {
        let err = OptionDefinition::new(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, DefinitionError::NoAliases);
        assert_eq!(err.to_string(), "An option must have at least one alias.");

        let err = CommandDefinition::new(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.to_string(), "An option must have at least one alias.");
    }

    #[test]
    fn construction_rejects_blank_aliases() {
        for blank in ["", " ", "\t \n"] {
            let err = OptionDefinition::new(["-x", blank]).unwrap_err();
            assert_eq!(
                err.to_string(),
                "An option alias cannot be null, empty, or consist entirely of whitespace."
            );
        }
    }

    #[test]
    fn name_is_longest_stripped_alias() {
        let option = OptionDefinition::new(["-o", "--output", "/out"]).unwrap();
        assert_eq!(option.name(), "output");

        // `--ab` and `/cd` both strip to two characters; the first one wins.
        let option = OptionDefinition::new(["-x", "--ab", "/cd"]).unwrap();
        assert_eq!(option.name(), "ab");
    }

    #[test]
    fn raw_aliases_are_preserved() {
        let option = OptionDefinition::new(["/X", "--long-name", "s"]).unwrap();
        assert_eq!(option.raw_aliases(), ["/X", "--long-name", "s"]);
    }

    #[test]
    fn has_alias_ignores_prefixes_but_not_case() {
        let option = OptionDefinition::new(["-o"]).unwrap();
        assert!(option.has_alias("o"));
        assert!(option.has_alias("-o"));
        assert!(option.has_alias("--o"));
        assert!(option.has_alias("/o"));
        assert!(!option.has_alias("O"));
        assert!(!option.has_alias("-O"));
    }

    #[test]
    fn has_help_needs_a_description() {
        let option = OptionDefinition::new(["-v"]).unwrap();
        assert!(!option.has_help());
        let option = option.with_help("   ");
        assert!(!option.has_help());
        let option = option.with_help("Verbose output");
        assert!(option.has_help());
    }

    #[test]
    fn arity_bounds() {
        assert!(Arity::None.accepts(0));
        assert!(!Arity::None.accepts_more(0));
        assert!(Arity::ExactlyOne.accepts_more(0));
        assert!(!Arity::ExactlyOne.accepts_more(1));
        assert!(!Arity::ExactlyOne.accepts(0));
        assert!(Arity::ZeroOrOne.accepts(0));
        assert!(Arity::OneOrMore.accepts_more(100));
        assert!(!Arity::OneOrMore.accepts(0));
        assert!(Arity::ZeroOrMore.is_multiple());
    }

    #[test]
    fn allowed_values_validator() {
        let arg = ArgumentDefinition::exactly_one().with_allowed_values(["json", "text"]);
        assert!(arg.validate("json").is_ok());
        let reason = arg.validate("xml").unwrap_err();
        assert_eq!(reason, "possible values: json, text");
    }

    #[test]
    fn symbol_without_argument_is_a_flag() {
        let option = OptionDefinition::new(["--verbose"]).unwrap();
        assert_eq!(option.arity(), Arity::None);
        let option = option.with_argument(ArgumentDefinition::one_or_more());
        assert_eq!(option.arity(), Arity::OneOrMore);
    }
}
