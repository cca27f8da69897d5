use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::definition::Arity;
use crate::grammar::{Grammar, SymbolId, SymbolRef};

/// Terminal parse failure.
///
/// Only commands declared with `treat_unmatched_tokens_as_errors(true)`
/// produce one; everything else is reported through [`ParseCondition`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unrecognized command or argument(s) for '{command}': {}", .tokens.join(" "))]
    UnmatchedTokens { command: String, tokens: Vec<String> },
}

/// Advisory problems found while matching. Parsing continues past them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCondition {
    #[error("'{symbol}' expects {expected} but received {found}")]
    MissingValue {
        symbol: String,
        expected: Arity,
        found: usize,
    },
    #[error("invalid value '{value}' for '{symbol}': {reason}")]
    InvalidValue {
        symbol: String,
        value: String,
        reason: String,
    },
}

/// Lookup of an alias the grammar does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("'{0}' is not an alias of any option or command")]
    UnknownAlias(String),
}

/// Values bound to a symbol, shaped by its arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundValue<'a> {
    Single(&'a str),
    Many(&'a [String]),
}

/// One matched symbol and the values bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch {
    pub(crate) symbol: SymbolId,
    pub(crate) values: Vec<String>,
    /// Index of the token that first bound this symbol.
    pub(crate) position: usize,
}

impl SymbolMatch {
    pub fn symbol_id(&self) -> SymbolId {
        self.symbol
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

/// Output of one parse.
///
/// Holds the matched symbols in first-match order, the tokens nothing
/// claimed, and the advisory conditions collected along the way.
#[derive(Clone)]
pub struct ParseResult<'g> {
    pub(crate) grammar: &'g Grammar,
    pub(crate) matches: IndexMap<SymbolId, SymbolMatch>,
    pub(crate) command: SymbolId,
    pub(crate) unmatched: Vec<String>,
    pub(crate) conditions: Vec<ParseCondition>,
}

impl<'g> ParseResult<'g> {
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Matched symbols in the order they were first matched.
    ///
    /// The grammar root is never listed; its arguments are available from
    /// [`ParseResult::arguments`] when no subcommand was matched.
    pub fn symbols(&self) -> impl Iterator<Item = SymbolRef<'g>> + '_ {
        let grammar = self.grammar;
        self.matches
            .keys()
            .map(move |&id| grammar.symbol(id))
            .filter(|s| !s.is_root())
    }

    /// Matched symbols with their values, root excluded.
    pub fn matches(&self) -> impl Iterator<Item = (SymbolRef<'g>, &SymbolMatch)> + '_ {
        let grammar = self.grammar;
        self.matches
            .values()
            .map(move |m| (grammar.symbol(m.symbol), m))
            .filter(|(s, _)| !s.is_root())
    }

    /// The innermost matched command, or the root.
    pub fn command(&self) -> SymbolRef<'g> {
        self.grammar.symbol(self.command)
    }

    /// Values bound to the innermost command's own argument.
    pub fn arguments(&self) -> &[String] {
        self.matches
            .get(&self.command)
            .map(|m| m.values.as_slice())
            .unwrap_or_default()
    }

    pub fn unmatched_tokens(&self) -> &[String] {
        &self.unmatched
    }

    pub fn conditions(&self) -> &[ParseCondition] {
        &self.conditions
    }

    /// No conditions and no unmatched tokens.
    pub fn is_valid(&self) -> bool {
        self.conditions.is_empty() && self.unmatched.is_empty()
    }

    fn find_match(&self, alias: &str) -> Option<(SymbolRef<'g>, &SymbolMatch)> {
        self.matches().find(|(s, _)| s.has_alias(alias))
    }

    pub fn has_option(&self, alias: &str) -> bool {
        self.matches()
            .any(|(s, _)| s.is_option() && s.has_alias(alias))
    }

    pub fn has_command(&self, alias: &str) -> bool {
        self.matches()
            .any(|(s, _)| s.is_command() && s.has_alias(alias))
    }

    /// Values bound to the symbol answering to `alias`.
    ///
    /// Single-value arities yield [`BoundValue::Single`] once a value is
    /// bound; multi-value arities always yield [`BoundValue::Many`]. A symbol
    /// that is declared but was not matched yields `Ok(None)`. An alias the
    /// grammar does not declare at all is a [`LookupError`].
    pub fn value_for_option(&self, alias: &str) -> Result<Option<BoundValue<'_>>, LookupError> {
        let Some((symbol, m)) = self.find_match(alias) else {
            return match self.grammar.find(alias) {
                Some(_) => Ok(None),
                None => Err(LookupError::UnknownAlias(alias.to_string())),
            };
        };

        Ok(match symbol.arity() {
            Arity::None => None,
            Arity::ExactlyOne | Arity::ZeroOrOne => {
                m.values.first().map(|v| BoundValue::Single(v.as_str()))
            }
            Arity::OneOrMore | Arity::ZeroOrMore => Some(BoundValue::Many(&m.values)),
        })
    }

    /// First value bound to `alias`, if any.
    pub fn value(&self, alias: &str) -> Option<&str> {
        self.values(alias).first().map(String::as_str)
    }

    /// All values bound to `alias`; empty when absent or unknown.
    pub fn values(&self, alias: &str) -> &[String] {
        self.find_match(alias)
            .map(|(_, m)| m.values.as_slice())
            .unwrap_or_default()
    }
}

impl PartialEq for ParseResult<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.grammar, other.grammar)
            && self.command == other.command
            && self.matches.values().eq(other.matches.values())
            && self.unmatched == other.unmatched
            && self.conditions == other.conditions
    }
}

impl Eq for ParseResult<'_> {}

impl fmt::Debug for ParseResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: Vec<(&str, &[String])> = self
            .matches
            .values()
            .map(|m| (self.grammar.symbol(m.symbol).name(), m.values.as_slice()))
            .collect();
        f.debug_struct("ParseResult")
            .field("command", &self.command().name())
            .field("symbols", &symbols)
            .field("unmatched", &self.unmatched)
            .field("conditions", &self.conditions)
            .finish()
    }
}
