//! Declarative command-line grammars.
//!
//! Declare options and commands with [`OptionDefinition`] and
//! [`CommandDefinition`], freeze the root into a [`Grammar`], then parse raw
//! lines or pre-split argument lists against it:
//!
//! ```
//! use argot_grammar::{ArgumentDefinition, CommandDefinition, Grammar, OptionDefinition};
//!
//! let root = CommandDefinition::new(["tool"])?
//!     .with_option(
//!         OptionDefinition::new(["-o", "--output"])?
//!             .with_argument(ArgumentDefinition::exactly_one()),
//!     )
//!     .with_option(OptionDefinition::new(["-v", "/verbose"])?);
//! let grammar = Grammar::new(root);
//!
//! let result = grammar.parse("--verbose -o out.txt")?;
//! assert!(result.has_option("v"));
//! assert_eq!(result.value("output"), Some("out.txt"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Prefixes `-`, `--` and `/` are interchangeable when matching aliases.
//! Tokens that name nothing are handed, in order, to the options of their
//! command that were not named explicitly, in declaration order. Whatever is
//! left goes to the command's own argument and then to
//! [`ParseResult::unmatched_tokens`].

mod alias;
mod config;
mod definition;
mod grammar;
pub mod help;
mod matcher;
mod result;
mod token;

pub use alias::{DEFAULT_PREFIXES, aliases_match, is_prefixed, strip_prefix};
pub use config::{DEFAULT_END_OF_OPTIONS, ParserConfig};
pub use definition::{
    ArgumentDefinition, ArgumentHelp, Arity, CommandDefinition, DefinitionError,
    OptionDefinition, SymbolDefinition, Validator,
};
pub use grammar::{Grammar, SymbolId, SymbolKind, SymbolRef};
pub use help::{HelpSink, TextSink};
pub use result::{
    BoundValue, LookupError, ParseCondition, ParseError, ParseResult, SymbolMatch,
};
pub use token::{Token, TokenKind, tokenize, tokenize_args};
