//! JSON model for argot grammars.
//!
//! A grammar manifest describes the root command, its options and nested
//! commands, and the lexical settings used to parse against them:
//!
//! ```json
//! {
//!   "format-version": 1,
//!   "root": {
//!     "aliases": ["git"],
//!     "symbols": [
//!       { "kind": "option", "aliases": ["-v", "--verbose"], "help": "Be chatty." },
//!       {
//!         "kind": "command",
//!         "aliases": ["add"],
//!         "argument": { "arity": "one-or-more", "name": "PATHSPEC" }
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! The types here only describe data. [`GrammarSchema::to_grammar`] turns a
//! manifest into a frozen [`Grammar`].

use argot_grammar::{
    ArgumentDefinition, Arity, CommandDefinition, DefinitionError, Grammar, OptionDefinition,
    ParserConfig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest layout understood by this crate.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid grammar JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported format-version {found} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },
    #[error("invalid symbol at {path}: {source}")]
    Definition {
        path: String,
        #[source]
        source: DefinitionError,
    },
}

/// Serialized form of [`Arity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ArityName {
    None,
    #[default]
    ExactlyOne,
    ZeroOrOne,
    OneOrMore,
    ZeroOrMore,
}

impl From<ArityName> for Arity {
    fn from(name: ArityName) -> Self {
        match name {
            ArityName::None => Arity::None,
            ArityName::ExactlyOne => Arity::ExactlyOne,
            ArityName::ZeroOrOne => Arity::ZeroOrOne,
            ArityName::OneOrMore => Arity::OneOrMore,
            ArityName::ZeroOrMore => Arity::ZeroOrMore,
        }
    }
}

impl From<Arity> for ArityName {
    fn from(arity: Arity) -> Self {
        match arity {
            Arity::None => ArityName::None,
            Arity::ExactlyOne => ArityName::ExactlyOne,
            Arity::ZeroOrOne => ArityName::ZeroOrOne,
            Arity::OneOrMore => ArityName::OneOrMore,
            Arity::ZeroOrMore => ArityName::ZeroOrMore,
        }
    }
}

/// Values accepted by an option or command. `arity` defaults to
/// `exactly-one`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ArgumentSchema {
    #[serde(default)]
    pub arity: ArityName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Non-empty means any other value is rejected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl ArgumentSchema {
    pub fn to_definition(&self) -> ArgumentDefinition {
        let mut argument = ArgumentDefinition::new(self.arity.into());
        if self.name.is_some() || self.description.is_some() {
            argument = argument.with_help(
                self.name.clone().unwrap_or_default(),
                self.description.clone().unwrap_or_default(),
            );
        }
        if !self.allowed_values.is_empty() {
            argument = argument.with_allowed_values(self.allowed_values.iter().cloned());
        }
        argument
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OptionSchema {
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<ArgumentSchema>,
}

impl OptionSchema {
    pub fn to_definition(&self) -> Result<OptionDefinition, DefinitionError> {
        let mut option = OptionDefinition::new(self.aliases.iter().cloned())?;
        if let Some(argument) = &self.argument {
            option = option.with_argument(argument.to_definition());
        }
        if !self.help.is_empty() {
            option = option.with_help(self.help.clone());
        }
        Ok(option)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSchema {
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<ArgumentSchema>,
    /// Child options and commands in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<SymbolSchema>,
    #[serde(default)]
    pub treat_unmatched_tokens_as_errors: bool,
}

impl CommandSchema {
    pub fn to_definition(&self) -> Result<CommandDefinition, SchemaError> {
        self.build(&mut Vec::new(), None)
    }

    fn build(
        &self,
        path: &mut Vec<String>,
        index: Option<usize>,
    ) -> Result<CommandDefinition, SchemaError> {
        let mut command =
            CommandDefinition::new(self.aliases.iter().cloned()).map_err(|source| {
                SchemaError::Definition {
                    path: describe_path(path, index),
                    source,
                }
            })?;
        path.push(command.name().to_string());

        if let Some(argument) = &self.argument {
            command = command.with_argument(argument.to_definition());
        }
        if !self.help.is_empty() {
            command = command.with_help(self.help.clone());
        }

        for (index, symbol) in self.symbols.iter().enumerate() {
            command = match symbol {
                SymbolSchema::Option(option) => {
                    let option =
                        option
                            .to_definition()
                            .map_err(|source| SchemaError::Definition {
                                path: describe_path(path, Some(index)),
                                source,
                            })?;
                    command.with_option(option)
                }
                SymbolSchema::Command(child) => {
                    command.with_command(child.build(path, Some(index))?)
                }
            };
        }

        path.pop();
        Ok(command.treat_unmatched_tokens_as_errors(self.treat_unmatched_tokens_as_errors))
    }
}

// `git remote symbols[2]`, or `root` before the root has a name.
fn describe_path(path: &[String], index: Option<usize>) -> String {
    let mut parts: Vec<String> = path.to_vec();
    if parts.is_empty() {
        parts.push("root".to_string());
    }
    if let Some(index) = index {
        parts.push(format!("symbols[{index}]"));
    }
    parts.join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SymbolSchema {
    Option(OptionSchema),
    Command(CommandSchema),
}

/// Lexical settings. Missing fields keep the [`ParserConfig`] defaults; an
/// empty `end-of-options` disables the marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_delimiters: Option<Vec<char>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_of_options: Option<String>,
}

impl ConfigSchema {
    fn is_default(&self) -> bool {
        self == &Self::default()
    }

    pub fn to_config(&self) -> ParserConfig {
        let mut config = ParserConfig::default();
        if let Some(prefixes) = &self.prefixes {
            config = config.with_prefixes(prefixes.iter().cloned());
        }
        if let Some(delimiters) = &self.argument_delimiters {
            config = config.with_argument_delimiters(delimiters.iter().copied());
        }
        if let Some(marker) = &self.end_of_options {
            config = config.with_end_of_options(Some(marker.clone()));
        }
        config
    }
}

/// Top-level manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrammarSchema {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "ConfigSchema::is_default")]
    pub config: ConfigSchema,
    pub root: CommandSchema,
}

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

impl GrammarSchema {
    pub fn new(root: CommandSchema) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            config: ConfigSchema::default(),
            root,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let schema: Self = serde_json::from_str(text)?;
        if schema.format_version != FORMAT_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                found: schema.format_version,
            });
        }
        Ok(schema)
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the frozen grammar described by this manifest.
    pub fn to_grammar(&self) -> Result<Grammar, SchemaError> {
        let root = self.root.to_definition()?;
        let grammar = Grammar::with_config(root, self.config.to_config());
        tracing::debug!(root = %grammar.root().name(), "grammar loaded from schema");
        Ok(grammar)
    }
}
