//! The frozen symbol tree.
//!
//! [`Grammar::new`] moves a root [`CommandDefinition`] into an arena. Children
//! are owned by the arena in declaration order; the parent link is a plain
//! [`SymbolId`], used only to walk upward.
//!
//! A grammar cannot be modified after construction, and it is `Send + Sync`,
//! so any number of threads may parse against the same instance.

use std::fmt;

use crate::config::ParserConfig;
use crate::definition::{
    ArgumentDefinition, Arity, CommandDefinition, SymbolDefinition, SymbolHeader,
};
use crate::matcher;
use crate::result::{ParseError, ParseResult};
use crate::token;

/// Index of a symbol inside its [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Option,
    Command { treat_unmatched_tokens_as_errors: bool },
}

#[derive(Debug)]
struct Node {
    header: SymbolHeader,
    kind: SymbolKind,
    parent: Option<SymbolId>,
    children: Vec<SymbolId>,
}

/// An immutable grammar, ready to parse input.
///
/// Symbol names are recomputed from the raw aliases using the configured
/// prefixes, so `+verbose` is named `verbose` under a `+` prefix.
#[derive(Debug)]
pub struct Grammar {
    nodes: Vec<Node>,
    config: ParserConfig,
}

impl Grammar {
    pub fn new(root: CommandDefinition) -> Self {
        Self::with_config(root, ParserConfig::default())
    }

    pub fn with_config(root: CommandDefinition, config: ParserConfig) -> Self {
        let mut grammar = Self {
            nodes: Vec::new(),
            config,
        };
        grammar.insert(SymbolDefinition::Command(root), None);
        tracing::debug!(
            root = %grammar.root().name(),
            symbols = grammar.nodes.len(),
            "grammar built"
        );
        grammar
    }

    fn insert(&mut self, symbol: SymbolDefinition, parent: Option<SymbolId>) -> SymbolId {
        let id = SymbolId(self.nodes.len());
        match symbol {
            SymbolDefinition::Option(option) => {
                let mut header = option.header;
                header.rename(&self.config.prefixes);
                self.nodes.push(Node {
                    header,
                    kind: SymbolKind::Option,
                    parent,
                    children: Vec::new(),
                });
            }
            SymbolDefinition::Command(command) => {
                let CommandDefinition {
                    mut header,
                    symbols,
                    treat_unmatched_tokens_as_errors,
                } = command;
                header.rename(&self.config.prefixes);
                self.nodes.push(Node {
                    header,
                    kind: SymbolKind::Command {
                        treat_unmatched_tokens_as_errors,
                    },
                    parent,
                    children: Vec::with_capacity(symbols.len()),
                });
                for child in symbols {
                    let child_id = self.insert(child, Some(id));
                    self.nodes[id.0].children.push(child_id);
                }
            }
        }
        id
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn root(&self) -> SymbolRef<'_> {
        SymbolRef {
            grammar: self,
            id: SymbolId(0),
        }
    }

    /// Look up a symbol by id. Ids from another grammar may return `None`.
    pub fn get(&self, id: SymbolId) -> Option<SymbolRef<'_>> {
        (id.0 < self.nodes.len()).then_some(SymbolRef { grammar: self, id })
    }

    /// All symbols, depth-first in declaration order, root first.
    pub fn symbols(&self) -> impl Iterator<Item = SymbolRef<'_>> + '_ {
        (0..self.nodes.len()).map(move |i| SymbolRef {
            grammar: self,
            id: SymbolId(i),
        })
    }

    /// First symbol anywhere in the tree answering to `alias`.
    pub fn find(&self, alias: &str) -> Option<SymbolRef<'_>> {
        self.symbols().find(|s| s.has_alias(alias))
    }

    /// Follow a path of command aliases from the root.
    pub fn command_path<S: AsRef<str>>(&self, path: &[S]) -> Option<SymbolRef<'_>> {
        let mut current = self.root();
        for segment in path {
            current = current
                .commands()
                .find(|c| c.has_alias(segment.as_ref()))?;
        }
        Some(current)
    }

    /// Tokenize and match a raw command line.
    pub fn parse(&self, line: &str) -> Result<ParseResult<'_>, ParseError> {
        matcher::match_tokens(self, token::tokenize(line, &self.config))
    }

    /// Match an argument list that is already split.
    pub fn parse_args<S: AsRef<str>>(&self, args: &[S]) -> Result<ParseResult<'_>, ParseError> {
        matcher::match_tokens(self, token::tokenize_args(args, &self.config))
    }

    // Ids handed out by this grammar are always in range.
    pub(crate) fn symbol(&self, id: SymbolId) -> SymbolRef<'_> {
        SymbolRef { grammar: self, id }
    }

    fn node(&self, id: SymbolId) -> &Node {
        &self.nodes[id.0]
    }
}

/// A borrowed view of one symbol in a [`Grammar`].
#[derive(Clone, Copy)]
pub struct SymbolRef<'g> {
    grammar: &'g Grammar,
    id: SymbolId,
}

impl<'g> SymbolRef<'g> {
    fn node(&self) -> &'g Node {
        self.grammar.node(self.id)
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn name(&self) -> &'g str {
        &self.node().header.name
    }

    pub fn raw_aliases(&self) -> &'g [String] {
        &self.node().header.raw_aliases
    }

    /// Prefix-insensitive, case-sensitive alias check using the grammar's
    /// configured prefixes.
    pub fn has_alias(&self, alias: &str) -> bool {
        self.node()
            .header
            .has_alias_with(alias, &self.grammar.config.prefixes)
    }

    pub fn argument(&self) -> Option<&'g ArgumentDefinition> {
        self.node().header.argument.as_ref()
    }

    pub fn arity(&self) -> Arity {
        self.node().header.arity()
    }

    pub fn help(&self) -> Option<&'g str> {
        self.node().header.help.as_deref()
    }

    pub fn has_help(&self) -> bool {
        self.node().header.has_help()
    }

    pub fn kind(&self) -> SymbolKind {
        self.node().kind
    }

    pub fn is_command(&self) -> bool {
        matches!(self.kind(), SymbolKind::Command { .. })
    }

    pub fn is_option(&self) -> bool {
        self.kind() == SymbolKind::Option
    }

    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    /// Always `false` for options.
    pub fn treat_unmatched_tokens_as_errors(&self) -> bool {
        matches!(
            self.kind(),
            SymbolKind::Command {
                treat_unmatched_tokens_as_errors: true
            }
        )
    }

    pub fn parent(&self) -> Option<SymbolRef<'g>> {
        self.node().parent.map(|id| SymbolRef {
            grammar: self.grammar,
            id,
        })
    }

    /// Parents from the nearest one up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = SymbolRef<'g>> + use<'g> {
        std::iter::successors(self.parent(), |s| s.parent())
    }

    /// Child symbols in declaration order.
    pub fn children(&self) -> impl Iterator<Item = SymbolRef<'g>> + use<'g> {
        let grammar = self.grammar;
        self.node()
            .children
            .iter()
            .map(move |&id| SymbolRef { grammar, id })
    }

    pub fn options(&self) -> impl Iterator<Item = SymbolRef<'g>> + use<'g> {
        self.children().filter(|s| s.is_option())
    }

    pub fn commands(&self) -> impl Iterator<Item = SymbolRef<'g>> + use<'g> {
        self.children().filter(|s| s.is_command())
    }
}

impl PartialEq for SymbolRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.grammar, other.grammar) && self.id == other.id
    }
}

impl Eq for SymbolRef<'_> {}

impl fmt::Debug for SymbolRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolRef")
            .field("id", &self.id.0)
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}
