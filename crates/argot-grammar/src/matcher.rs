//! Binds tokens to symbols.
//!
//! Matching runs in two passes over the token stream.
//!
//! The first pass walks left to right. A token naming a child command of the
//! current scope descends into that command. A token naming an option anywhere
//! on the active scope chain (innermost scope first) binds that option and
//! greedily takes following tokens as values, up to the arity maximum,
//! stopping at the next token that names a command or option. Any other token
//! is parked on the current scope.
//!
//! The second pass is positional inference. Each scope hands its parked
//! tokens, in order, to its options in declaration order, skipping options
//! that were named explicitly and options that take no value. What is left
//! goes to the scope's own command argument, and then to the unmatched list.
//! Scopes never share parked tokens.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::grammar::{Grammar, SymbolId, SymbolRef};
use crate::result::{ParseCondition, ParseError, ParseResult, SymbolMatch};
use crate::token::{Token, TokenKind};

enum Recognized {
    Command(SymbolId),
    Option(SymbolId),
    /// `--name=value`: the option plus its attached first value.
    OptionWithValue(SymbolId, String),
}

struct Scope {
    command: SymbolId,
    /// Token indices left for positional inference.
    parked: Vec<usize>,
}

impl Scope {
    fn new(command: SymbolId) -> Self {
        Self {
            command,
            parked: Vec::new(),
        }
    }
}

struct Binding {
    values: Vec<String>,
    /// Tokens taken, including values a validator rejected.
    consumed: usize,
    position: usize,
}

struct Leftover {
    scope: SymbolId,
    position: usize,
    value: String,
}

struct Matcher<'g> {
    grammar: &'g Grammar,
    tokens: Vec<Token>,
    scopes: Vec<Scope>,
    bindings: IndexMap<SymbolId, Binding>,
    explicit: HashSet<SymbolId>,
    conditions: Vec<ParseCondition>,
    leftovers: Vec<Leftover>,
}

pub(crate) fn match_tokens(
    grammar: &Grammar,
    tokens: Vec<Token>,
) -> Result<ParseResult<'_>, ParseError> {
    let mut matcher = Matcher::new(grammar, tokens);
    matcher.walk();
    matcher.infer_positionals();
    matcher.finish()
}

impl<'g> Matcher<'g> {
    fn new(grammar: &'g Grammar, tokens: Vec<Token>) -> Self {
        Self {
            grammar,
            tokens,
            scopes: vec![Scope::new(grammar.root().id())],
            bindings: IndexMap::new(),
            explicit: HashSet::new(),
            conditions: Vec::new(),
            leftovers: Vec::new(),
        }
    }

    fn current_command(&self) -> SymbolRef<'g> {
        let id = self.scopes.last().map_or(self.grammar.root().id(), |s| s.command);
        self.grammar.symbol(id)
    }

    fn walk(&mut self) {
        let mut cursor = 0;
        while cursor < self.tokens.len() {
            cursor = match self.recognize(&self.tokens[cursor]) {
                Some(Recognized::Command(id)) => {
                    tracing::trace!(
                        token = %self.tokens[cursor].value,
                        command = %self.grammar.symbol(id).name(),
                        "entering command scope"
                    );
                    self.bind(id, cursor);
                    self.scopes.push(Scope::new(id));
                    cursor + 1
                }
                Some(Recognized::Option(id)) => {
                    tracing::trace!(
                        token = %self.tokens[cursor].value,
                        option = %self.grammar.symbol(id).name(),
                        "named option"
                    );
                    self.explicit.insert(id);
                    self.bind(id, cursor);
                    self.absorb(id, cursor + 1)
                }
                Some(Recognized::OptionWithValue(id, value)) => {
                    tracing::trace!(
                        token = %self.tokens[cursor].value,
                        option = %self.grammar.symbol(id).name(),
                        "named option with attached value"
                    );
                    self.explicit.insert(id);
                    self.bind(id, cursor);
                    let arity = self.grammar.symbol(id).arity();
                    if arity.accepts_more(self.consumed(id)) {
                        self.push_value(id, cursor, value);
                    } else {
                        let scope = self.current_command().id();
                        self.leftovers.push(Leftover {
                            scope,
                            position: cursor,
                            value,
                        });
                    }
                    self.absorb(id, cursor + 1)
                }
                None => {
                    tracing::trace!(token = %self.tokens[cursor].value, "parked for positional inference");
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.parked.push(cursor);
                    }
                    cursor + 1
                }
            };
        }
    }

    fn recognize(&self, token: &Token) -> Option<Recognized> {
        if !token.can_be_alias() {
            return None;
        }

        if let Some(command) = self
            .current_command()
            .commands()
            .find(|c| c.has_alias(&token.value))
        {
            return Some(Recognized::Command(command.id()));
        }

        if let Some(option) = self.find_option(&token.value) {
            return Some(Recognized::Option(option.id()));
        }

        if token.kind != TokenKind::Named {
            return None;
        }
        let delimiters = &self.grammar.config().argument_delimiters;
        let split = token.value.find(|c: char| delimiters.contains(&c))?;
        let (name, rest) = token.value.split_at(split);
        let option = self.find_option(name)?;
        if option.arity().max() == Some(0) {
            return None;
        }
        let delimiter_len = rest.chars().next().map_or(0, char::len_utf8);
        Some(Recognized::OptionWithValue(
            option.id(),
            rest[delimiter_len..].to_string(),
        ))
    }

    // Innermost scope wins when an alias is declared at several levels.
    fn find_option(&self, alias: &str) -> Option<SymbolRef<'g>> {
        let grammar = self.grammar;
        self.scopes
            .iter()
            .rev()
            .flat_map(move |scope| grammar.symbol(scope.command).options())
            .find(|o| o.has_alias(alias))
    }

    fn consumed(&self, id: SymbolId) -> usize {
        self.bindings.get(&id).map_or(0, |b| b.consumed)
    }

    fn bind(&mut self, id: SymbolId, position: usize) {
        self.bindings.entry(id).or_insert(Binding {
            values: Vec::new(),
            consumed: 0,
            position,
        });
    }

    fn push_value(&mut self, id: SymbolId, position: usize, value: String) {
        let grammar = self.grammar;
        let symbol = grammar.symbol(id);
        let verdict = symbol
            .argument()
            .map_or(Ok(()), |argument| argument.validate(&value));

        self.bind(id, position);
        let Some(binding) = self.bindings.get_mut(&id) else {
            return;
        };
        binding.consumed += 1;
        match verdict {
            Ok(()) => binding.values.push(value),
            Err(reason) => {
                tracing::trace!(symbol = %symbol.name(), %value, %reason, "value rejected");
                self.conditions.push(ParseCondition::InvalidValue {
                    symbol: symbol.name().to_string(),
                    value,
                    reason,
                });
            }
        }
    }

    /// Take values for a named option starting at `cursor`.
    fn absorb(&mut self, id: SymbolId, mut cursor: usize) -> usize {
        let arity = self.grammar.symbol(id).arity();
        while cursor < self.tokens.len() && arity.accepts_more(self.consumed(id)) {
            if self.recognize(&self.tokens[cursor]).is_some() {
                break;
            }
            let value = self.tokens[cursor].value.clone();
            self.push_value(id, cursor, value);
            cursor += 1;
        }
        cursor
    }

    fn infer_positionals(&mut self) {
        let grammar = self.grammar;
        let scopes = std::mem::take(&mut self.scopes);

        for scope in &scopes {
            let command = grammar.symbol(scope.command);
            let mut parked = scope.parked.iter().copied().peekable();

            for option in command.options() {
                if parked.peek().is_none() {
                    break;
                }
                if self.explicit.contains(&option.id()) {
                    continue;
                }
                self.fill(option, &mut parked);
            }
            self.fill(command, &mut parked);

            for position in parked {
                self.leftovers.push(Leftover {
                    scope: scope.command,
                    position,
                    value: self.tokens[position].value.clone(),
                });
            }
        }

        self.scopes = scopes;
    }

    fn fill(&mut self, symbol: SymbolRef<'g>, parked: &mut impl Iterator<Item = usize>) {
        let arity = symbol.arity();
        while arity.accepts_more(self.consumed(symbol.id())) {
            let Some(position) = parked.next() else {
                break;
            };
            tracing::trace!(
                token = %self.tokens[position].value,
                symbol = %symbol.name(),
                "positional value"
            );
            let value = self.tokens[position].value.clone();
            self.push_value(symbol.id(), position, value);
        }
    }

    fn check_arity(&mut self) {
        let grammar = self.grammar;

        // Commands on the active chain were invoked even if nothing bound to
        // them; the root in particular never has a binding of its own.
        for scope in &self.scopes {
            let command = grammar.symbol(scope.command);
            if !self.bindings.contains_key(&scope.command) && command.arity().min() > 0 {
                self.conditions.push(ParseCondition::MissingValue {
                    symbol: command.name().to_string(),
                    expected: command.arity(),
                    found: 0,
                });
            }
        }

        for (&id, binding) in &self.bindings {
            let symbol = grammar.symbol(id);
            let arity = symbol.arity();
            if binding.consumed < arity.min() {
                self.conditions.push(ParseCondition::MissingValue {
                    symbol: symbol.name().to_string(),
                    expected: arity,
                    found: binding.consumed,
                });
            }
        }
    }

    fn finish(mut self) -> Result<ParseResult<'g>, ParseError> {
        self.bindings
            .sort_by(|_, a, _, b| a.position.cmp(&b.position));
        self.leftovers.sort_by_key(|l| l.position);
        self.check_arity();

        let grammar = self.grammar;
        for scope in &self.scopes {
            let command = grammar.symbol(scope.command);
            if !command.treat_unmatched_tokens_as_errors() {
                continue;
            }
            let tokens: Vec<String> = self
                .leftovers
                .iter()
                .filter(|l| l.scope == scope.command)
                .map(|l| l.value.clone())
                .collect();
            if !tokens.is_empty() {
                tracing::debug!(command = %command.name(), count = tokens.len(), "unmatched tokens rejected");
                return Err(ParseError::UnmatchedTokens {
                    command: command.name().to_string(),
                    tokens,
                });
            }
        }

        let command = self.current_command().id();
        let matches: IndexMap<SymbolId, SymbolMatch> = self
            .bindings
            .into_iter()
            .map(|(id, b)| {
                (
                    id,
                    SymbolMatch {
                        symbol: id,
                        values: b.values,
                        position: b.position,
                    },
                )
            })
            .collect();
        let unmatched: Vec<String> = self.leftovers.into_iter().map(|l| l.value).collect();

        tracing::debug!(
            command = %grammar.symbol(command).name(),
            matched = matches.len(),
            unmatched = unmatched.len(),
            conditions = self.conditions.len(),
            "parse complete"
        );

        Ok(ParseResult {
            grammar,
            matches,
            command,
            unmatched,
            conditions: self.conditions,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::definition::{ArgumentDefinition, Arity, CommandDefinition, OptionDefinition};
    use crate::grammar::Grammar;
    use crate::result::{ParseCondition, ParseError};

    fn option(alias: &str, arity: Arity) -> OptionDefinition {
        let option = OptionDefinition::new([alias]).unwrap();
        if arity == Arity::None {
            option
        } else {
            option.with_argument(ArgumentDefinition::new(arity))
        }
    }

    #[test]
    fn greedy_absorption_stops_at_known_alias() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("--files", Arity::OneOrMore))
                .with_option(option("--force", Arity::None)),
        );
        let result = grammar.parse("--files a b --force c").unwrap();
        assert_eq!(result.values("files"), ["a", "b"]);
        assert!(result.has_option("force"));
        // `c` has nowhere to go: `files` was named, `force` takes no value.
        assert_eq!(result.unmatched_tokens(), ["c"]);
    }

    #[test]
    fn attached_values_use_configured_delimiters() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("--out", Arity::ExactlyOne))
                .with_option(option("/level", Arity::ExactlyOne))
                .with_option(option("--quiet", Arity::None)),
        );
        let result = grammar.parse("--out=a.txt /level:3 --quiet=yes").unwrap();
        assert_eq!(result.value("out"), Some("a.txt"));
        assert_eq!(result.value("level"), Some("3"));
        // Flags cannot carry a value, so the whole token stays unmatched.
        assert!(!result.has_option("quiet"));
        assert_eq!(result.unmatched_tokens(), ["--quiet=yes"]);
    }

    #[test]
    fn literal_tokens_never_match_aliases() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("-a", Arity::ExactlyOne))
                .with_option(option("-b", Arity::None)),
        );
        let result = grammar.parse("'-b'").unwrap();
        assert_eq!(result.value("a"), Some("-b"));
        assert!(!result.has_option("b"));

        let result = grammar.parse("-- -b").unwrap();
        assert_eq!(result.value("a"), Some("-b"));
    }

    #[test]
    fn shortfall_is_recorded_not_fatal() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("-a", Arity::ExactlyOne))
                .with_option(option("-b", Arity::None)),
        );
        let result = grammar.parse("-a -b").unwrap();
        assert!(result.has_option("a"));
        assert!(result.has_option("b"));
        assert_eq!(
            result.conditions(),
            [ParseCondition::MissingValue {
                symbol: "a".to_string(),
                expected: Arity::ExactlyOne,
                found: 0,
            }]
        );
    }

    #[test]
    fn rejected_values_are_collected_and_matching_continues() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(
                    OptionDefinition::new(["--format"]).unwrap().with_argument(
                        ArgumentDefinition::exactly_one().with_allowed_values(["json", "text"]),
                    ),
                )
                .with_option(option("--name", Arity::ExactlyOne)),
        );
        let result = grammar.parse("--format xml --name demo").unwrap();
        assert_eq!(result.value("name"), Some("demo"));
        assert!(result.has_option("format"));
        assert_eq!(result.value("format"), None);
        assert_eq!(
            result.conditions(),
            [ParseCondition::InvalidValue {
                symbol: "format".to_string(),
                value: "xml".to_string(),
                reason: "possible values: json, text".to_string(),
            }]
        );
        // The rejected token was consumed; it is not unmatched and it did not
        // fall through to `name`.
        assert!(result.unmatched_tokens().is_empty());
    }

    #[test]
    fn outer_options_stay_reachable_inside_subcommands() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("--verbose", Arity::None))
                .with_command(
                    CommandDefinition::new(["run"])
                        .unwrap()
                        .with_option(option("--target", Arity::ExactlyOne)),
                ),
        );
        let result = grammar.parse("run --verbose x").unwrap();
        assert!(result.has_option("verbose"));
        assert_eq!(result.value("target"), Some("x"));
        assert_eq!(result.command().name(), "run");
    }

    #[test]
    fn innermost_alias_wins() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("-n", Arity::ExactlyOne))
                .with_command(
                    CommandDefinition::new(["sub"])
                        .unwrap()
                        .with_option(option("-n", Arity::ExactlyOne)),
                ),
        );
        let result = grammar.parse("sub -n 5").unwrap();
        let (symbol, m) = result
            .matches()
            .find(|(s, _)| s.is_option())
            .unwrap();
        assert_eq!(symbol.parent().unwrap().name(), "sub");
        assert_eq!(m.values(), ["5"]);
    }

    #[test]
    fn parent_parked_tokens_stay_in_parent_scope() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("--profile", Arity::ExactlyOne))
                .with_command(
                    CommandDefinition::new(["deploy"])
                        .unwrap()
                        .with_option(option("--region", Arity::ExactlyOne)),
                ),
        );
        let result = grammar.parse("prod deploy eu").unwrap();
        assert_eq!(result.value("profile"), Some("prod"));
        assert_eq!(result.value("region"), Some("eu"));

        let names: Vec<&str> = result.symbols().map(|s| s.name()).collect();
        assert_eq!(names, ["profile", "deploy", "region"]);
    }

    #[test]
    fn leftovers_become_command_arguments() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("--name", Arity::ExactlyOne))
                .with_argument(ArgumentDefinition::zero_or_more()),
        );
        let result = grammar.parse("alice one two").unwrap();
        assert_eq!(result.value("name"), Some("alice"));
        assert_eq!(result.arguments(), ["one", "two"]);
        assert!(result.unmatched_tokens().is_empty());
    }

    #[test]
    fn strict_scope_rejects_leftovers() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("--name", Arity::ExactlyOne))
                .treat_unmatched_tokens_as_errors(true),
        );
        let err = grammar.parse("alice bob carol").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnmatchedTokens {
                command: "tool".to_string(),
                tokens: vec!["bob".to_string(), "carol".to_string()],
            }
        );
        assert_eq!(
            err.to_string(),
            "Unrecognized command or argument(s) for 'tool': bob carol"
        );
        assert!(grammar.parse("alice").is_ok());
    }

    #[test]
    fn repeated_option_fills_remaining_capacity() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(option("-i", Arity::ZeroOrMore))
                .with_option(option("-o", Arity::ExactlyOne))
                .with_argument(ArgumentDefinition::zero_or_more()),
        );
        let result = grammar.parse("-i a -o x -i b -o y").unwrap();
        assert_eq!(result.values("i"), ["a", "b"]);
        assert_eq!(result.values("o"), ["x"]);
        assert_eq!(result.arguments(), ["y"]);
    }

    #[test]
    fn required_root_argument_is_reported() {
        let grammar = Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_argument(ArgumentDefinition::exactly_one()),
        );
        let result = grammar.parse("").unwrap();
        assert!(!result.is_valid());
        assert_eq!(
            result.conditions()[0].to_string(),
            "'tool' expects exactly one value but received 0"
        );
    }
}
