use argot_grammar::{Grammar, ParseResult, SymbolRef};
use argot_schema::ArityName;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParseReport {
    /// Path from the root to the innermost matched command.
    pub command: Vec<String>,
    pub symbols: Vec<SymbolReport>,
    pub arguments: Vec<String>,
    pub unmatched: Vec<String>,
    pub conditions: Vec<String>,
    pub valid: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SymbolReport {
    pub name: String,
    pub kind: &'static str,
    pub arity: ArityName,
    pub values: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckReport {
    pub manifest: String,
    pub root: String,
    pub options: usize,
    /// Commands below the root.
    pub commands: usize,
    pub strict_commands: Vec<String>,
    pub undocumented: Vec<String>,
    /// Aliases answered by more than one symbol of the same scope.
    pub conflicts: Vec<String>,
}

fn kind_name(symbol: SymbolRef<'_>) -> &'static str {
    if symbol.is_command() { "command" } else { "option" }
}

/// `git remote add` for the `add` command.
pub fn symbol_path(symbol: SymbolRef<'_>) -> Vec<String> {
    let mut path: Vec<String> = symbol.ancestors().map(|s| s.name().to_string()).collect();
    path.reverse();
    path.push(symbol.name().to_string());
    path
}

pub fn parse_report(result: &ParseResult<'_>) -> ParseReport {
    ParseReport {
        command: symbol_path(result.command()),
        symbols: result
            .matches()
            .map(|(symbol, m)| SymbolReport {
                name: symbol.name().to_string(),
                kind: kind_name(symbol),
                arity: symbol.arity().into(),
                values: m.values().to_vec(),
            })
            .collect(),
        arguments: result.arguments().to_vec(),
        unmatched: result.unmatched_tokens().to_vec(),
        conditions: result.conditions().iter().map(|c| c.to_string()).collect(),
        valid: result.is_valid(),
    }
}

pub fn check_report(manifest: &Path, grammar: &Grammar) -> CheckReport {
    let mut report = CheckReport {
        manifest: manifest.display().to_string(),
        root: grammar.root().name().to_string(),
        options: 0,
        commands: 0,
        strict_commands: Vec::new(),
        undocumented: Vec::new(),
        conflicts: Vec::new(),
    };

    for symbol in grammar.symbols() {
        if symbol.is_option() {
            report.options += 1;
        } else {
            if !symbol.is_root() {
                report.commands += 1;
            }
            if symbol.treat_unmatched_tokens_as_errors() {
                report.strict_commands.push(symbol_path(symbol).join(" "));
            }
            report.conflicts.extend(alias_conflicts(grammar, symbol));
        }
        if !symbol.is_root() && !symbol.has_help() {
            report.undocumented.push(symbol_path(symbol).join(" "));
        }
    }

    report
}

fn alias_conflicts(grammar: &Grammar, command: SymbolRef<'_>) -> Vec<String> {
    let prefixes = &grammar.config().prefixes;
    let mut owners: HashMap<&str, SymbolRef<'_>> = HashMap::new();
    let mut conflicts = Vec::new();

    for child in command.children() {
        for alias in child.raw_aliases() {
            let key = argot_grammar::strip_prefix(alias, prefixes);
            match owners.get(key) {
                Some(owner) if *owner != child => conflicts.push(format!(
                    "'{key}' in '{}' names both '{}' and '{}'",
                    symbol_path(command).join(" "),
                    owner.name(),
                    child.name()
                )),
                Some(_) => {}
                None => {
                    owners.insert(key, child);
                }
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use argot_grammar::{ArgumentDefinition, CommandDefinition, OptionDefinition};
    use pretty_assertions::assert_eq;

    fn grammar() -> Grammar {
        Grammar::new(
            CommandDefinition::new(["tool"])
                .unwrap()
                .with_option(
                    OptionDefinition::new(["-v", "--verbose"])
                        .unwrap()
                        .with_help("Be chatty."),
                )
                .with_option(OptionDefinition::new(["/v", "--version"]).unwrap())
                .with_command(
                    CommandDefinition::new(["run"])
                        .unwrap()
                        .with_help("Run it.")
                        .with_argument(ArgumentDefinition::zero_or_more())
                        .treat_unmatched_tokens_as_errors(true),
                ),
        )
    }

    #[test]
    fn parse_report_lists_matches_in_order() {
        let grammar = grammar();
        let result = grammar.parse("--verbose run a b").unwrap();
        let report = parse_report(&result);

        assert_eq!(report.command, ["tool", "run"]);
        let names: Vec<(&str, &str)> = report
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind))
            .collect();
        assert_eq!(names, [("verbose", "option"), ("run", "command")]);
        assert_eq!(report.arguments, ["a", "b"]);
        assert!(report.valid);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["symbols"][1]["arity"], "zero-or-more");
    }

    #[test]
    fn check_report_counts_and_flags() {
        let grammar = grammar();
        let report = check_report(Path::new("argot.json"), &grammar);

        assert_eq!(report.root, "tool");
        assert_eq!(report.options, 2);
        assert_eq!(report.commands, 1);
        assert_eq!(report.strict_commands, ["tool run"]);
        assert_eq!(report.undocumented, ["tool version"]);
        assert_eq!(
            report.conflicts,
            ["'v' in 'tool' names both 'verbose' and 'version'"]
        );
    }
}
