//! Help rendering.
//!
//! Reads a frozen command and writes a usage block to a [`HelpSink`]. Only
//! symbols with help text are listed. Descriptions are word-wrapped to the
//! sink's width and aligned in one column across all sections.

use crate::definition::Arity;
use crate::grammar::SymbolRef;

/// Width used when a sink reports 0.
pub const DEFAULT_WIDTH: usize = 80;

const INDENT: usize = 2;
const GUTTER: usize = 2;
/// Narrower description columns move descriptions to their own lines.
const MIN_DESCRIPTION_WIDTH: usize = 10;

/// Line-oriented output target.
pub trait HelpSink {
    /// Usable columns. 0 means unknown.
    fn width(&self) -> usize;
    fn write_line(&mut self, line: &str);
}

/// Collects rendered lines in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSink {
    width: usize,
    text: String,
}

impl TextSink {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            text: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl HelpSink for TextSink {
    fn width(&self) -> usize {
        self.width
    }

    fn write_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }
}

/// Collapse whitespace runs and pack words into lines of at most `width`
/// characters. Words longer than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(width).peekable();
            while let Some(chunk) = chunks.next() {
                let piece: String = chunk.iter().collect();
                if chunks.peek().is_some() {
                    lines.push(piece);
                } else {
                    current_len = chunk.len();
                    current = piece;
                }
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct Row {
    invocation: String,
    description: String,
}

struct Section {
    title: &'static str,
    rows: Vec<Row>,
}

/// Render help for `command` into `sink`.
pub fn render(command: SymbolRef<'_>, sink: &mut impl HelpSink) {
    let width = match sink.width() {
        0 => DEFAULT_WIDTH,
        w => w,
    };

    sink.write_line("Usage:");
    for line in wrap(&usage(command), width.saturating_sub(INDENT)) {
        sink.write_line(&format!("{:INDENT$}{line}", ""));
    }

    if let Some(description) = command.help().filter(|h| !h.trim().is_empty()) {
        sink.write_line("");
        for line in wrap(description, width) {
            sink.write_line(&line);
        }
    }

    let sections = sections(command);
    let widest = sections
        .iter()
        .flat_map(|s| &s.rows)
        .map(|r| r.invocation.chars().count())
        .max()
        .unwrap_or(0);

    for section in &sections {
        sink.write_line("");
        sink.write_line(&format!("{}:", section.title));
        for row in &section.rows {
            write_row(sink, row, widest, width);
        }
    }
}

/// Render help for `command` into a string.
pub fn render_to_string(command: SymbolRef<'_>, width: usize) -> String {
    let mut sink = TextSink::new(width);
    render(command, &mut sink);
    sink.into_text()
}

fn write_row(sink: &mut impl HelpSink, row: &Row, widest: usize, width: usize) {
    let column = INDENT + widest + GUTTER;
    let available = width.saturating_sub(column);

    if available < MIN_DESCRIPTION_WIDTH {
        for line in wrap(&row.invocation, width.saturating_sub(INDENT)) {
            sink.write_line(&format!("{:INDENT$}{line}", ""));
        }
        let nested = INDENT * 2;
        for line in wrap(&row.description, width.saturating_sub(nested)) {
            sink.write_line(&format!("{:nested$}{line}", ""));
        }
        return;
    }

    let mut lines = wrap(&row.description, available).into_iter();
    let first = lines.next().unwrap_or_default();
    let pad = widest - row.invocation.chars().count() + GUTTER;
    sink.write_line(&format!("{:INDENT$}{}{:pad$}{first}", "", row.invocation, ""));
    for line in lines {
        sink.write_line(&format!("{:column$}{line}", ""));
    }
}

fn usage(command: SymbolRef<'_>) -> String {
    let mut chain: Vec<&str> = command.ancestors().map(|s| s.name()).collect();
    chain.reverse();
    chain.push(command.name());
    let mut parts: Vec<String> = chain.into_iter().map(str::to_string).collect();

    if command.options().next().is_some() {
        parts.push("[options]".to_string());
    }
    if let Some(placeholder) = placeholder(command) {
        if command.arity().min() == 0 {
            parts.push(format!("[{placeholder}]"));
        } else {
            parts.push(placeholder);
        }
    }
    if command.commands().next().is_some() {
        parts.push("[command]".to_string());
    }
    if !command.treat_unmatched_tokens_as_errors() {
        parts.push("[[--] <additional arguments>...]".to_string());
    }
    parts.join(" ")
}

// `<NAME>` for a symbol that takes values, `<NAME>...` for several.
fn placeholder(symbol: SymbolRef<'_>) -> Option<String> {
    let arity = symbol.arity();
    if arity == Arity::None {
        return None;
    }
    let name = symbol
        .argument()
        .and_then(|a| a.help())
        .map(|h| h.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or("value");
    let dots = if arity.is_multiple() { "..." } else { "" };
    Some(format!("<{name}>{dots}"))
}

fn sections(command: SymbolRef<'_>) -> Vec<Section> {
    let mut sections = Vec::new();

    let argument_help = command
        .argument()
        .filter(|a| a.arity() != Arity::None)
        .and_then(|a| a.help())
        .filter(|h| !h.name.trim().is_empty() && !h.description.trim().is_empty());
    if let (Some(help), Some(invocation)) = (argument_help, placeholder(command)) {
        sections.push(Section {
            title: "Arguments",
            rows: vec![Row {
                invocation,
                description: help.description.clone(),
            }],
        });
    }

    let options: Vec<Row> = command
        .options()
        .filter(|o| o.has_help())
        .map(|o| {
            let mut invocation = o.raw_aliases().join(", ");
            if let Some(placeholder) = placeholder(o) {
                invocation.push(' ');
                invocation.push_str(&placeholder);
            }
            Row {
                invocation,
                description: o.help().unwrap_or_default().to_string(),
            }
        })
        .collect();
    if !options.is_empty() {
        sections.push(Section {
            title: "Options",
            rows: options,
        });
    }

    let commands: Vec<Row> = command
        .commands()
        .filter(|c| c.has_help())
        .map(|c| Row {
            invocation: c.raw_aliases().join(", "),
            description: c.help().unwrap_or_default().to_string(),
        })
        .collect();
    if !commands.is_empty() {
        sections.push(Section {
            title: "Commands",
            rows: commands,
        });
    }

    sections
}
