//! Alias prefix handling.
//!
//! Aliases may be declared and queried with or without a prefix, so every
//! comparison goes through [`strip_prefix`] first.

/// Prefixes recognized when no other set is configured.
pub const DEFAULT_PREFIXES: [&str; 3] = ["--", "-", "/"];

/// Strip one leading prefix from `alias`.
///
/// The longest matching prefix wins, so `--verbose` becomes `verbose` rather
/// than `-verbose`. A bare prefix (`-`, `/`) is returned unchanged.
pub fn strip_prefix<'a, P: AsRef<str>>(alias: &'a str, prefixes: &[P]) -> &'a str {
    prefixes
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty() && alias.len() > p.len() && alias.starts_with(*p))
        .max_by_key(|p| p.len())
        .map_or(alias, |p| &alias[p.len()..])
}

/// Whether `token` begins with one of `prefixes` (and has text after it).
pub fn is_prefixed<P: AsRef<str>>(token: &str, prefixes: &[P]) -> bool {
    strip_prefix(token, prefixes).len() != token.len()
}

/// Compare two aliases ignoring their prefixes. Case-sensitive.
pub fn aliases_match<P: AsRef<str>>(a: &str, b: &str, prefixes: &[P]) -> bool {
    strip_prefix(a, prefixes) == strip_prefix(b, prefixes)
}
