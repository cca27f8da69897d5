use anyhow::{Context, Result, bail};
use argot_grammar::Grammar;
use argot_schema::GrammarSchema;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST_NAME: &str = "argot.json";

#[derive(Debug)]
pub struct LoadedManifest {
    pub path: PathBuf,
    pub schema: GrammarSchema,
}

impl LoadedManifest {
    pub fn grammar(&self) -> Result<Grammar> {
        self.schema
            .to_grammar()
            .with_context(|| format!("invalid grammar in {}", self.path.display()))
    }
}

/// Load the grammar manifest, `argot.json` in the current directory unless a
/// path is given.
pub fn load_manifest(manifest_path: Option<&Path>) -> Result<LoadedManifest> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let (path, explicit) = match manifest_path {
        Some(p) => (resolve_against(&cwd, p), true),
        None => (cwd.join(DEFAULT_MANIFEST_NAME), false),
    };

    if !path.exists() {
        if explicit {
            bail!("manifest not found: {}", path.display());
        }
        bail!(
            "no {DEFAULT_MANIFEST_NAME} in {} (use --grammar to point at a manifest)",
            cwd.display()
        );
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let schema = GrammarSchema::from_json(&contents)
        .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded grammar manifest");

    Ok(LoadedManifest { path, schema })
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
