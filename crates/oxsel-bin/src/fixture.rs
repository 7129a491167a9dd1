//! Canned language-server answers for scripted runs.
//!
//! A fixture is a TOML file of `[[location]]` tables:
//!
//! ```toml
//! [[location]]
//! query = "diagnostics"      # or definitions, declarations, implementations,
//!                            # references, references+declaration, type-definitions
//! path = "src/lib.rs"
//! start = [0, 3]             # line, byte column
//! end = [0, 4]
//! severity = "warning"       # optional
//! message = "unused"         # optional
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use core_lsp::{GotoKind, Location, QueryFamily, ScriptedLspClient, Severity};
use core_text::Position;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default, rename = "location")]
    locations: Vec<FixtureLocation>,
}

#[derive(Debug, Deserialize)]
struct FixtureLocation {
    query: String,
    path: PathBuf,
    start: (usize, usize),
    end: (usize, usize),
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn family_named(name: &str) -> Result<QueryFamily> {
    Ok(match name {
        "diagnostics" => QueryFamily::Diagnostics,
        "definitions" => QueryFamily::Goto(GotoKind::Definitions),
        "declarations" => QueryFamily::Goto(GotoKind::Declarations),
        "implementations" => QueryFamily::Goto(GotoKind::Implementations),
        "references" => QueryFamily::Goto(GotoKind::References),
        "references+declaration" => QueryFamily::Goto(GotoKind::ReferencesIncludingDeclaration),
        "type-definitions" => QueryFamily::Goto(GotoKind::TypeDefinitions),
        other => bail!("unknown query `{other}`"),
    })
}

fn severity_named(name: &str) -> Result<Severity> {
    Ok(match name {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "information" | "info" => Severity::Information,
        "hint" => Severity::Hint,
        other => bail!("unknown severity `{other}`"),
    })
}

impl FixtureLocation {
    fn into_location(self) -> Result<(QueryFamily, Location)> {
        let family = family_named(&self.query)?;
        let mut location = Location::new(
            self.path,
            Position::new(self.start.0, self.start.1),
            Position::new(self.end.0, self.end.1),
        );
        location.severity = self.severity.as_deref().map(severity_named).transpose()?;
        location.message = self.message;
        Ok((family, location))
    }
}

/// Parse fixture text into a client that answers every listed query family.
pub fn client_from_str(content: &str) -> Result<ScriptedLspClient> {
    let file: FixtureFile = toml::from_str(content)?;
    let mut grouped: BTreeMap<String, (QueryFamily, Vec<Location>)> = BTreeMap::new();
    for entry in file.locations {
        let key = entry.query.clone();
        let (family, location) = entry.into_location()?;
        grouped.entry(key).or_insert_with(|| (family, Vec::new())).1.push(location);
    }
    let client = ScriptedLspClient::new();
    for (family, locations) in grouped.into_values() {
        client.answer(family, locations);
    }
    Ok(client)
}

pub fn load(path: &Path) -> Result<ScriptedLspClient> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading lsp fixture {}", path.display()))?;
    let client = client_from_str(&content)
        .with_context(|| format!("parsing lsp fixture {}", path.display()))?;
    tracing::info!(target: "runtime.startup", path = %path.display(), requests = client.requests().len(), "lsp_fixture_loaded");
    Ok(client)
}
