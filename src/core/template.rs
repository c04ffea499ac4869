//! Seed text for `new`: a per-unit LDIF template with `{name}` placeholders.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

const PLACEHOLDER: &str = "{name}";

/// Where a template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource
{
    /// Given with `--template`; it has to exist.
    Explicit(PathBuf),
    /// `<templates_dir>/<unit>.ldif`; may be missing.
    Unit(PathBuf),
    /// No unit and no template.
    None,
}

impl TemplateSource
{
    pub fn pick(
        explicit: Option<&Path>,
        templates_dir: &Path,
        unit: Option<&str>,
    ) -> Self
    {
        match (explicit, unit)
        {
            (Some(path), _) => TemplateSource::Explicit(path.to_path_buf()),
            (None, Some(unit)) => TemplateSource::Unit(templates_dir.join(format!("{unit}.ldif"))),
            (None, None) => TemplateSource::None,
        }
    }

    /// Read the template and fill in `entity`. Without an entity the
    /// placeholder is left for the operator to replace.
    pub fn load(
        &self,
        entity: Option<&str>,
    ) -> Result<String>
    {
        let text = match self
        {
            TemplateSource::Explicit(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {}", path.display()))?,
            TemplateSource::Unit(path) if path.is_file() => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {}", path.display()))?,
            TemplateSource::Unit(path) =>
            {
                debug!(path = %path.display(), "no template");
                return Ok(format!("# Template {} not found, create from scratch\n", path.display()));
            }
            TemplateSource::None => return Ok("# No template, create from scratch\n".to_string()),
        };

        Ok(match entity
        {
            Some(name) => text.replace(PLACEHOLDER, name),
            None => text,
        })
    }
}
