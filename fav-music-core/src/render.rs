//! Renders the widget HTML from a Jinja-style template.

use minijinja::{context, AutoEscape, Environment, UndefinedBehavior};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::cache::TrackRecord;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Renders `template` with `{ tracks }`. Unknown variables are errors and
/// values are inserted unescaped, since records carry icon markup.
pub fn render_widget(template: &str, tracks: &[&TrackRecord]) -> Result<String, RenderError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_template("widget", template)?;
    let html = env.get_template("widget")?.render(context! { tracks })?;
    Ok(html)
}

/// Reads the template file, renders it and overwrites the widget file.
pub fn write_widget(
    template_path: &Path,
    widget_path: &Path,
    tracks: &[&TrackRecord],
) -> Result<(), RenderError> {
    info!(template = %template_path.display(), "[RENDER] Generating HTML");
    let template = std::fs::read_to_string(template_path).map_err(|source| {
        error!(error = ?source, path = %template_path.display(), "[RENDER] Cannot read template");
        RenderError::Io {
            path: template_path.to_path_buf(),
            source,
        }
    })?;
    let html = render_widget(&template, tracks)?;
    std::fs::write(widget_path, html).map_err(|source| RenderError::Io {
        path: widget_path.to_path_buf(),
        source,
    })?;
    info!(path = %widget_path.display(), tracks = tracks.len(), "[RENDER] Widget written");
    Ok(())
}
