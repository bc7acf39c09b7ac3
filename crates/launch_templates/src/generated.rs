//! The set of files launchkit generates in a project directory.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use launch_env::ResolvedConfig;

use crate::error::TemplateResult;
use crate::renderer::{ConfigRenderer, RenderContext, DEFAULT_WRANGLER_TEMPLATE};
use crate::writer::GeneratedFile;

pub const GENERATED_ENV_FILE: &str = ".env.generated";
pub const SECRETS_FILE: &str = ".dev.vars";
pub const WRANGLER_FILE: &str = "wrangler.toml";
pub const WRANGLER_TEMPLATE_FILE: &str = "wrangler.toml.template";

/// Generated environment file and Worker secrets file.
pub fn env_files(config: &ResolvedConfig) -> Vec<GeneratedFile> {
    vec![
        GeneratedFile::new(GENERATED_ENV_FILE, config.generated_env_file()),
        GeneratedFile::new(SECRETS_FILE, config.secrets_file()),
    ]
}

/// Load the project's `wrangler.toml.template`, falling back to the built-in one.
pub fn load_wrangler_template(project_dir: &Path) -> TemplateResult<String> {
    let path = project_dir.join(WRANGLER_TEMPLATE_FILE);
    match fs::read_to_string(&path) {
        Ok(content) => {
            debug!("Using project template {:?}", path);
            Ok(content)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No project template, using built-in wrangler.toml template");
            Ok(DEFAULT_WRANGLER_TEMPLATE.to_string())
        }
        Err(e) => Err(e.into()),
    }
}

/// Render `wrangler.toml` for the project.
pub fn wrangler_file(
    project_dir: &Path,
    config: &ResolvedConfig,
    context: Option<&RenderContext>,
) -> TemplateResult<GeneratedFile> {
    let template = load_wrangler_template(project_dir)?;
    let content = ConfigRenderer::new().render(&template, config, context)?;
    Ok(GeneratedFile::new(WRANGLER_FILE, content))
}
