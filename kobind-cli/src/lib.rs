use anyhow::{Context, Result};
use kobind_bind::{RenderOptions, Renderer};
use log::info;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load render options from a TOML file, or the defaults when none is given.
pub fn load_options(config: Option<&Path>) -> Result<RenderOptions> {
    let Some(path) = config else {
        return Ok(RenderOptions::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn load_data(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Render `template` against the JSON in `data` and return the markup.
pub fn render_file(template: &Path, data: Option<&Path>, options: RenderOptions) -> Result<String> {
    let src = fs::read_to_string(template)
        .with_context(|| format!("failed to read {}", template.display()))?;
    let data = data.map(load_data).transpose()?;
    Renderer::new(options)
        .render(&src, data.as_ref())
        .with_context(|| format!("failed to render {}", template.display()))
}

/// Render a template and write it to `out`, or stdout without one.
pub fn render_cmd(
    template: &Path,
    data: Option<&Path>,
    out: Option<&Path>,
    config: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let mut options = load_options(config)?;
    if strict {
        options = options.strict();
    }
    let html = render_file(template, data, options)?;
    match out {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => print!("{html}"),
    }
    Ok(())
}

/// Validate a template's markers and directives without binding it.
/// Returns the number of directives found.
pub fn check_cmd(template: &Path, config: Option<&Path>) -> Result<usize> {
    let options = load_options(config)?;
    let src = fs::read_to_string(template)
        .with_context(|| format!("failed to read {}", template.display()))?;
    Renderer::new(options)
        .check(&src)
        .with_context(|| format!("{} is not a valid template", template.display()))
}
