// src/settings/validate.rs

use std::collections::HashSet;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::engine::registry::ENGINE_NAMES;
use crate::errors::{CascadeError, Result};
use crate::settings::model::{RawSettings, Settings};

impl TryFrom<RawSettings> for Settings {
    type Error = CascadeError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_raw_settings(&raw)?;
        let ignore = compile_globs(&raw.pipeline.ignore)?;
        let triggers = compile_globs(&raw.template.triggers)?;
        Ok(Settings::new_unchecked(raw, ignore, triggers))
    }
}

fn validate_raw_settings(raw: &RawSettings) -> Result<()> {
    validate_engine_order(raw)?;
    validate_suffixes(raw)?;
    validate_lint(raw)?;
    validate_template(raw)?;
    Ok(())
}

fn validate_engine_order(raw: &RawSettings) -> Result<()> {
    let mut seen = HashSet::new();
    for name in raw.pipeline.engine_order.iter() {
        if !ENGINE_NAMES.contains(&name.as_str()) {
            return Err(CascadeError::SettingsError(format!(
                "[pipeline].engine_order contains unknown engine '{}' (known: {})",
                name,
                ENGINE_NAMES.join(", ")
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(CascadeError::SettingsError(format!(
                "[pipeline].engine_order lists engine '{}' more than once",
                name
            )));
        }
    }
    Ok(())
}

fn check_suffix(field: &str, value: &str) -> Result<()> {
    if value.len() < 2 || !value.starts_with('.') {
        return Err(CascadeError::SettingsError(format!(
            "{field} entry '{value}' must start with '.' and name an extension"
        )));
    }
    Ok(())
}

fn check_rule(section: &str, suffixes: &[&String], output: Option<&str>) -> Result<()> {
    for suffix in suffixes.iter() {
        check_suffix(&format!("[{section}]"), suffix)?;
    }
    if let Some(output) = output {
        check_suffix(&format!("[{section}].output"), output)?;
        if suffixes.iter().any(|s| s.eq_ignore_ascii_case(output)) {
            return Err(CascadeError::SettingsError(format!(
                "[{section}] lists its own output '{output}' as an input suffix"
            )));
        }
    }
    Ok(())
}

fn validate_suffixes(raw: &RawSettings) -> Result<()> {
    check_suffix("[aggregate].suffix", &raw.aggregate.suffix)?;

    let style: Vec<&String> = raw.style.suffixes.iter().collect();
    check_rule("style", &style, Some(raw.style.output.as_str()))?;
    for ext in raw.style.source_extensions.iter() {
        check_suffix("[style].source_extensions", ext)?;
    }

    let css: Vec<&String> = raw.css.suffixes.iter().collect();
    check_rule("css", &css, Some(raw.css.output.as_str()))?;

    let js: Vec<&String> = raw
        .js
        .suffixes
        .iter()
        .chain(raw.js.simple_suffixes.iter())
        .chain(raw.js.whitespace_suffixes.iter())
        .collect();
    check_rule("js", &js, Some(raw.js.output.as_str()))?;

    Ok(())
}

fn validate_lint(raw: &RawSettings) -> Result<()> {
    if raw.lint.priority == 0 {
        return Err(CascadeError::SettingsError(
            "[lint].priority must be >= 1 (got 0)".to_string(),
        ));
    }
    let lint: Vec<&String> = raw
        .lint
        .js_suffixes
        .iter()
        .chain(raw.lint.css_suffixes.iter())
        .collect();
    check_rule("lint", &lint, None)
}

fn validate_template(raw: &RawSettings) -> Result<()> {
    let t = &raw.template;
    if t.debounce_ms == 0 {
        return Err(CascadeError::SettingsError(
            "[template].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if t.enabled {
        if t.command.trim().is_empty() {
            return Err(CascadeError::SettingsError(
                "[template] is enabled but has no command".to_string(),
            ));
        }
        if t.triggers.is_empty() {
            return Err(CascadeError::SettingsError(
                "[template] is enabled but has no triggers".to_string(),
            ));
        }
    }
    Ok(())
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter() {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
