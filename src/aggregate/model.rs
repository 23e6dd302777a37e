// src/aggregate/model.rs

use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use crate::fs::normalize;
use crate::transform::line_col;

/// One member of a group, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFile {
    pub path: PathBuf,
    pub minify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigGroup {
    /// Output file name as declared, relative to the config's directory.
    pub output_name: String,
    pub members: Vec<MemberFile>,
}

/// Parsed content of one config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    pub groups: Vec<ConfigGroup>,
}

impl ConfigDocument {
    /// Every member path across all groups, first occurrence order, without
    /// duplicates.
    pub fn member_paths(&self) -> Vec<PathBuf> {
        let mut seen = std::collections::HashSet::new();
        self.groups
            .iter()
            .flat_map(|g| g.members.iter())
            .filter(|m| seen.insert(crate::fs::PathKey::new(&m.path)))
            .map(|m| m.path.clone())
            .collect()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (line {line}, column {column})")]
pub struct ConfigParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ConfigParseError {
    fn at(text: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(text, offset);
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Resolve a member reference against the config's directory.
///
/// `~/x` and relative paths are joined to `config_dir`; absolute paths are
/// kept. The result is lexically normalised.
pub fn resolve_member(config_dir: &Path, reference: &str) -> PathBuf {
    let reference = reference.trim();
    let rooted = reference
        .strip_prefix("~/")
        .or_else(|| reference.strip_prefix("~\\"));
    match rooted {
        Some(rest) => normalize(&config_dir.join(rest)),
        None => normalize(&config_dir.join(reference)),
    }
}

fn is_element(name: &[u8], expected: &str) -> bool {
    name.eq_ignore_ascii_case(expected.as_bytes())
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        if !is_element(attr.key.as_ref(), name) {
            continue;
        }
        let raw = std::str::from_utf8(&attr.value).map_err(|err| err.to_string())?;
        let value = unescape(raw).map_err(|err| err.to_string())?;
        return Ok(Some(value.into_owned()));
    }
    Ok(None)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

struct OpenGroup {
    group: ConfigGroup,
    minify: bool,
}

fn open_group(e: &BytesStart<'_>) -> Result<OpenGroup, String> {
    let name = attribute(e, "Name")?
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| "FileGroup is missing its Name attribute".to_string())?;
    let minify = match attribute(e, "Minify")? {
        Some(v) => parse_bool(&v).ok_or_else(|| format!("invalid Minify value '{v}'"))?,
        None => false,
    };
    Ok(OpenGroup {
        group: ConfigGroup {
            output_name: name.trim().to_string(),
            members: Vec::new(),
        },
        minify,
    })
}

fn member(e: &BytesStart<'_>, group: &OpenGroup, config_dir: &Path) -> Result<MemberFile, String> {
    let path = attribute(e, "Path")?
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| "File is missing its Path attribute".to_string())?;
    let minify = match attribute(e, "Minify")? {
        Some(v) => parse_bool(&v).ok_or_else(|| format!("invalid Minify value '{v}'"))?,
        None => group.minify,
    };
    Ok(MemberFile {
        path: resolve_member(config_dir, &path),
        minify,
    })
}

/// Parse a config document.
///
/// `FileGroup` elements may appear anywhere below the root but may not
/// nest. `File` elements must sit inside a group, and a `File` without
/// `Minify` inherits the group's flag (default `false`).
pub fn parse_config(text: &str, config_dir: &Path) -> Result<ConfigDocument, ConfigParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut doc = ConfigDocument::default();
    let mut current: Option<OpenGroup> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let start = text
            .get(before..)
            .map(|rest| text.len() - rest.trim_start().len())
            .unwrap_or(before);

        let event = reader
            .read_event()
            .map_err(|e| ConfigParseError::at(text, reader.error_position() as usize, e.to_string()))?;
        let self_closing = matches!(event, Event::Empty(_));

        match event {
            Event::Start(e) | Event::Empty(e) if is_element(e.name().as_ref(), "FileGroup") => {
                if current.is_some() {
                    return Err(ConfigParseError::at(text, start, "FileGroup elements cannot be nested"));
                }
                let group = open_group(&e).map_err(|msg| ConfigParseError::at(text, start, msg))?;
                if self_closing {
                    doc.groups.push(group.group);
                } else {
                    current = Some(group);
                }
            }
            Event::Start(e) | Event::Empty(e) if is_element(e.name().as_ref(), "File") => {
                let Some(group) = current.as_mut() else {
                    return Err(ConfigParseError::at(text, start, "File element outside of a FileGroup"));
                };
                let file = member(&e, group, config_dir)
                    .map_err(|msg| ConfigParseError::at(text, start, msg))?;
                group.group.members.push(file);
            }
            Event::End(e) if is_element(e.name().as_ref(), "FileGroup") => {
                if let Some(group) = current.take() {
                    doc.groups.push(group.group);
                }
            }
            Event::Eof => {
                if current.is_some() {
                    return Err(ConfigParseError::at(text, text.len(), "unclosed FileGroup element"));
                }
                break;
            }
            _ => {}
        }
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_members_against_config_dir() {
        let dir = Path::new("/proj/assets");
        assert_eq!(resolve_member(dir, "a.css"), PathBuf::from("/proj/assets/a.css"));
        assert_eq!(resolve_member(dir, "~/css/b.css"), PathBuf::from("/proj/assets/css/b.css"));
        assert_eq!(resolve_member(dir, "../lib/c.js"), PathBuf::from("/proj/lib/c.js"));
        assert_eq!(resolve_member(dir, "/abs/d.js"), PathBuf::from("/abs/d.js"));
    }

    #[test]
    fn unescapes_attribute_values() {
        let doc = parse_config(
            r#"<root><FileGroup Name="a&amp;b.css"><File Path="x&amp;y.css"/></FileGroup></root>"#,
            Path::new("/p"),
        )
        .unwrap();
        assert_eq!(doc.groups[0].output_name, "a&b.css");
        assert_eq!(doc.groups[0].members[0].path, PathBuf::from("/p/x&y.css"));
    }
}
