//! Streaming rewrite of the host's `ActPlugins` list.

use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

const ACT_PLUGINS: &[u8] = b"ActPlugins";
const PLUGIN: &[u8] = b"Plugin";

/// Document used when the host has never written its configuration.
pub const DEFAULT_DOCUMENT: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<Config>\n  <ActPlugins>\n  </ActPlugins>\n</Config>\n";

/// A plugin line in the host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    pub path: String,
    pub enabled: bool,
}

impl PluginEntry {
    pub fn new(path: impl Into<String>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
        }
    }

    fn matches(&self, other_path: &str) -> bool {
        self.path.trim().to_lowercase() == other_path.trim().to_lowercase()
    }
}

/// Add `plugins` to the first `ActPlugins` element of `document`.
///
/// Existing `Plugin` elements with the same `Path` (ignoring case) keep
/// their place and get the new `Enabled` value. Missing `ActPlugins` is
/// appended as the last child of the root element.
pub fn register_plugins(document: &str, plugins: &[PluginEntry]) -> Result<String> {
    let document = if document.trim().is_empty() {
        DEFAULT_DOCUMENT
    } else {
        document
    };
    let plugins = dedup(plugins);

    let mut reader = Reader::from_str(document);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut found = vec![false; plugins.len()];

    let mut depth = 0usize;
    let mut list_depth: Option<usize> = None;
    let mut done = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed XML at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(e) if !done && list_depth.is_none() && e.name().as_ref() == ACT_PLUGINS => {
                writer.write_event(Event::Start(e))?;
                list_depth = Some(depth);
                depth += 1;
            }
            Event::Empty(e) if !done && list_depth.is_none() && e.name().as_ref() == ACT_PLUGINS => {
                writer.write_event(Event::Start(e.to_owned()))?;
                write_plugins(&mut writer, &plugins, &found)?;
                writer.write_event(Event::End(e.to_end().into_owned()))?;
                done = true;
            }
            Event::Start(e) if list_depth.is_some() && e.name().as_ref() == PLUGIN => {
                let e = refresh_plugin(&e, &plugins, &mut found)?;
                writer.write_event(Event::Start(e))?;
                depth += 1;
            }
            Event::Empty(e) if list_depth.is_some() && e.name().as_ref() == PLUGIN => {
                let e = refresh_plugin(&e, &plugins, &mut found)?;
                writer.write_event(Event::Empty(e))?;
            }
            Event::Start(e) => {
                writer.write_event(Event::Start(e))?;
                depth += 1;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if list_depth == Some(depth) {
                    write_plugins(&mut writer, &plugins, &found)?;
                    list_depth = None;
                    done = true;
                } else if depth == 0 && !done {
                    write_list(&mut writer, &plugins)?;
                    done = true;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Empty(e) if depth == 0 && !done => {
                // A childless root such as `<Config/>`.
                writer.write_event(Event::Start(e.to_owned()))?;
                write_list(&mut writer, &plugins)?;
                writer.write_event(Event::End(e.to_end().into_owned()))?;
                done = true;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if !done {
        anyhow::bail!("Document has no root element");
    }

    String::from_utf8(writer.into_inner().into_inner()).context("Rewritten XML is not UTF-8")
}

/// Paths listed under the first `ActPlugins` element with their state.
pub fn list_plugins(document: &str) -> Result<Vec<PluginEntry>> {
    let mut reader = Reader::from_str(document);
    let mut inside = false;
    let mut entries = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == ACT_PLUGINS => inside = true,
            Event::End(e) if e.name().as_ref() == ACT_PLUGINS => break,
            Event::Start(e) | Event::Empty(e) if inside && e.name().as_ref() == PLUGIN => {
                let path = attribute(&e, b"Path")?.unwrap_or_default();
                let enabled = attribute(&e, b"Enabled")?
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                entries.push(PluginEntry { path, enabled });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn dedup(plugins: &[PluginEntry]) -> Vec<PluginEntry> {
    let mut out: Vec<PluginEntry> = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        match out.iter_mut().find(|p| p.matches(&plugin.path)) {
            Some(existing) => existing.enabled = plugin.enabled,
            None => out.push(plugin.clone()),
        }
    }
    out
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref().eq_ignore_ascii_case(name) {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Rewrite an existing `Plugin` element when one of `plugins` matches it.
fn refresh_plugin(
    e: &BytesStart<'_>,
    plugins: &[PluginEntry],
    found: &mut [bool],
) -> Result<BytesStart<'static>> {
    let path = attribute(e, b"Path")?.unwrap_or_default();
    let Some(index) = plugins.iter().position(|p| p.matches(&path)) else {
        return Ok(e.to_owned().into_owned());
    };
    found[index] = true;

    let enabled = bool_str(plugins[index].enabled);
    let mut out = BytesStart::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    let mut had_enabled = false;
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref().eq_ignore_ascii_case(b"Enabled") {
            out.push_attribute(("Enabled", enabled));
            had_enabled = true;
        } else {
            out.push_attribute(attr);
        }
    }
    if !had_enabled {
        out.push_attribute(("Enabled", enabled));
    }
    Ok(out)
}

fn plugin_element(plugin: &PluginEntry) -> BytesStart<'_> {
    BytesStart::new("Plugin").with_attributes([
        ("Enabled", bool_str(plugin.enabled)),
        ("Path", plugin.path.as_str()),
    ])
}

fn write_plugins<W: std::io::Write>(
    writer: &mut Writer<W>,
    plugins: &[PluginEntry],
    found: &[bool],
) -> Result<()> {
    for (plugin, _) in plugins.iter().zip(found).filter(|(_, seen)| !**seen) {
        writer.write_event(Event::Empty(plugin_element(plugin)))?;
    }
    Ok(())
}

fn write_list<W: std::io::Write>(writer: &mut Writer<W>, plugins: &[PluginEntry]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("ActPlugins")))?;
    write_plugins(writer, plugins, &vec![false; plugins.len()])?;
    writer.write_event(Event::End(BytesEnd::new("ActPlugins")))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
