#![deny(unsafe_code)]

//! Localized message texts keyed by rule id.
//!
//! Any XML element carrying an `id` attribute contributes its text content.
//! Elements tagged with another `xml:lang` are skipped and the first
//! definition of an id wins.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::StandardsError;
use crate::hash::list_files;

const MESSAGE_PREFIX: &str = "message:";

#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    lang: String,
    messages: HashMap<String, String>,
}

struct PendingEntry {
    id: String,
    depth: usize,
    text: String,
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl MessageCatalog {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into().to_lowercase(),
            messages: HashMap::new(),
        }
    }

    /// Scans every `.xml` file under `roots`. Files that fail to parse are
    /// skipped with a warning; missing roots are ignored.
    pub fn load_roots(lang: &str, roots: &[PathBuf]) -> Result<Self, StandardsError> {
        let mut catalog = Self::new(lang);
        for root in roots {
            if !root.is_dir() {
                tracing::debug!(root = %root.display(), "catalog root missing, skipped");
                continue;
            }
            for path in list_files(root)? {
                let is_xml = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
                if !is_xml {
                    continue;
                }
                let text =
                    std::fs::read_to_string(&path).map_err(|e| StandardsError::io(&path, e))?;
                if let Err(err) = catalog.add_xml(&text, &path) {
                    tracing::warn!(error = %err, "skipping unreadable message resource");
                }
            }
        }
        tracing::info!(ids = catalog.len(), lang = %catalog.lang, "message catalog loaded");
        Ok(catalog)
    }

    fn lang_matches(&self, lang: Option<&str>) -> bool {
        let Some(lang) = lang.map(str::to_lowercase).filter(|l| !l.is_empty()) else {
            return true;
        };
        if self.lang.is_empty() {
            return true;
        }
        let primary = self.lang.split('-').next().unwrap_or(&self.lang);
        lang == self.lang || lang == primary
    }

    /// Adds the entries of one XML document. Returns how many ids were new.
    pub fn add_xml(&mut self, xml: &str, path: &Path) -> Result<usize, StandardsError> {
        let before = self.messages.len();
        let mut reader = Reader::from_str(xml);
        let mut depth = 0usize;
        let mut pending: Vec<PendingEntry> = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) => {
                    depth += 1;
                    if let Some(id) = attribute(&element, b"id").filter(|id| !id.is_empty())
                        && self.lang_matches(attribute(&element, b"xml:lang").as_deref())
                    {
                        pending.push(PendingEntry {
                            id,
                            depth,
                            text: String::new(),
                        });
                    }
                }
                Ok(Event::End(_)) => {
                    if pending.last().is_some_and(|entry| entry.depth == depth)
                        && let Some(entry) = pending.pop()
                    {
                        let text = collapse_whitespace(&entry.text);
                        if !text.is_empty() {
                            self.messages.entry(entry.id).or_insert(text);
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Text(text)) => {
                    let text = String::from_utf8_lossy(&text);
                    for entry in &mut pending {
                        entry.text.push_str(&text);
                    }
                }
                Ok(Event::CData(data)) => {
                    let text = String::from_utf8_lossy(&data);
                    for entry in &mut pending {
                        entry.text.push_str(&text);
                    }
                }
                Ok(Event::GeneralRef(reference)) => {
                    let name = String::from_utf8_lossy(&reference);
                    if let Some(ch) = resolve_entity(&name) {
                        for entry in &mut pending {
                            entry.text.push(ch);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => return Err(StandardsError::xml(path, err)),
            }
        }
        Ok(self.messages.len() - before)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.messages.get(id).map(String::as_str)
    }

    /// Resolves a `message:<id>` code, substituting `{name}` placeholders.
    pub fn resolve(&self, code: &str, params: &BTreeMap<String, String>) -> Option<String> {
        let id = code.trim().strip_prefix(MESSAGE_PREFIX)?;
        let template = self.get(id)?;
        Some(substitute(template, params))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }
}

/// Replaces `{name}` with `params[name]`; unknown placeholders stay as-is.
fn substitute(template: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
