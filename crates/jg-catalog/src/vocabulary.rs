//! Service-document parser and the in-memory device vocabulary.
//!
//! The vocabulary file is a sequence of class blocks:
//!
//! ```text
//! Device Light:
//!     """
//!     Tags:
//!     #Light
//!     Enums:
//!       switch: on | off
//!     Values:
//!       switch_switch: ENUM switch  # current switch state
//!     Methods:
//!       switch_on() -> VOID  # turn the light on
//!     """
//! ```
//!
//! Text between blocks is ignored. Parsing is line-oriented and reports
//! 1-based line numbers on failure.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::error::{CatalogError, CatalogResult};
use crate::tags::TagDeviceMap;

/// Lines preceding the site-tag insertion point: `Device X:`, the opening
/// quotes, `Tags:` and the class tag itself.
pub const HEADER_LINES: usize = 4;

const DOC_QUOTES: &str = "\"\"\"";

/// Declared type of a readable device value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpec {
    /// Type keyword, e.g. `ENUM`, `DOUBLE`, `INTEGER`, `STRING`.
    pub ty: String,
    /// Enum this value ranges over, for `ENUM` values.
    pub enum_name: Option<String>,
}

/// One kind of controllable device and the members it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceClass {
    pub key: String,
    /// Full service-document block, from `Device` to the closing quotes.
    pub doc: String,
    /// Tags listed in the `Tags:` section, without the leading `#`.
    pub tags: Vec<String>,
    pub enums: BTreeMap<String, Vec<String>>,
    pub values: BTreeMap<String, ValueSpec>,
    /// Method name → full signature (`switch_on() -> VOID`).
    pub methods: BTreeMap<String, String>,
}

impl DeviceClass {
    /// Whether `name` is a method or a value of this class.
    pub fn has_member(&self, name: &str) -> bool {
        self.methods.contains_key(name) || self.values.contains_key(name)
    }

    /// Method and value names, methods first.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.methods
            .keys()
            .chain(self.values.keys())
            .map(String::as_str)
    }

    /// Allowed literals of an enum-typed value.
    pub fn enum_members(&self, value: &str) -> Option<&[String]> {
        let enum_name = self.values.get(value)?.enum_name.as_ref()?;
        self.enums.get(enum_name).map(Vec::as_slice)
    }

    /// Auxiliary tags present in the doc, i.e. every tag except the class tag.
    pub fn site_tags(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| **t != self.key)
            .map(String::as_str)
            .collect()
    }

    /// Copy of this class with `site_tags` written into the `Tags:` section.
    ///
    /// Tags already present are skipped, so annotating twice with the same
    /// set yields the same doc.
    pub fn annotate(&self, site_tags: &BTreeSet<String>) -> DeviceClass {
        let missing: Vec<&String> = site_tags
            .iter()
            .filter(|t| !self.tags.contains(t))
            .collect();
        if missing.is_empty() {
            return self.clone();
        }

        let mut lines: Vec<String> = self.doc.lines().map(String::from).collect();
        let at = HEADER_LINES.min(lines.len());
        lines.splice(at..at, missing.iter().map(|t| format!("    #{t}")));

        let mut tags = self.tags.clone();
        tags.extend(missing.into_iter().cloned());

        DeviceClass {
            doc: lines.join("\n"),
            tags,
            ..self.clone()
        }
    }

    /// Header and metadata of the doc up to (not including) the `Enums:`
    /// line, trimmed. `None` when the doc has no `Enums:` section.
    pub fn metadata_block(&self) -> Option<String> {
        let lines: Vec<&str> = self.doc.lines().collect();
        let end = lines.iter().position(|l| l.trim() == "Enums:")?;
        Some(lines[..end].join("\n").trim().to_string())
    }
}

/// The authoritative set of device classes, in file order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    classes: Vec<DeviceClass>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary, rejecting duplicate keys.
    pub fn new(classes: Vec<DeviceClass>) -> CatalogResult<Self> {
        let mut index = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            if index.insert(class.key.clone(), i).is_some() {
                return Err(CatalogError::DuplicateClass(class.key.clone()));
            }
        }
        Ok(Self { classes, index })
    }

    /// Load and parse a service-document file.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
        let vocabulary = parse_service_list(&text)?;
        tracing::info!(
            path = %path.display(),
            classes = vocabulary.len(),
            "device vocabulary loaded"
        );
        Ok(vocabulary)
    }

    /// Fail unless every key in `keys` is a known class.
    pub fn require<S: AsRef<str>>(&self, keys: &[S]) -> CatalogResult<()> {
        for key in keys {
            if !self.contains(key.as_ref()) {
                return Err(CatalogError::MissingClass(key.as_ref().to_string()));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&DeviceClass> {
        self.index.get(key).map(|&i| &self.classes[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Position of `key` in file order (used for stable tie-breaking).
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceClass> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Per-request copy with site tags written into the affected class docs.
    /// `self` is left untouched.
    pub fn annotated(&self, tag_device: &TagDeviceMap) -> Vocabulary {
        let classes = self
            .classes
            .iter()
            .map(|class| match tag_device.get(&class.key) {
                Some(site_tags) if !site_tags.is_empty() => class.annotate(site_tags),
                _ => class.clone(),
            })
            .collect();
        Self {
            classes,
            index: self.index.clone(),
        }
    }
}

/// Parse a whole service-document file into a vocabulary.
pub fn parse_service_list(text: &str) -> CatalogResult<Vocabulary> {
    let mut parser = DocParser {
        lines: text.lines().collect(),
        pos: 0,
    };
    let mut classes = Vec::new();
    while let Some(class) = parser.next_class()? {
        classes.push(class);
    }
    Vocabulary::new(classes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Tags,
    Enums,
    Values,
    Methods,
    Other,
}

impl Section {
    /// Recognize a `Word:` section header line.
    fn from_header(trimmed: &str) -> Option<Self> {
        let name = trimmed.strip_suffix(':')?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(match name {
            "Tags" => Section::Tags,
            "Enums" => Section::Enums,
            "Values" => Section::Values,
            "Methods" => Section::Methods,
            _ => Section::Other,
        })
    }
}

struct DocParser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> DocParser<'a> {
    fn error(line_index: usize, message: impl Into<String>) -> CatalogError {
        CatalogError::Parse {
            line: line_index + 1,
            message: message.into(),
        }
    }

    /// Parse the next `Device` block, skipping any text before it.
    fn next_class(&mut self) -> CatalogResult<Option<DeviceClass>> {
        while self.pos < self.lines.len() && !self.lines[self.pos].trim().starts_with("Device ") {
            self.pos += 1;
        }
        if self.pos >= self.lines.len() {
            return Ok(None);
        }

        let start = self.pos;
        let key = parse_device_header(self.lines[start].trim())
            .ok_or_else(|| Self::error(start, "expected `Device <Name>:`"))?;

        let open = start + 1;
        if self.lines.get(open).map(|l| l.trim()) != Some(DOC_QUOTES) {
            return Err(Self::error(open, format!("expected opening {DOC_QUOTES} for {key}")));
        }

        let close = (open + 1..self.lines.len())
            .find(|&i| self.lines[i].trim() == DOC_QUOTES)
            .ok_or_else(|| Self::error(start, format!("unterminated doc block for {key}")))?;
        self.pos = close + 1;

        let mut class = DeviceClass {
            key: key.to_string(),
            doc: self.lines[start..=close].join("\n"),
            tags: Vec::new(),
            enums: BTreeMap::new(),
            values: BTreeMap::new(),
            methods: BTreeMap::new(),
        };

        let mut section = Section::Preamble;
        for i in open + 1..close {
            let trimmed = self.lines[i].trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(next) = Section::from_header(trimmed) {
                section = next;
                continue;
            }
            match section {
                Section::Tags => {
                    let tag = trimmed
                        .strip_prefix('#')
                        .ok_or_else(|| Self::error(i, "tag line must start with '#'"))?;
                    class.tags.push(tag.trim().to_string());
                }
                Section::Enums => {
                    let (name, members) = parse_enum_line(trimmed)
                        .ok_or_else(|| Self::error(i, "expected `name: a | b`"))?;
                    class.enums.insert(name, members);
                }
                Section::Values => {
                    let (name, spec) = parse_value_line(trimmed)
                        .ok_or_else(|| Self::error(i, "expected `name: TYPE`"))?;
                    class.values.insert(name, spec);
                }
                Section::Methods => {
                    let (name, signature) = parse_method_line(trimmed)
                        .ok_or_else(|| Self::error(i, "expected `name(params) -> TYPE`"))?;
                    class.methods.insert(name, signature);
                }
                Section::Preamble | Section::Other => {}
            }
        }

        Ok(Some(class))
    }
}

fn parse_device_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("Device")?.trim_start();
    let key = rest.strip_suffix(':')?.trim_end();
    (!key.is_empty() && key.chars().all(is_ident_char)).then_some(key)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Drop a trailing `# comment` (a `#` preceded by whitespace).
fn strip_doc_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return line[..i].trim_end();
        }
    }
    line.trim_end()
}

fn parse_enum_line(line: &str) -> Option<(String, Vec<String>)> {
    let (name, members) = strip_doc_comment(line).split_once(':')?;
    let name = name.trim();
    let members: Vec<String> = members
        .split('|')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect();
    (!name.is_empty() && !members.is_empty()).then(|| (name.to_string(), members))
}

fn parse_value_line(line: &str) -> Option<(String, ValueSpec)> {
    let (name, ty) = strip_doc_comment(line).split_once(':')?;
    let name = name.trim();
    let mut words = ty.split_whitespace();
    let ty = words.next()?.to_string();
    let enum_name = words.next().map(String::from);
    (!name.is_empty() && name.chars().all(is_ident_char))
        .then(|| (name.to_string(), ValueSpec { ty, enum_name }))
}

fn parse_method_line(line: &str) -> Option<(String, String)> {
    let signature = strip_doc_comment(line);
    let name = signature[..signature.find('(')?].trim();
    (!name.is_empty() && name.chars().all(is_ident_char))
        .then(|| (name.to_string(), signature.to_string()))
}
