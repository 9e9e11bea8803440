//! The action catalog: named actions with typed parameter slots, backed by
//! `functions_config.xml`.
//!
//! Loading fails soft — a missing or malformed file yields an empty catalog so
//! the panel still opens with no actions. Saving rewrites the whole document
//! atomically.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::persist::{atomic_write, xml_writer};

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Xml(quick_xml::Error),
    Parse(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "I/O error: {e}"),
            CatalogError::Xml(e) => write!(f, "XML error: {e}"),
            CatalogError::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl From<quick_xml::Error> for CatalogError {
    fn from(e: quick_xml::Error) -> Self {
        CatalogError::Xml(e)
    }
}

// ── Data model ──────────────────────────────────────────────────────

/// Rendering hint for one parameter slot. Everything except `Dropdown`
/// renders as a plain text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    None,
    Bool,
    String,
    Integer,
    EffectorSelection,
    Dropdown,
}

impl InputKind {
    /// The `type` attribute value as stored in the catalog file.
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::None => "None",
            InputKind::Bool => "Bool",
            InputKind::String => "String",
            InputKind::Integer => "Integer",
            InputKind::EffectorSelection => "EffectorSelectionObjectType",
            InputKind::Dropdown => "Dropdown",
        }
    }

    /// Parse a stored `type` attribute. Unknown values degrade to `String`,
    /// which renders as a plain text field anyway.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "None" => InputKind::None,
            "Bool" => InputKind::Bool,
            "Integer" => InputKind::Integer,
            "EffectorSelectionObjectType" => InputKind::EffectorSelection,
            "Dropdown" => InputKind::Dropdown,
            _ => InputKind::String,
        }
    }
}

/// One parameter slot of an action definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSlot {
    pub kind: InputKind,
    pub default_value: String,
    /// Comma-separated option list; meaningful only for `Dropdown`.
    pub options: String,
}

impl InputSlot {
    pub fn new(kind: InputKind, default_value: &str, options: &str) -> Self {
        Self {
            kind,
            default_value: default_value.to_string(),
            options: options.to_string(),
        }
    }

    /// Split `options` on commas, trimming whitespace and dropping empty
    /// items. Order is preserved; duplicates are kept.
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One entry in the action catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    /// Key used to look up the executable handler in the registry.
    /// Independent of `name`, so actions can be relabeled freely.
    pub definition_key: String,
    pub description: String,
    pub inputs: Vec<InputSlot>,
}

impl ActionDefinition {
    pub fn new(name: &str, definition_key: &str) -> Self {
        Self {
            name: name.to_string(),
            definition_key: definition_key.to_string(),
            description: String::new(),
            inputs: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_input(mut self, slot: InputSlot) -> Self {
        self.inputs.push(slot);
        self
    }
}

/// The loaded catalog. Read once at panel construction; the running panel
/// never hot-reloads it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    defs: Vec<ActionDefinition>,
}

impl Catalog {
    pub fn from_defs(defs: Vec<ActionDefinition>) -> Self {
        Self { defs }
    }

    /// Load the catalog, failing soft: a missing file is an empty catalog,
    /// and a malformed file is logged and treated as empty.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match load_catalog_file(path) {
            Ok(defs) => Self { defs },
            Err(e) => {
                eprintln!("[Stackdeck] failed to load catalog {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn defs(&self) -> &[ActionDefinition] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&ActionDefinition> {
        self.defs.get(position)
    }

    /// Look up a definition by display name. Names are not enforced unique;
    /// the last-loaded entry wins on duplicates.
    pub fn find(&self, name: &str) -> Option<(usize, &ActionDefinition)> {
        self.defs
            .iter()
            .enumerate()
            .rev()
            .find(|(_, d)| d.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.defs.iter().map(|d| d.name.clone()).collect()
    }
}

// ── Load ────────────────────────────────────────────────────────────

/// Which child element of `<Function>` text events currently belong to.
enum TextTarget {
    Ignore,
    Definition,
    Description,
}

fn load_catalog_file(path: &Path) -> Result<Vec<ActionDefinition>, CatalogError> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(64 * 1024, file);
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::with_capacity(4096);
    let mut defs: Vec<ActionDefinition> = Vec::new();
    let mut current: Option<ActionDefinition> = None;
    let mut target = TextTarget::Ignore;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "Function" => {
                        // Missing name attribute is kept as an empty string,
                        // not filtered out.
                        let mut def = ActionDefinition::new("", "");
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"name" {
                                def.name = String::from_utf8_lossy(&attr.value).to_string();
                            }
                        }
                        current = Some(def);
                    }
                    "Definition" => target = TextTarget::Definition,
                    "Description" => target = TextTarget::Description,
                    "Input" => {
                        if let Some(ref mut def) = current {
                            def.inputs.push(read_input_slot(e));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "Input" {
                    if let Some(ref mut def) = current {
                        def.inputs.push(read_input_slot(e));
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(ref mut def) = current {
                    let text = e.unescape()?.to_string();
                    match target {
                        TextTarget::Definition => def.definition_key = text,
                        TextTarget::Description => def.description = text,
                        TextTarget::Ignore => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "Function" => {
                        if let Some(def) = current.take() {
                            defs.push(def);
                        }
                    }
                    "Definition" | "Description" => target = TextTarget::Ignore,
                    _ => {}
                }
            }
            Err(e) => return Err(CatalogError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(defs)
}

fn read_input_slot(e: &BytesStart<'_>) -> InputSlot {
    let mut kind = InputKind::None;
    let mut default_value = String::new();
    let mut options = String::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let val = String::from_utf8_lossy(&attr.value).to_string();
        match key.as_str() {
            "type" => kind = InputKind::parse(&val),
            "default" => default_value = val,
            "options" => options = val,
            _ => {}
        }
    }
    InputSlot {
        kind,
        default_value,
        options,
    }
}

// ── Save ────────────────────────────────────────────────────────────

/// Write the full catalog document atomically.
pub fn save_catalog(path: &Path, defs: &[ActionDefinition]) -> Result<(), CatalogError> {
    let mut writer = xml_writer()?;
    writer.write_event(Event::Start(BytesStart::new("Functions")))?;

    for def in defs {
        let mut func = BytesStart::new("Function");
        func.push_attribute(("name", def.name.as_str()));
        writer.write_event(Event::Start(func))?;

        writer.write_event(Event::Start(BytesStart::new("Definition")))?;
        writer.write_event(Event::Text(BytesText::new(&def.definition_key)))?;
        writer.write_event(Event::End(BytesEnd::new("Definition")))?;

        writer.write_event(Event::Start(BytesStart::new("Inputs")))?;
        for slot in &def.inputs {
            let mut input = BytesStart::new("Input");
            input.push_attribute(("type", slot.kind.as_str()));
            input.push_attribute(("default", slot.default_value.as_str()));
            input.push_attribute(("options", slot.options.as_str()));
            writer.write_event(Event::Empty(input))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Inputs")))?;

        writer.write_event(Event::Start(BytesStart::new("Description")))?;
        writer.write_event(Event::Text(BytesText::new(&def.description)))?;
        writer.write_event(Event::End(BytesEnd::new("Description")))?;

        writer.write_event(Event::End(BytesEnd::new("Function")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Functions")))?;

    atomic_write(path, &writer.into_inner())?;
    Ok(())
}
