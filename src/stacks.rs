//! Stack persistence: named, ordered lists of configured action invocations
//! in `saved_stacks.xml`.
//!
//! Every operation is a whole-document read-modify-write. Stack names are
//! unique within the document: save-by-name replaces any prior stack of the
//! same name, appending the replacement at the end.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::persist::{atomic_write, xml_writer};

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug)]
pub enum StackError {
    Io(std::io::Error),
    Xml(quick_xml::Error),
    Parse(String),
    NotFound(String),
    AlreadyExists(String),
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::Io(e) => write!(f, "I/O error: {e}"),
            StackError::Xml(e) => write!(f, "XML error: {e}"),
            StackError::Parse(msg) => write!(f, "Parse error: {msg}"),
            StackError::NotFound(name) => write!(f, "Stack '{name}' not found"),
            StackError::AlreadyExists(name) => write!(f, "Stack '{name}' already exists"),
        }
    }
}

impl From<std::io::Error> for StackError {
    fn from(e: std::io::Error) -> Self {
        StackError::Io(e)
    }
}

impl From<quick_xml::Error> for StackError {
    fn from(e: quick_xml::Error) -> Self {
        StackError::Xml(e)
    }
}

// ── Data model ──────────────────────────────────────────────────────

/// One persisted action invocation: display name, catalog position at save
/// time, and the semicolon-joined parameter string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub name: String,
    pub index: usize,
    pub value: String,
}

/// One named stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedStack {
    pub name: String,
    pub entries: Vec<ActionEntry>,
}

/// The full stack document. Document order is save order, oldest first; a
/// re-saved stack moves to the end.
#[derive(Debug, Clone, Default)]
struct StackDocument {
    stacks: Vec<SavedStack>,
}

// ── Operations ──────────────────────────────────────────────────────

/// Save a stack, replacing any existing stack of the same name. A missing or
/// corrupt document is started fresh rather than treated as an error.
pub fn save_stack(path: &Path, name: &str, entries: &[ActionEntry]) -> Result<(), StackError> {
    let mut doc = match read_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            if path.exists() {
                eprintln!(
                    "[Stackdeck] stack document {} unreadable, starting fresh: {e}",
                    path.display()
                );
            }
            StackDocument::default()
        }
    };
    doc.stacks.retain(|s| s.name != name);
    doc.stacks.push(SavedStack {
        name: name.to_string(),
        entries: entries.to_vec(),
    });
    write_document(path, &doc)
}

/// Stack names in document order. A missing document lists nothing.
pub fn list_stacks(path: &Path) -> Result<Vec<String>, StackError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let doc = read_document(path)?;
    Ok(doc.stacks.into_iter().map(|s| s.name).collect())
}

/// Clone a stack's entries under a new name, appended at the end. Fails if
/// the source is missing or the new name is already taken.
pub fn duplicate_stack(path: &Path, source: &str, new_name: &str) -> Result<(), StackError> {
    let mut doc = read_document(path)?;
    if doc.stacks.iter().any(|s| s.name == new_name) {
        return Err(StackError::AlreadyExists(new_name.to_string()));
    }
    let Some(src) = doc.stacks.iter().find(|s| s.name == source) else {
        return Err(StackError::NotFound(source.to_string()));
    };
    let copy = SavedStack {
        name: new_name.to_string(),
        entries: src.entries.clone(),
    };
    doc.stacks.push(copy);
    write_document(path, &doc)
}

/// Remove a stack. A stack that is already absent (including a missing
/// document) is a no-op, not an error.
pub fn delete_stack(path: &Path, name: &str) -> Result<(), StackError> {
    if !path.exists() {
        return Ok(());
    }
    let mut doc = read_document(path)?;
    let before = doc.stacks.len();
    doc.stacks.retain(|s| s.name != name);
    if doc.stacks.len() == before {
        return Ok(());
    }
    write_document(path, &doc)
}

/// Fetch a stack's entries in document order. Unlike `save_stack`, a missing
/// or corrupt document is an error here — there is nothing to restore.
pub fn restore_stack(path: &Path, name: &str) -> Result<Vec<ActionEntry>, StackError> {
    let doc = read_document(path)?;
    doc.stacks
        .into_iter()
        .find(|s| s.name == name)
        .map(|s| s.entries)
        .ok_or_else(|| StackError::NotFound(name.to_string()))
}

// ── Document I/O ────────────────────────────────────────────────────

fn read_document(path: &Path) -> Result<StackDocument, StackError> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(64 * 1024, file);
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::with_capacity(4096);
    let mut doc = StackDocument::default();
    let mut current: Option<SavedStack> = None;
    let mut saw_root = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "Stacks" => saw_root = true,
                    "Stack" => current = Some(read_stack_header(e)),
                    "Action" => {
                        if let Some(ref mut stack) = current {
                            stack.entries.push(read_action_entry(e));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "Stacks" => saw_root = true,
                    // Self-closing <Stack .../> has no children
                    "Stack" => doc.stacks.push(read_stack_header(e)),
                    "Action" => {
                        if let Some(ref mut stack) = current {
                            stack.entries.push(read_action_entry(e));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"Stack" {
                    if let Some(stack) = current.take() {
                        doc.stacks.push(stack);
                    }
                }
            }
            Err(e) => return Err(StackError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(StackError::Parse(
            "document has no <Stacks> root element".to_string(),
        ));
    }
    Ok(doc)
}

fn read_stack_header(e: &BytesStart<'_>) -> SavedStack {
    let mut stack = SavedStack {
        name: String::new(),
        entries: Vec::new(),
    };
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"name" {
            stack.name = String::from_utf8_lossy(&attr.value).to_string();
        }
    }
    stack
}

fn read_action_entry(e: &BytesStart<'_>) -> ActionEntry {
    let mut entry = ActionEntry {
        name: String::new(),
        index: 0,
        value: String::new(),
    };
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let val = String::from_utf8_lossy(&attr.value).to_string();
        match key.as_str() {
            "name" => entry.name = val,
            "index" => entry.index = val.parse().unwrap_or(0),
            "value" => entry.value = val,
            _ => {}
        }
    }
    entry
}

fn write_document(path: &Path, doc: &StackDocument) -> Result<(), StackError> {
    let mut writer = xml_writer()?;
    writer.write_event(Event::Start(BytesStart::new("Stacks")))?;

    for stack in &doc.stacks {
        let mut elem = BytesStart::new("Stack");
        elem.push_attribute(("name", stack.name.as_str()));
        writer.write_event(Event::Start(elem))?;

        for entry in &stack.entries {
            let mut action = BytesStart::new("Action");
            action.push_attribute(("name", entry.name.as_str()));
            action.push_attribute(("index", entry.index.to_string().as_str()));
            action.push_attribute(("value", entry.value.as_str()));
            writer.write_event(Event::Empty(action))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Stack")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Stacks")))?;

    atomic_write(path, &writer.into_inner())?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn temp_doc(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("stackdeck_test_stacks_{tag}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("saved_stacks.xml")
    }

    fn entry(name: &str, index: usize, value: &str) -> ActionEntry {
        ActionEntry {
            name: name.to_string(),
            index,
            value: value.to_string(),
        }
    }

    #[test]
    fn save_then_restore_round_trips_entries_in_order() {
        let path = temp_doc("roundtrip");
        let entries = vec![
            entry("Go To Start", 0, ""),
            entry("Save As", 1, "shots/out.fbx"),
            entry("Plot", 2, "Current Take;True"),
        ];
        save_stack(&path, "Shot 10", &entries).unwrap();

        let restored = restore_stack(&path, "Shot 10").unwrap();
        assert_eq!(restored, entries);
    }

    #[test]
    fn resave_replaces_instead_of_duplicating() {
        let path = temp_doc("replace");
        save_stack(&path, "A", &[entry("x", 0, "")]).unwrap();
        save_stack(&path, "B", &[entry("y", 0, "")]).unwrap();
        save_stack(&path, "A", &[entry("z", 1, "v")]).unwrap();

        // "A" moved to the end, still exactly one of it
        assert_eq!(list_stacks(&path).unwrap(), vec!["B", "A"]);
        assert_eq!(restore_stack(&path, "A").unwrap(), vec![entry("z", 1, "v")]);
    }

    #[test]
    fn duplicate_then_delete() {
        let path = temp_doc("duplicate");
        save_stack(&path, "S", &[entry("x", 0, "a;b")]).unwrap();

        duplicate_stack(&path, "S", "S2").unwrap();
        assert_eq!(list_stacks(&path).unwrap(), vec!["S", "S2"]);
        assert_eq!(
            restore_stack(&path, "S2").unwrap(),
            restore_stack(&path, "S").unwrap()
        );

        delete_stack(&path, "S2").unwrap();
        assert_eq!(list_stacks(&path).unwrap(), vec!["S"]);
    }

    #[test]
    fn duplicate_missing_source_fails() {
        let path = temp_doc("dup_missing");
        save_stack(&path, "S", &[]).unwrap();
        let err = duplicate_stack(&path, "Nope", "New").unwrap_err();
        assert!(matches!(err, StackError::NotFound(ref n) if n == "Nope"));
    }

    #[test]
    fn duplicate_to_existing_name_fails() {
        let path = temp_doc("dup_collision");
        save_stack(&path, "S", &[]).unwrap();
        save_stack(&path, "T", &[]).unwrap();
        let err = duplicate_stack(&path, "S", "T").unwrap_err();
        assert!(matches!(err, StackError::AlreadyExists(ref n) if n == "T"));
    }

    #[test]
    fn delete_absent_stack_is_a_no_op() {
        let path = temp_doc("delete_absent");
        delete_stack(&path, "Nothing").unwrap();
        save_stack(&path, "S", &[]).unwrap();
        delete_stack(&path, "Nothing").unwrap();
        assert_eq!(list_stacks(&path).unwrap(), vec!["S"]);
    }

    #[test]
    fn restore_from_missing_document_fails() {
        let path = temp_doc("restore_missing");
        assert!(restore_stack(&path, "S").is_err());
    }

    #[test]
    fn restore_from_corrupt_document_fails_but_save_starts_fresh() {
        let path = temp_doc("corrupt");
        std::fs::write(&path, "this is not xml at all").unwrap();

        assert!(restore_stack(&path, "S").is_err());

        save_stack(&path, "S", &[entry("x", 0, "")]).unwrap();
        assert_eq!(list_stacks(&path).unwrap(), vec!["S"]);
    }

    #[test]
    fn list_missing_document_is_empty() {
        let path = temp_doc("list_missing");
        assert!(list_stacks(&path).unwrap().is_empty());
    }
}
