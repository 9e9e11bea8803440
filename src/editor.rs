//! The catalog editor model: a draft list of action definitions that is
//! validated and written through `save_catalog` in one step. The running
//! panel never hot-reloads; it picks up edits on next construction.
//!
//! New actions may reference a definition key with no registered handler;
//! such rows simply surface the standard "no handler found" warning when run.

use std::path::Path;

use crate::catalog::{save_catalog, ActionDefinition, Catalog, InputKind, InputSlot};
use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct CatalogEditor {
    drafts: Vec<ActionDefinition>,
}

impl CatalogEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing from the currently saved catalog.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            drafts: catalog.defs().to_vec(),
        }
    }

    pub fn drafts(&self) -> &[ActionDefinition] {
        &self.drafts
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Append a draft. Returns its position.
    pub fn add(&mut self, def: ActionDefinition) -> usize {
        self.drafts.push(def);
        self.drafts.len() - 1
    }

    pub fn delete(&mut self, position: usize) -> bool {
        if position < self.drafts.len() {
            self.drafts.remove(position);
            true
        } else {
            false
        }
    }

    pub fn move_up(&mut self, position: usize) -> bool {
        if position == 0 || position >= self.drafts.len() {
            return false;
        }
        self.drafts.swap(position - 1, position);
        true
    }

    pub fn move_down(&mut self, position: usize) -> bool {
        if position + 1 >= self.drafts.len() {
            return false;
        }
        self.drafts.swap(position, position + 1);
        true
    }

    /// Replace a slot's option list, normalized to trimmed, comma-joined,
    /// non-empty items.
    pub fn set_options(&mut self, position: usize, slot: usize, options: &str) -> bool {
        let Some(slot) = self
            .drafts
            .get_mut(position)
            .and_then(|d| d.inputs.get_mut(slot))
        else {
            return false;
        };
        slot.options = options
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        true
    }

    /// Add another input to a draft. The first two become the physical slots;
    /// anything beyond that folds into the second slot, with defaults and
    /// options concatenated on `;` so no definition ever needs a third slot.
    pub fn append_input(&mut self, position: usize, input: InputSlot) -> bool {
        let Some(def) = self.drafts.get_mut(position) else {
            return false;
        };
        if def.inputs.len() < 2 {
            def.inputs.push(input);
            return true;
        }
        if let Some(last) = def.inputs.get_mut(1) {
            if !input.default_value.is_empty() {
                last.default_value = join_field(&last.default_value, &input.default_value);
            }
            if !input.options.is_empty() {
                last.options = join_field(&last.options, &input.options);
            }
        }
        true
    }

    /// Validate the drafts and rewrite the catalog file.
    pub fn generate(&self, path: &Path) -> Result<(), AppError> {
        for def in &self.drafts {
            if def.name.trim().is_empty() {
                // Lenient on purpose: blank names load and list as blank
                // selector entries.
                eprintln!("[Stackdeck] catalog entry with empty name (key '{}')", def.definition_key);
            }
            for slot in &def.inputs {
                if slot.kind == InputKind::Dropdown && slot.option_list().is_empty() {
                    return Err(AppError::ValidationError {
                        message: format!(
                            "Dropdown input on '{}' requires at least one option",
                            def.name
                        ),
                    });
                }
            }
        }
        save_catalog(path, &self.drafts)?;
        Ok(())
    }
}

fn join_field(existing: &str, added: &str) -> String {
    if existing.is_empty() {
        added.to_string()
    } else {
        format!("{existing};{added}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn drafts() -> CatalogEditor {
        let mut editor = CatalogEditor::new();
        editor.add(ActionDefinition::new("One", "k1"));
        editor.add(ActionDefinition::new("Two", "k2"));
        editor.add(ActionDefinition::new("Three", "k3"));
        editor
    }

    #[test]
    fn move_up_and_down_reorder_drafts() {
        let mut editor = drafts();
        assert!(editor.move_up(1));
        assert_eq!(editor.drafts()[0].name, "Two");
        assert!(editor.move_down(1));
        assert_eq!(editor.drafts()[2].name, "One");
        assert!(!editor.move_up(0));
        assert!(!editor.move_down(2));
    }

    #[test]
    fn set_options_normalizes_the_list() {
        let mut editor = CatalogEditor::new();
        editor.add(
            ActionDefinition::new("Pick", "k").with_input(InputSlot::new(
                InputKind::Dropdown,
                "",
                "",
            )),
        );
        assert!(editor.set_options(0, 0, " a , b ,, c ,"));
        assert_eq!(editor.drafts()[0].inputs[0].options, "a,b,c");
    }

    #[test]
    fn third_input_folds_into_the_second_slot() {
        let mut editor = CatalogEditor::new();
        editor.add(ActionDefinition::new("Multi", "k"));
        editor.append_input(0, InputSlot::new(InputKind::String, "one", ""));
        editor.append_input(0, InputSlot::new(InputKind::String, "two", ""));
        editor.append_input(0, InputSlot::new(InputKind::String, "three", "x,y"));

        let inputs = &editor.drafts()[0].inputs;
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[1].default_value, "two;three");
        assert_eq!(inputs[1].options, "x,y");
    }

    #[test]
    fn generate_rejects_dropdown_without_options() {
        let dir = std::env::temp_dir().join("stackdeck_test_editor_validate");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("functions_config.xml");

        let mut editor = CatalogEditor::new();
        editor.add(
            ActionDefinition::new("Pick", "k").with_input(InputSlot::new(
                InputKind::Dropdown,
                "",
                "",
            )),
        );
        assert!(editor.generate(&path).is_err());
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn generate_writes_a_loadable_catalog() {
        let dir = std::env::temp_dir().join("stackdeck_test_editor_generate");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("functions_config.xml");

        let mut editor = drafts();
        editor.move_up(2);
        editor.generate(&path).unwrap();

        let catalog = Catalog::load(&path);
        assert_eq!(catalog.names(), vec!["One", "Three", "Two"]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
