//! The dynamic row builder: the ordered list of configured action rows and
//! the render policy that derives input widgets from the catalog.
//!
//! Rows reference actions by display name. Resolution against the current
//! catalog happens on demand, so a renamed or removed action degrades to
//! "no definition found" at run time rather than breaking a loaded stack.

use serde::Serialize;

use crate::catalog::{ActionDefinition, Catalog, InputKind};
use crate::stacks::ActionEntry;

/// Placeholder shown in the free-text field of a row with no parameter schema.
pub const VALUE_PLACEHOLDER: &str = "Enter value...";

// ── Widgets ─────────────────────────────────────────────────────────

/// View-model for one parameter input widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WidgetModel {
    Text {
        value: String,
        placeholder: String,
    },
    Choice {
        options: Vec<String>,
        selected: usize,
    },
}

impl WidgetModel {
    fn text(value: &str, placeholder: &str) -> Self {
        WidgetModel::Text {
            value: value.to_string(),
            placeholder: placeholder.to_string(),
        }
    }

    /// The widget's current string value.
    pub fn value(&self) -> &str {
        match self {
            WidgetModel::Text { value, .. } => value,
            WidgetModel::Choice { options, selected } => {
                options.get(*selected).map_or("", String::as_str)
            }
        }
    }

    /// Set the widget's value. On a choice widget the value must match an
    /// option; otherwise the current selection is kept.
    pub fn set_value(&mut self, new_value: &str) {
        match self {
            WidgetModel::Text { value, .. } => *value = new_value.to_string(),
            WidgetModel::Choice { options, selected } => {
                if let Some(pos) = options.iter().position(|o| o == new_value) {
                    *selected = pos;
                }
            }
        }
    }
}

// ── Rows ────────────────────────────────────────────────────────────

/// One live, configured action invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRow {
    /// Display name of the selected action. May be unresolved against the
    /// current catalog.
    pub name: String,
    pub widgets: Vec<WidgetModel>,
    /// Set when a run fails on this row; cleared on the next run or when the
    /// selection changes.
    pub flagged: bool,
}

impl ActionRow {
    pub fn new(name: &str, catalog: &Catalog) -> Self {
        let def = catalog.find(name).map(|(_, d)| d);
        Self {
            name: name.to_string(),
            widgets: build_widgets(def),
            flagged: false,
        }
    }

    /// Resolve this row against the current catalog.
    pub fn resolve<'a>(&self, catalog: &'a Catalog) -> Option<(usize, &'a ActionDefinition)> {
        catalog.find(&self.name)
    }

    /// Catalog position of the selected action, or 0 when unresolved.
    pub fn order_index(&self, catalog: &Catalog) -> usize {
        self.resolve(catalog).map_or(0, |(pos, _)| pos)
    }

    /// Change the selected action and re-derive widgets. Prior widget values
    /// are discarded.
    pub fn select(&mut self, name: &str, catalog: &Catalog) {
        self.name = name.to_string();
        let def = catalog.find(name).map(|(_, d)| d);
        self.widgets = build_widgets(def);
        self.flagged = false;
    }

    /// Current widget values in slot order.
    pub fn values(&self) -> Vec<String> {
        self.widgets.iter().map(|w| w.value().to_string()).collect()
    }

    /// Arguments passed to the handler: two widgets give two positional
    /// arguments; a single widget gives one argument only when non-empty.
    pub fn args(&self) -> Vec<String> {
        match self.widgets.len() {
            0 => Vec::new(),
            1 => {
                let value = self
                    .widgets
                    .first()
                    .map_or(String::new(), |w| w.value().to_string());
                if value.is_empty() {
                    Vec::new()
                } else {
                    vec![value]
                }
            }
            _ => self
                .widgets
                .iter()
                .take(2)
                .map(|w| w.value().to_string())
                .collect(),
        }
    }
}

/// The render policy. An unresolved action or one with no declared inputs
/// gets a single placeholder text field; otherwise slots 0 and 1 each get a
/// widget matching their kind, and any further slots are not rendered.
fn build_widgets(def: Option<&ActionDefinition>) -> Vec<WidgetModel> {
    let Some(def) = def else {
        return vec![WidgetModel::text("", VALUE_PLACEHOLDER)];
    };
    if def.inputs.is_empty() {
        return vec![WidgetModel::text("", VALUE_PLACEHOLDER)];
    }
    def.inputs
        .iter()
        .take(2)
        .map(|slot| match slot.kind {
            InputKind::Dropdown => {
                let options = slot.option_list();
                let selected = options
                    .iter()
                    .position(|o| *o == slot.default_value)
                    .unwrap_or(0);
                WidgetModel::Choice { options, selected }
            }
            _ => WidgetModel::text(&slot.default_value, ""),
        })
        .collect()
}

// ── Index control ───────────────────────────────────────────────────

/// Result of the numeric jump-to-index control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IndexFeedback {
    /// The value selected an action directly.
    Selected(usize),
    /// The value was out of range and clamped, with a user-facing message.
    Clamped { index: usize, message: String },
    /// Non-numeric input, an unknown row, or an empty catalog; nothing changed.
    Ignored,
}

// ── Row stack ───────────────────────────────────────────────────────

/// The ordered list of live rows.
#[derive(Debug, Clone, Default)]
pub struct RowStack {
    rows: Vec<ActionRow>,
}

impl RowStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ActionRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [ActionRow] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Append a row defaulted to the catalog's first action (or unresolved if
    /// the catalog is empty). Returns the new row's position.
    pub fn add_row(&mut self, catalog: &Catalog) -> usize {
        let name = catalog.get(0).map_or(String::new(), |d| d.name.clone());
        self.rows.push(ActionRow::new(&name, catalog));
        self.rows.len() - 1
    }

    /// Remove one row. Other rows keep their positions relative to each other.
    pub fn remove_row(&mut self, position: usize) -> bool {
        if position < self.rows.len() {
            self.rows.remove(position);
            true
        } else {
            false
        }
    }

    /// Change a row's selected action by name.
    pub fn select(&mut self, position: usize, name: &str, catalog: &Catalog) -> bool {
        match self.rows.get_mut(position) {
            Some(row) => {
                row.select(name, catalog);
                true
            }
            None => false,
        }
    }

    /// Set a widget value on one row.
    pub fn set_value(&mut self, position: usize, widget: usize, value: &str) -> bool {
        match self
            .rows
            .get_mut(position)
            .and_then(|r| r.widgets.get_mut(widget))
        {
            Some(w) => {
                w.set_value(value);
                true
            }
            None => false,
        }
    }

    /// The numeric jump-to-index control. Mirrors the action dropdown: a
    /// valid value selects the action at that catalog position, out-of-range
    /// values clamp with a warning, non-numeric input is ignored.
    pub fn set_index(&mut self, position: usize, input: &str, catalog: &Catalog) -> IndexFeedback {
        let Ok(requested) = input.trim().parse::<i64>() else {
            return IndexFeedback::Ignored;
        };
        if catalog.is_empty() || position >= self.rows.len() {
            return IndexFeedback::Ignored;
        }
        let max = catalog.len() - 1;

        let (index, message) = if requested < 0 {
            (0, Some("Index cannot be negative. Resetting to 0.".to_string()))
        } else if requested as usize > max {
            (max, Some(format!("Maximum functions are: {max}")))
        } else {
            (requested as usize, None)
        };

        if let Some(def) = catalog.get(index) {
            let name = def.name.clone();
            self.select(position, &name, catalog);
        }
        match message {
            Some(message) => IndexFeedback::Clamped { index, message },
            None => IndexFeedback::Selected(index),
        }
    }

    /// Capture the persisted form of every row, in display order. Widget
    /// values are joined with `;` into the entry's single value string.
    pub fn entries(&self, catalog: &Catalog) -> Vec<ActionEntry> {
        self.rows
            .iter()
            .map(|row| ActionEntry {
                name: row.name.clone(),
                index: row.order_index(catalog),
                value: row.values().join(";"),
            })
            .collect()
    }

    /// Replace all rows with the persisted entries of a restored stack. Each
    /// entry materializes one row, re-runs the render policy against the
    /// current catalog, then seeds widget values from the saved value string
    /// where slots still line up.
    pub fn load_entries(&mut self, entries: &[ActionEntry], catalog: &Catalog) {
        self.rows.clear();
        for entry in entries {
            let mut row = ActionRow::new(&entry.name, catalog);
            for (slot, part) in entry.value.split(';').enumerate() {
                if let Some(widget) = row.widgets.get_mut(slot) {
                    widget.set_value(part);
                }
            }
            self.rows.push(row);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::InputSlot;

    fn test_catalog() -> Catalog {
        Catalog::from_defs(vec![
            ActionDefinition::new("Go To Start", "GtStart"),
            ActionDefinition::new("Save As", "Save_as")
                .with_input(InputSlot::new(InputKind::String, "scene.fbx", "")),
            ActionDefinition::new("Plot", "PlotToControlRig")
                .with_input(InputSlot::new(
                    InputKind::Dropdown,
                    "All Takes",
                    "Current Take,All Takes",
                ))
                .with_input(InputSlot::new(InputKind::Bool, "True", ""))
                .with_input(InputSlot::new(InputKind::String, "never rendered", "")),
        ])
    }

    #[test]
    fn zero_inputs_render_one_placeholder_text_field() {
        let catalog = test_catalog();
        let row = ActionRow::new("Go To Start", &catalog);
        assert_eq!(row.widgets.len(), 1);
        assert_eq!(
            row.widgets[0],
            WidgetModel::Text {
                value: String::new(),
                placeholder: VALUE_PLACEHOLDER.to_string(),
            }
        );
    }

    #[test]
    fn one_input_renders_one_widget_with_default() {
        let catalog = test_catalog();
        let row = ActionRow::new("Save As", &catalog);
        assert_eq!(row.widgets.len(), 1);
        assert_eq!(row.widgets[0].value(), "scene.fbx");
    }

    #[test]
    fn three_inputs_render_exactly_two_widgets() {
        let catalog = test_catalog();
        let row = ActionRow::new("Plot", &catalog);
        assert_eq!(row.widgets.len(), 2);
    }

    #[test]
    fn dropdown_preselects_default_when_present() {
        let catalog = test_catalog();
        let row = ActionRow::new("Plot", &catalog);
        assert_eq!(row.widgets[0].value(), "All Takes");
    }

    #[test]
    fn dropdown_falls_back_to_first_option() {
        let catalog = Catalog::from_defs(vec![ActionDefinition::new("Pick", "Play").with_input(
            InputSlot::new(InputKind::Dropdown, "missing", "a, b ,c"),
        )]);
        let row = ActionRow::new("Pick", &catalog);
        assert_eq!(row.widgets[0].value(), "a");
        assert_eq!(
            row.widgets[0],
            WidgetModel::Choice {
                options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                selected: 0,
            }
        );
    }

    #[test]
    fn unresolved_action_renders_placeholder_field() {
        let catalog = test_catalog();
        let row = ActionRow::new("Removed Action", &catalog);
        assert!(row.resolve(&catalog).is_none());
        assert_eq!(row.widgets.len(), 1);
        assert_eq!(row.widgets[0].value(), "");
    }

    #[test]
    fn switching_actions_discards_prior_values() {
        let catalog = test_catalog();
        let mut stack = RowStack::new();
        stack.add_row(&catalog);
        stack.select(0, "Save As", &catalog);
        stack.set_value(0, 0, "edited.fbx");
        stack.select(0, "Go To Start", &catalog);
        stack.select(0, "Save As", &catalog);
        assert_eq!(stack.rows()[0].widgets[0].value(), "scene.fbx");
    }

    #[test]
    fn index_above_max_clamps_with_message() {
        let catalog = test_catalog();
        let mut stack = RowStack::new();
        stack.add_row(&catalog);
        let feedback = stack.set_index(0, "8", &catalog);
        assert_eq!(
            feedback,
            IndexFeedback::Clamped {
                index: 2,
                message: "Maximum functions are: 2".to_string(),
            }
        );
        assert_eq!(stack.rows()[0].name, "Plot");
    }

    #[test]
    fn negative_index_clamps_to_zero_with_message() {
        let catalog = test_catalog();
        let mut stack = RowStack::new();
        stack.add_row(&catalog);
        stack.select(0, "Plot", &catalog);
        let feedback = stack.set_index(0, "-3", &catalog);
        assert_eq!(
            feedback,
            IndexFeedback::Clamped {
                index: 0,
                message: "Index cannot be negative. Resetting to 0.".to_string(),
            }
        );
        assert_eq!(stack.rows()[0].name, "Go To Start");
    }

    #[test]
    fn non_numeric_index_is_ignored() {
        let catalog = test_catalog();
        let mut stack = RowStack::new();
        stack.add_row(&catalog);
        assert_eq!(stack.set_index(0, "abc", &catalog), IndexFeedback::Ignored);
        assert_eq!(stack.rows()[0].name, "Go To Start");
    }

    #[test]
    fn single_empty_widget_yields_no_args() {
        let catalog = test_catalog();
        let row = ActionRow::new("Go To Start", &catalog);
        assert!(row.args().is_empty());
    }

    #[test]
    fn two_widgets_always_yield_two_args() {
        let catalog = test_catalog();
        let row = ActionRow::new("Plot", &catalog);
        assert_eq!(row.args(), vec!["All Takes", "True"]);
    }

    #[test]
    fn entries_round_trip_through_load() {
        let catalog = test_catalog();
        let mut stack = RowStack::new();
        stack.add_row(&catalog);
        stack.select(0, "Save As", &catalog);
        stack.set_value(0, 0, "shots/out.fbx");
        stack.add_row(&catalog);
        stack.select(1, "Plot", &catalog);
        stack.set_value(1, 0, "Current Take");

        let entries = stack.entries(&catalog);
        assert_eq!(entries[0].value, "shots/out.fbx");
        assert_eq!(entries[1].value, "Current Take;True");
        assert_eq!(entries[1].index, 2);

        let mut restored = RowStack::new();
        restored.load_entries(&entries, &catalog);
        assert_eq!(restored.entries(&catalog), entries);
        assert_eq!(restored.rows()[1].widgets[0].value(), "Current Take");
    }
}
