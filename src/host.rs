//! The host-session boundary.
//!
//! The real animation host (take, layer, frame, and selection manipulation)
//! lives behind the [`HostSession`] trait; the core only depends on this
//! contract. [`SimHost`] is an in-memory implementation used by the CLI and
//! tests, recording side effects for assertions.

use serde::Serialize;

use crate::registry::ActionError;

// ── Session contract ────────────────────────────────────────────────

/// Operations the core needs from the animation host.
pub trait HostSession {
    // Takes
    fn take_names(&self) -> Vec<String>;
    /// Current take as (index, name).
    fn current_take(&self) -> (usize, String);
    fn set_current_take_by_name(&mut self, name: &str) -> Result<(), ActionError>;
    fn set_current_take_by_index(&mut self, index: usize) -> Result<(), ActionError>;
    /// Create an empty take and make it current.
    fn create_take(&mut self, name: &str) -> Result<(), ActionError>;
    /// Duplicate the current take, make the copy current, return its name.
    fn duplicate_current_take(&mut self) -> Result<String, ActionError>;

    // Animation layers
    fn active_layer(&self) -> usize;
    fn set_active_layer(&mut self, index: usize) -> Result<(), ActionError>;
    /// Create a new layer, make it active, return its index.
    fn create_layer(&mut self) -> usize;
    /// Remove every layer above the base layer. Returns the number removed.
    fn remove_all_layers(&mut self) -> usize;

    // Transport
    fn current_frame(&self) -> i64;
    fn set_current_frame(&mut self, frame: i64);
    fn start_frame(&self) -> i64;
    fn end_frame(&self) -> i64;
    fn play(&mut self);

    // Scene objects and selection
    fn object_long_names(&self) -> Vec<String>;
    fn selected_object(&self) -> Option<String>;
    fn set_selected_object(&mut self, long_name: &str) -> Result<(), ActionError>;
    fn clear_selection(&mut self);

    // File and rig operations
    fn save_file(&mut self, path: Option<&str>) -> Result<(), ActionError>;
    fn plot_to_control_rig(&mut self) -> Result<(), ActionError>;
}

// ── Session snapshot ────────────────────────────────────────────────

/// The host state captured before a run: current take, active layer, playback
/// frame, and selected object. Returned by the runner as an explicit value so
/// the caller decides when (and whether) to restore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub take_index: usize,
    pub take_name: String,
    pub active_layer: usize,
    pub current_frame: i64,
    pub selected_object: Option<String>,
}

impl SessionSnapshot {
    pub fn capture(host: &dyn HostSession) -> Self {
        let (take_index, take_name) = host.current_take();
        Self {
            take_index,
            take_name,
            active_layer: host.active_layer(),
            current_frame: host.current_frame(),
            selected_object: host.selected_object(),
        }
    }

    /// Re-apply the captured state. The take is restored by name first and by
    /// index if the name is gone (e.g. a run renamed or replaced it).
    pub fn restore(&self, host: &mut dyn HostSession) -> Result<(), ActionError> {
        if host.set_current_take_by_name(&self.take_name).is_err() {
            host.set_current_take_by_index(self.take_index)?;
        }
        host.set_active_layer(self.active_layer)?;
        host.set_current_frame(self.current_frame);
        match self.selected_object {
            Some(ref name) => host.set_selected_object(name)?,
            None => host.clear_selection(),
        }
        Ok(())
    }
}

// ── Simulated host ──────────────────────────────────────────────────

/// In-memory host used by the CLI and tests.
#[derive(Debug, Clone)]
pub struct SimHost {
    takes: Vec<String>,
    current_take: usize,
    layer_count: usize,
    active_layer: usize,
    start_frame: i64,
    end_frame: i64,
    current_frame: i64,
    objects: Vec<String>,
    selected: Option<usize>,
    /// Paths passed to `save_file`, in call order.
    pub saved_files: Vec<String>,
    /// Number of `plot_to_control_rig` calls.
    pub plot_calls: u32,
    /// Whether `play` was invoked.
    pub playing: bool,
}

impl SimHost {
    pub fn new() -> Self {
        Self {
            takes: vec!["Take 001".to_string()],
            current_take: 0,
            layer_count: 1,
            active_layer: 0,
            start_frame: 0,
            end_frame: 100,
            current_frame: 0,
            objects: Vec::new(),
            selected: None,
            saved_files: Vec::new(),
            plot_calls: 0,
            playing: false,
        }
    }

    pub fn with_objects(mut self, long_names: &[&str]) -> Self {
        self.objects = long_names.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn with_frame_range(mut self, start: i64, end: i64) -> Self {
        self.start_frame = start;
        self.end_frame = end;
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSession for SimHost {
    fn take_names(&self) -> Vec<String> {
        self.takes.clone()
    }

    fn current_take(&self) -> (usize, String) {
        let name = self
            .takes
            .get(self.current_take)
            .cloned()
            .unwrap_or_default();
        (self.current_take, name)
    }

    fn set_current_take_by_name(&mut self, name: &str) -> Result<(), ActionError> {
        match self.takes.iter().position(|t| t == name) {
            Some(index) => {
                self.current_take = index;
                Ok(())
            }
            None => Err(ActionError::Host(format!("no take named '{name}'"))),
        }
    }

    fn set_current_take_by_index(&mut self, index: usize) -> Result<(), ActionError> {
        if index < self.takes.len() {
            self.current_take = index;
            Ok(())
        } else {
            Err(ActionError::Host(format!("take index {index} out of range")))
        }
    }

    fn create_take(&mut self, name: &str) -> Result<(), ActionError> {
        if self.takes.iter().any(|t| t == name) {
            return Err(ActionError::Host(format!("take '{name}' already exists")));
        }
        self.takes.push(name.to_string());
        self.current_take = self.takes.len() - 1;
        Ok(())
    }

    fn duplicate_current_take(&mut self) -> Result<String, ActionError> {
        let (_, base) = self.current_take();
        if base.is_empty() {
            return Err(ActionError::Host("no current take to duplicate".to_string()));
        }
        let mut copy = format!("{base} Copy");
        let mut n = 1;
        while self.takes.iter().any(|t| *t == copy) {
            n += 1;
            copy = format!("{base} Copy {n}");
        }
        self.takes.push(copy.clone());
        self.current_take = self.takes.len() - 1;
        Ok(copy)
    }

    fn active_layer(&self) -> usize {
        self.active_layer
    }

    fn set_active_layer(&mut self, index: usize) -> Result<(), ActionError> {
        if index < self.layer_count {
            self.active_layer = index;
            Ok(())
        } else {
            Err(ActionError::Host(format!(
                "layer index {index} out of range"
            )))
        }
    }

    fn create_layer(&mut self) -> usize {
        self.layer_count += 1;
        self.active_layer = self.layer_count - 1;
        self.active_layer
    }

    fn remove_all_layers(&mut self) -> usize {
        let removed = self.layer_count.saturating_sub(1);
        self.layer_count = 1;
        self.active_layer = 0;
        removed
    }

    fn current_frame(&self) -> i64 {
        self.current_frame
    }

    fn set_current_frame(&mut self, frame: i64) {
        self.current_frame = frame;
    }

    fn start_frame(&self) -> i64 {
        self.start_frame
    }

    fn end_frame(&self) -> i64 {
        self.end_frame
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn object_long_names(&self) -> Vec<String> {
        self.objects.clone()
    }

    fn selected_object(&self) -> Option<String> {
        self.selected.and_then(|i| self.objects.get(i).cloned())
    }

    fn set_selected_object(&mut self, long_name: &str) -> Result<(), ActionError> {
        match self.objects.iter().position(|o| o == long_name) {
            Some(index) => {
                self.selected = Some(index);
                Ok(())
            }
            None => Err(ActionError::Host(format!(
                "no scene object named '{long_name}'"
            ))),
        }
    }

    fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn save_file(&mut self, path: Option<&str>) -> Result<(), ActionError> {
        let path = path.unwrap_or("untitled.fbx");
        if path.trim().is_empty() {
            return Err(ActionError::InvalidArgument("empty save path".to_string()));
        }
        self.saved_files.push(path.to_string());
        Ok(())
    }

    fn plot_to_control_rig(&mut self) -> Result<(), ActionError> {
        self.plot_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_restores_take_frame_layer_and_selection() {
        let mut host = SimHost::new().with_objects(&["Scene:Hips", "Scene:LeftHand"]);
        host.set_selected_object("Scene:LeftHand").unwrap();
        host.set_current_frame(42);
        host.create_layer();

        let snapshot = SessionSnapshot::capture(&host);

        host.create_take("Scratch").unwrap();
        host.set_current_frame(99);
        host.set_active_layer(0).unwrap();
        host.clear_selection();

        snapshot.restore(&mut host).unwrap();
        assert_eq!(host.current_take().1, "Take 001");
        assert_eq!(host.current_frame(), 42);
        assert_eq!(host.active_layer(), 1);
        assert_eq!(host.selected_object().as_deref(), Some("Scene:LeftHand"));
    }

    #[test]
    fn restore_falls_back_to_index_when_name_is_gone() {
        let mut host = SimHost::new();
        host.create_take("Second").unwrap();
        let snapshot = SessionSnapshot {
            take_index: 0,
            take_name: "Renamed Away".to_string(),
            active_layer: 0,
            current_frame: 5,
            selected_object: None,
        };
        snapshot.restore(&mut host).unwrap();
        assert_eq!(host.current_take().0, 0);
        assert_eq!(host.current_frame(), 5);
    }

    #[test]
    fn duplicate_take_picks_a_fresh_name() {
        let mut host = SimHost::new();
        assert_eq!(host.duplicate_current_take().unwrap(), "Take 001 Copy");
        host.set_current_take_by_name("Take 001").unwrap();
        assert_eq!(host.duplicate_current_take().unwrap(), "Take 001 Copy 2");
    }

    #[test]
    fn remove_all_layers_keeps_the_base_layer() {
        let mut host = SimHost::new();
        host.create_layer();
        host.create_layer();
        assert_eq!(host.remove_all_layers(), 2);
        assert_eq!(host.layer_count(), 1);
        assert_eq!(host.active_layer(), 0);
    }
}
