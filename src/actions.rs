//! The builtin handler table. Binds the stock definition keys to host-session
//! operations. The key strings here are what catalog entries reference in
//! their `<Definition>` element.

use crate::catalog::{ActionDefinition, InputKind, InputSlot};
use crate::registry::{ActionError, Registry};

/// Build the registry of builtin handlers, in stable registration order.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register("Play", |host, _args| {
        host.play();
        Ok(None)
    });

    registry.register("GtEnd", |host, _args| {
        let end = host.end_frame();
        host.set_current_frame(end);
        Ok(None)
    });

    registry.register("GtStart", |host, _args| {
        let start = host.start_frame();
        host.set_current_frame(start);
        Ok(None)
    });

    registry.register("Save_as", |host, args| {
        let path = args.first().map(String::as_str).filter(|p| !p.is_empty());
        host.save_file(path)?;
        Ok(Some(format!("Saved {}", path.unwrap_or("untitled.fbx"))))
    });

    registry.register("PlotToControlRig", |host, _args| {
        host.plot_to_control_rig()?;
        Ok(Some("Plotted to control rig".to_string()))
    });

    registry.register("Delete Layers", |host, _args| {
        let removed = host.remove_all_layers();
        Ok(Some(format!("Removed {removed} animation layers")))
    });

    registry.register("Empty Take", |host, args| {
        let name = args
            .first()
            .map(String::as_str)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("New Take");
        host.create_take(name)?;
        Ok(Some(format!("Created take '{name}'")))
    });

    registry.register("Select Effector", |host, args| {
        let Some(name) = args.first().filter(|n| !n.trim().is_empty()) else {
            return Err(ActionError::InvalidArgument(
                "an effector name is required".to_string(),
            ));
        };
        host.set_selected_object(name)?;
        Ok(None)
    });

    registry.register("DuplicateTake", |host, _args| {
        let copy = host.duplicate_current_take()?;
        Ok(Some(format!("Duplicated take as '{copy}'")))
    });

    registry.register("Create New Layer", |host, _args| {
        host.create_layer();
        Ok(None)
    });

    registry
}

/// A starter catalog binding every builtin key, for seeding a fresh data
/// directory.
pub fn starter_definitions() -> Vec<ActionDefinition> {
    vec![
        ActionDefinition::new("Play", "Play").with_description("Start playback"),
        ActionDefinition::new("Go To End", "GtEnd").with_description("Jump to the end frame"),
        ActionDefinition::new("Go To Start", "GtStart")
            .with_description("Jump to the start frame"),
        ActionDefinition::new("Save As", "Save_as")
            .with_description("Save the scene to a path")
            .with_input(InputSlot::new(InputKind::String, "", "")),
        ActionDefinition::new("Plot To Control Rig", "PlotToControlRig")
            .with_description("Plot the current take to the control rig"),
        ActionDefinition::new("Delete All Layers", "Delete Layers")
            .with_description("Remove every animation layer above the base layer"),
        ActionDefinition::new("Create Empty Take", "Empty Take")
            .with_description("Create an empty take and switch to it")
            .with_input(InputSlot::new(InputKind::String, "New Take", "")),
        ActionDefinition::new("Select Effector", "Select Effector")
            .with_description("Select a scene object by long name")
            .with_input(InputSlot::new(InputKind::EffectorSelection, "", "")),
        ActionDefinition::new("Duplicate Take", "DuplicateTake")
            .with_description("Duplicate the current take"),
        ActionDefinition::new("Create New Layer", "Create New Layer")
            .with_description("Create a new animation layer"),
    ]
}
