//! Headless core for a MotionBuilder-style action-stack panel: an XML-backed
//! catalog of named actions, a registry of executable handlers, a dynamic
//! row builder, persisted named stacks, and a sequential stack runner.

pub mod actions;
pub mod catalog;
pub mod editor;
pub mod error;
pub mod host;
pub mod paths;
pub mod persist;
pub mod registry;
pub mod rows;
pub mod runner;
pub mod settings;
pub mod stacks;
pub mod state;
