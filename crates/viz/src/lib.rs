//! Bevy front end for the scene reconciler.
//!
//! [`backend::BevyScene`] implements the scene graph over a Bevy world,
//! [`runtime`] drives the reconciler from exclusive systems and
//! [`VisPlugin`] wires the window, camera and asset preloading together.

pub mod backend;
pub mod camera;
pub mod demo;
pub mod headless;
pub mod plugin;
pub mod runtime;

pub use plugin::{VisPlugin, VisState};
pub use runtime::{BevyReconciler, VisRuntime};
