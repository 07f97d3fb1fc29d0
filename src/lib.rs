//! World map engine that colors countries by visa requirement for a chosen
//! passport and destination.
//!
//! [`map::WorldMap`] is the entry point: it owns the loaded features, the
//! projected shapes, the view transform and the selection, and turns pointer
//! input into [`map::MapEvent`]s for the surrounding UI.

pub mod codes;
pub mod colors;
pub mod fallback;
pub mod fetch;
pub mod geo;
pub mod hit;
pub mod map;
pub mod profile;
pub mod projection;
#[cfg(feature = "net")]
pub mod proxy;
pub mod render;
pub mod search;
pub mod selection;
pub mod viewport;
pub mod visa;
