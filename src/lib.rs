//! Class-diagram editing engine.
//!
//! Keeps a name-indexed model of class and interface boxes, attaches typed
//! relationship connectors to their boundaries and keeps them attached as
//! boxes move, and saves/restores diagrams as JSON.

pub mod builder;
pub mod canvas;
pub mod connector;
pub mod diagram;
pub mod error;
pub mod geometry;
pub mod model;
pub mod persist;
pub mod settings;
