//! Schemnet - KiCad schematic netlist extraction library
//!
//! This library reconstructs electrical connectivity from a flat
//! `.kicad_sch` sheet: which component pins are wired together, which nets
//! carry power rails, and how the sheet's drawn rectangles group components
//! into functional blocks.
//!
//! # Quick Start
//!
//! ```no_run
//! use schemnet::parse_schematic;
//! use std::path::Path;
//!
//! let sch = parse_schematic(Path::new("design.kicad_sch")).unwrap();
//!
//! for net in &sch.nets {
//!     println!("{:?}: {} pins", net.name, net.connections.len());
//! }
//! ```
//!
//! # Features
//!
//! - **Netlist extraction**: union-find over quantized pin/wire coordinates
//! - **Multi-unit resolution**: lettered references for multi-unit packages
//! - **Grouping**: rectangle-and-label based functional blocks
//! - **Graph view**: petgraph-backed connectivity queries

pub mod core;
pub mod geometry;
pub mod graph;
pub mod groups;
pub mod library;
pub mod model;
pub mod netlist;
pub mod parser;
pub mod report;
pub mod resolve;
pub mod unionfind;

// Re-export main types
pub use crate::core::{extract, SchemnetError};
pub use graph::{CircuitGraph, CircuitStats};
pub use model::{Component, Group, Net, PinConnection, Schematic};
pub use parser::{ParseError, SchematicDoc};

/// Parse and extract a schematic file (convenience wrapper).
pub fn parse_schematic(path: &std::path::Path) -> Result<Schematic, SchemnetError> {
    let source = std::fs::read_to_string(path)?;
    parse_schematic_str(&source)
}

/// Parse and extract schematic source text.
pub fn parse_schematic_str(source: &str) -> Result<Schematic, SchemnetError> {
    let doc = SchematicDoc::parse(source)?;
    Ok(extract(&doc))
}
