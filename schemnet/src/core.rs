//! Extraction pipeline: parsed document in, [`Schematic`] out.

use thiserror::Error;
use tracing::info;

use crate::groups::assign_groups;
use crate::library::{LibraryIndex, PinNames};
use crate::model::Schematic;
use crate::netlist::extract_nets;
use crate::parser::{ParseError, SchematicDoc};
use crate::resolve::{extract_components, ComponentResolver};

#[derive(Debug, Error)]
pub enum SchemnetError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the full extraction over a parsed document.
///
/// Builds the library pin index and the reference resolver, then derives
/// components, nets, and groups from the same resolved view so that the
/// three outputs agree on references.
pub fn extract(doc: &SchematicDoc) -> Schematic {
    let index = LibraryIndex::build(doc);
    let resolver = ComponentResolver::new(doc);
    let pin_names = PinNames::build(doc, &index, &resolver);

    let (components, positions) = extract_components(doc, &index, &resolver);
    let nets = extract_nets(doc, &index, &resolver, &pin_names);
    let groups = assign_groups(doc, &positions);

    info!(
        components = components.len(),
        nets = nets.len(),
        groups = groups.len(),
        "schematic extracted"
    );
    Schematic { components, nets, groups }
}
