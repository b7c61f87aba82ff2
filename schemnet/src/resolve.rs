//! Component reference resolution.
//!
//! Ordinary parts keep their base reference. Multi-unit parts (two or more
//! distinct unit numbers placed under the same base reference) split into one
//! public reference per functional unit ("U1A", "U1B", ...), except units
//! that carry only power-input pins: those collapse onto the bare base
//! reference and never materialize a component of their own.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::geometry::Position;
use crate::library::LibraryIndex;
use crate::model::Component;
use crate::parser::document::SchematicDoc;

const RESERVED_PROPERTIES: [&str; 4] = ["Reference", "Value", "Footprint", "Datasheet"];

#[derive(Debug, Default)]
pub struct ComponentResolver {
    multi_unit: HashSet<String>,
}

impl ComponentResolver {
    /// Scan non-power placements and collect base references that appear
    /// with at least two distinct unit numbers.
    pub fn new(doc: &SchematicDoc) -> Self {
        let mut units_per_ref: HashMap<String, HashSet<u32>> = HashMap::new();
        for sym in &doc.symbols {
            if sym.is_power {
                continue;
            }
            units_per_ref
                .entry(sym.reference().to_string())
                .or_default()
                .insert(sym.unit);
        }
        let multi_unit: HashSet<String> = units_per_ref
            .into_iter()
            .filter(|(_, units)| units.len() > 1)
            .map(|(reference, _)| reference)
            .collect();
        debug!(count = multi_unit.len(), "multi-unit base references found");
        Self { multi_unit }
    }

    pub fn is_multi_unit(&self, base_ref: &str) -> bool {
        self.multi_unit.contains(base_ref)
    }

    /// Public reference of a placed unit.
    pub fn resolve(
        &self,
        base_ref: &str,
        unit: u32,
        lib_id: &str,
        index: &LibraryIndex,
    ) -> String {
        if self.is_multi_unit(base_ref) {
            if index.is_power_only_unit(lib_id, unit) {
                return base_ref.to_string();
            }
            return format!("{base_ref}{}", unit_letter(unit));
        }
        base_ref.to_string()
    }
}

fn unit_letter(unit: u32) -> char {
    (b'A' + (unit.saturating_sub(1) % 26) as u8) as char
}

/// Materialize components and record each one's anchor position.
///
/// Power symbols are skipped entirely; collapsed power-only units of
/// multi-unit parts are skipped too (the package is already represented by
/// its lettered siblings); duplicate resolved references keep the first
/// placement seen.
pub fn extract_components(
    doc: &SchematicDoc,
    index: &LibraryIndex,
    resolver: &ComponentResolver,
) -> (Vec<Component>, IndexMap<String, Position>) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut components = Vec::new();
    let mut positions = IndexMap::new();

    for sym in &doc.symbols {
        if sym.is_power {
            continue;
        }
        let base_ref = sym.reference().to_string();
        let reference = resolver.resolve(&base_ref, sym.unit, &sym.lib_id, index);
        if reference == base_ref && resolver.is_multi_unit(&base_ref) {
            continue;
        }
        if !seen.insert(reference.clone()) {
            continue;
        }

        let properties: IndexMap<String, String> = sym
            .properties
            .iter()
            .filter(|(name, _)| !RESERVED_PROPERTIES.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        positions.insert(reference.clone(), sym.at);
        components.push(Component {
            reference,
            base_ref,
            value: sym.value().to_string(),
            footprint: sym.footprint().to_string(),
            properties,
        });
    }

    debug!(count = components.len(), "components resolved");
    (components, positions)
}
