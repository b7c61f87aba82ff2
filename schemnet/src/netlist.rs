//! Net reconstruction: a single union-find over quantized coordinates.
//!
//! Wires, junctions, labels, and pin locations only describe geometry and
//! text; connectivity is derived from spatial coincidence plus label-name
//! equality. Every interesting coordinate becomes a union-find node, wires
//! and same-named labels merge nodes, and the resulting equivalence classes
//! are the nets.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::geometry::{pin_position, CoordKey};
use crate::library::{LibraryIndex, PinNames};
use crate::model::{Net, PinConnection};
use crate::parser::document::SchematicDoc;
use crate::resolve::ComponentResolver;
use crate::unionfind::UnionFind;

/// Power symbol value that marks a no-op ERC flag rather than a rail.
const PWR_FLAG: &str = "PWR_FLAG";

/// Label texts attached to coordinates. When two labels land on the very
/// same coordinate with different texts, the lexicographically smallest one
/// wins, so extraction stays deterministic.
fn tag_label(labels_at: &mut HashMap<CoordKey, String>, coord: CoordKey, text: &str) {
    match labels_at.get(&coord) {
        Some(existing) if existing.as_str() <= text => {}
        _ => {
            labels_at.insert(coord, text.to_string());
        }
    }
}

pub fn extract_nets(
    doc: &SchematicDoc,
    index: &LibraryIndex,
    resolver: &ComponentResolver,
    pin_names: &PinNames,
) -> Vec<Net> {
    let mut uf: UnionFind<CoordKey> = UnionFind::new();
    let mut pins_at: HashMap<CoordKey, Vec<PinConnection>> = HashMap::new();
    let mut labels_at: HashMap<CoordKey, String> = HashMap::new();
    let mut power_names: HashSet<String> = HashSet::new();

    // Pins of non-power symbols; power symbols tag their placement with
    // their rail name instead.
    for sym in &doc.symbols {
        if sym.is_power {
            let value = sym.value();
            if value == PWR_FLAG {
                continue;
            }
            let coord = CoordKey::from(sym.at);
            uf.find(coord);
            power_names.insert(value.to_string());
            tag_label(&mut labels_at, coord, value);
            continue;
        }

        let comp_ref = resolver.resolve(sym.reference(), sym.unit, &sym.lib_id, index);
        for (number, pin) in index.unit_pins(&sym.lib_id, sym.unit) {
            let abs = pin_position(sym.at, sym.rotation, sym.mirror, pin.at);
            let coord = CoordKey::from(abs);
            uf.find(coord);
            pins_at.entry(coord).or_default().push(PinConnection {
                component_ref: comp_ref.clone(),
                pin_name: pin_names.display_name(&comp_ref, &number),
            });
        }
    }

    // Drawn wires are the primary connectivity mechanism.
    for wire in &doc.wires {
        uf.union(CoordKey::from(wire.start), CoordKey::from(wire.end));
    }

    // Junctions usually coincide with wire endpoints already unioned above;
    // registering them keeps dangling junctions in the node universe.
    for junction in &doc.junctions {
        uf.find(CoordKey::from(junction.at));
    }

    // Local and global labels unify identically.
    for label in doc.labels.iter().chain(doc.global_labels.iter()) {
        let coord = CoordKey::from(label.at);
        uf.find(coord);
        tag_label(&mut labels_at, coord, &label.text);
    }

    // Same-named labels represent one logical node even with no drawn wire
    // between them.
    let mut coords_per_name: IndexMap<&str, Vec<CoordKey>> = IndexMap::new();
    for (coord, name) in &labels_at {
        coords_per_name.entry(name.as_str()).or_default().push(*coord);
    }
    for coords in coords_per_name.values() {
        for coord in &coords[1..] {
            uf.union(coords[0], *coord);
        }
    }

    let mut nets = Vec::new();
    for (_root, members) in uf.classes() {
        let mut connections = Vec::new();
        let mut name: Option<String> = None;
        let mut is_power = false;
        for coord in members {
            if let Some(pins) = pins_at.get(&coord) {
                connections.extend(pins.iter().cloned());
            }
            if let Some(label) = labels_at.get(&coord) {
                if power_names.contains(label) {
                    is_power = true;
                }
                // Conflicting labels within one class: smallest text wins.
                match &name {
                    Some(current) if current.as_str() <= label.as_str() => {}
                    _ => name = Some(label.clone()),
                }
            }
        }
        // Label/junction geometry with no attached pin produces no net.
        if !connections.is_empty() {
            nets.push(Net { name, connections, is_power });
        }
    }

    debug!(count = nets.len(), "nets reconstructed");
    nets
}
