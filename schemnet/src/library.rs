//! Library symbol lookup and the per-unit pin index.
//!
//! Library identifiers can contain characters that are not valid in the
//! symbol table ("Device:R", "Regulator_Linear:MIC5504-3.3YM5"), so the table
//! is keyed by a sanitized form. Identifiers that would start with a digit
//! after sanitizing get an `n` prefix; lookups try both candidate keys.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::parser::document::{ElectricalType, LibPin, LibSymbol, SchematicDoc};

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_lib_id(lib_id: &str) -> String {
    lib_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Key under which a library symbol is stored in the document table.
pub fn table_key(lib_id: &str) -> String {
    let sanitized = sanitize_lib_id(lib_id);
    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("n{sanitized}")
    } else {
        sanitized
    }
}

/// Resolve a raw library id against the table, trying the sanitized key and
/// then the `n`-prefixed variant.
pub fn lookup<'a>(table: &'a HashMap<String, LibSymbol>, lib_id: &str) -> Option<&'a LibSymbol> {
    let sanitized = sanitize_lib_id(lib_id);
    if let Some(found) = table.get(&sanitized) {
        return Some(found);
    }
    table.get(&format!("n{sanitized}"))
}

/// Pin index over every library symbol used by the schematic:
/// `(lib_id, unit)` -> `{pin_number -> pin}`, with unit 0 holding pins shared
/// across all units of a multi-unit part.
#[derive(Debug, Default)]
pub struct LibraryIndex {
    unit_pins: HashMap<(String, u32), IndexMap<String, LibPin>>,
}

impl LibraryIndex {
    pub fn build(doc: &SchematicDoc) -> Self {
        let mut index = LibraryIndex::default();
        for sym in &doc.symbols {
            if sym.is_power {
                continue;
            }
            if index.unit_pins.keys().any(|(id, _)| *id == sym.lib_id) {
                continue;
            }
            let Some(lib) = lookup(&doc.lib_symbols, &sym.lib_id) else {
                // Unresolvable library id: the part degrades to no pins.
                debug!(lib_id = %sym.lib_id, "library symbol not found");
                continue;
            };
            for unit in &lib.units {
                let key = (sym.lib_id.clone(), unit.number);
                if index.unit_pins.contains_key(&key) {
                    continue;
                }
                let pins: IndexMap<String, LibPin> = unit
                    .pins
                    .iter()
                    .map(|pin| (pin.number.clone(), pin.clone()))
                    .collect();
                index.unit_pins.insert(key, pins);
            }
        }
        debug!(entries = index.unit_pins.len(), "library pin index built");
        index
    }

    /// Pins visible to a placed unit: the shared unit-0 pins plus the unit's
    /// own pins, the latter winning on pin-number collision.
    pub fn unit_pins(&self, lib_id: &str, unit: u32) -> IndexMap<String, LibPin> {
        let mut pins = self
            .unit_pins
            .get(&(lib_id.to_string(), 0))
            .cloned()
            .unwrap_or_default();
        if unit != 0 {
            if let Some(own) = self.unit_pins.get(&(lib_id.to_string(), unit)) {
                for (number, pin) in own {
                    pins.insert(number.clone(), pin.clone());
                }
            }
        }
        pins
    }

    /// A unit whose own pins (shared unit-0 pins excluded) are empty or all
    /// power inputs; such units collapse onto the bare base reference.
    pub fn is_power_only_unit(&self, lib_id: &str, unit: u32) -> bool {
        match self.unit_pins.get(&(lib_id.to_string(), unit)) {
            None => true,
            Some(own) => own
                .values()
                .all(|pin| pin.electrical == ElectricalType::PowerIn),
        }
    }
}

/// Precomputed display names for `(resolved component reference, pin number)`
/// pairs. Library names `""` and the `~` placeholder fall back to the pin
/// number; unknown pairs fall back the same way.
#[derive(Debug, Default)]
pub struct PinNames {
    names: HashMap<(String, String), String>,
}

impl PinNames {
    /// Precompute display names for every pin reachable through the index.
    /// Done once per schematic since several nets may reference the same
    /// (component, pin) pair.
    pub fn build(
        doc: &SchematicDoc,
        index: &LibraryIndex,
        resolver: &crate::resolve::ComponentResolver,
    ) -> Self {
        let mut names = PinNames::default();
        for sym in &doc.symbols {
            if sym.is_power {
                continue;
            }
            let comp_ref = resolver.resolve(sym.reference(), sym.unit, &sym.lib_id, index);
            for (number, pin) in index.unit_pins(&sym.lib_id, sym.unit) {
                names.insert(&comp_ref, &number, &pin.name);
            }
        }
        names
    }

    pub fn insert(&mut self, comp_ref: &str, pin_number: &str, lib_name: &str) {
        let display = if lib_name.is_empty() || lib_name == "~" {
            pin_number.to_string()
        } else {
            lib_name.to_string()
        };
        self.names
            .insert((comp_ref.to_string(), pin_number.to_string()), display);
    }

    pub fn display_name(&self, comp_ref: &str, pin_number: &str) -> String {
        self.names
            .get(&(comp_ref.to_string(), pin_number.to_string()))
            .cloned()
            .unwrap_or_else(|| pin_number.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;

    fn pin(number: &str, name: &str, electrical: ElectricalType) -> LibPin {
        LibPin {
            number: number.to_string(),
            name: name.to_string(),
            electrical,
            at: Position::new(0.0, 0.0),
        }
    }

    #[test]
    fn sanitize_replaces_disallowed_characters() {
        assert_eq!(sanitize_lib_id("Device:R"), "Device_R");
        assert_eq!(
            sanitize_lib_id("Regulator_Linear:MIC5504-3.3YM5"),
            "Regulator_Linear_MIC5504_3_3YM5"
        );
    }

    #[test]
    fn table_key_prefixes_leading_digit() {
        assert_eq!(table_key("4xxx:4081"), "n4xxx_4081");
        assert_eq!(table_key("Device:R"), "Device_R");
    }

    #[test]
    fn lookup_tries_both_candidates() {
        let mut table = HashMap::new();
        table.insert(
            "n4xxx_4081".to_string(),
            LibSymbol { id: "4xxx:4081".into(), power: false, units: vec![] },
        );
        table.insert(
            "Device_R".to_string(),
            LibSymbol { id: "Device:R".into(), power: false, units: vec![] },
        );
        assert!(lookup(&table, "4xxx:4081").is_some());
        assert!(lookup(&table, "Device:R").is_some());
        assert!(lookup(&table, "Device:C").is_none());
    }

    #[test]
    fn unit_pins_merge_shared_with_override() {
        let mut index = LibraryIndex::default();
        index.unit_pins.insert(
            ("lib:IC".into(), 0),
            IndexMap::from([
                ("7".to_string(), pin("7", "VSS", ElectricalType::PowerIn)),
                ("9".to_string(), pin("9", "SHARED", ElectricalType::Passive)),
            ]),
        );
        index.unit_pins.insert(
            ("lib:IC".into(), 1),
            IndexMap::from([
                ("1".to_string(), pin("1", "IN", ElectricalType::Input)),
                ("9".to_string(), pin("9", "OWN", ElectricalType::Output)),
            ]),
        );

        let merged = index.unit_pins("lib:IC", 1);
        assert_eq!(merged.len(), 3);
        // Own pin wins over the shared unit-0 pin with the same number.
        assert_eq!(merged.get("9").unwrap().name, "OWN");
        assert_eq!(merged.get("7").unwrap().name, "VSS");
    }

    #[test]
    fn unknown_library_yields_empty_pin_set() {
        let index = LibraryIndex::default();
        assert!(index.unit_pins("lib:missing", 1).is_empty());
    }

    #[test]
    fn power_only_unit_detection() {
        let mut index = LibraryIndex::default();
        index.unit_pins.insert(
            ("lib:IC".into(), 3),
            IndexMap::from([
                ("14".to_string(), pin("14", "VDD", ElectricalType::PowerIn)),
                ("7".to_string(), pin("7", "VSS", ElectricalType::PowerIn)),
            ]),
        );
        index.unit_pins.insert(
            ("lib:IC".into(), 1),
            IndexMap::from([("1".to_string(), pin("1", "A", ElectricalType::Input))]),
        );

        assert!(index.is_power_only_unit("lib:IC", 3));
        assert!(!index.is_power_only_unit("lib:IC", 1));
        // A unit the library does not define at all counts as power-only.
        assert!(index.is_power_only_unit("lib:IC", 9));
    }

    #[test]
    fn pin_name_fallback() {
        let mut names = PinNames::default();
        names.insert("R1", "1", "~");
        names.insert("Q1", "1", "G");
        names.insert("C1", "2", "");

        assert_eq!(names.display_name("R1", "1"), "1");
        assert_eq!(names.display_name("Q1", "1"), "G");
        assert_eq!(names.display_name("C1", "2"), "2");
        assert_eq!(names.display_name("U9", "3"), "3");
    }

    #[test]
    fn build_uses_lib_unit_numbers() {
        let src = r#"(kicad_sch
            (lib_symbols
                (symbol "4xxx:4081"
                    (symbol "4081_1_1"
                        (pin input line (at -7.62 2.54 0) (length 2.54)
                            (name "~" (effects (font (size 1.27 1.27))))
                            (number "1" (effects (font (size 1.27 1.27)))))
                        (pin output line (at 7.62 0 180) (length 2.54)
                            (name "~" (effects (font (size 1.27 1.27))))
                            (number "3" (effects (font (size 1.27 1.27))))))
                    (symbol "4081_5_1"
                        (pin power_in line (at 0 7.62 270) (length 2.54)
                            (name "VDD" (effects (font (size 1.27 1.27))))
                            (number "14" (effects (font (size 1.27 1.27))))))))
            (symbol (lib_id "4xxx:4081") (at 60 60 0) (unit 1)
                (property "Reference" "U1" (at 0 0 0))
                (property "Value" "4081" (at 0 0 0))))"#;
        let doc = SchematicDoc::parse(src).unwrap();
        let index = LibraryIndex::build(&doc);

        assert_eq!(index.unit_pins("4xxx:4081", 1).len(), 2);
        assert_eq!(index.unit_pins("4xxx:4081", 5).len(), 1);
        assert!(index.is_power_only_unit("4xxx:4081", 5));
    }
}
