//! Output entity model: the read-only result of extraction.

use indexmap::IndexMap;
use serde::Serialize;

/// One terminal participating in a net.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PinConnection {
    pub component_ref: String,
    pub pin_name: String,
}

/// A maximal set of electrically-equivalent terminals.
#[derive(Debug, Clone, Serialize)]
pub struct Net {
    pub name: Option<String>,
    /// Discovery order; not semantically significant.
    pub connections: Vec<PinConnection>,
    /// True when the net's identity comes from a placed power symbol value.
    pub is_power: bool,
}

impl Net {
    pub fn connected_refs(&self) -> impl Iterator<Item = &str> {
        self.connections.iter().map(|c| c.component_ref.as_str())
    }

    pub fn has_component(&self, component_ref: &str) -> bool {
        self.connections
            .iter()
            .any(|c| c.component_ref == component_ref)
    }
}

/// A placed component, one per visible functional unit.
#[derive(Debug, Clone, Serialize)]
pub struct Component {
    /// Public reference, possibly unit-suffixed ("U1A").
    pub reference: String,
    /// Package-level reference as silk-screened ("U1").
    pub base_ref: String,
    pub value: String,
    pub footprint: String,
    /// Remaining properties in file order; the four reserved names
    /// (Reference/Value/Footprint/Datasheet) are excluded.
    pub properties: IndexMap<String, String>,
}

/// Components whose anchor falls inside one labeled or unlabeled rectangle,
/// or the synthetic trailing "Ungrouped" remainder.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub name: Option<String>,
    /// Sorted component references.
    pub references: Vec<String>,
}

/// Top-level extraction result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schematic {
    pub components: Vec<Component>,
    pub nets: Vec<Net>,
    pub groups: Vec<Group>,
}

impl Schematic {
    pub fn component(&self, reference: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.reference == reference)
    }

    /// First net with the given name.
    pub fn net(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name.as_deref() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_lookup_by_name() {
        let sch = Schematic {
            components: vec![],
            nets: vec![
                Net { name: None, connections: vec![], is_power: false },
                Net {
                    name: Some("GND".into()),
                    connections: vec![PinConnection {
                        component_ref: "C1".into(),
                        pin_name: "2".into(),
                    }],
                    is_power: true,
                },
            ],
            groups: vec![],
        };
        let gnd = sch.net("GND").unwrap();
        assert!(gnd.is_power);
        assert!(gnd.has_component("C1"));
        assert!(sch.net("VCC").is_none());
    }
}
