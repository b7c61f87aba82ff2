//! Plain-text report rendering for extracted schematics.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use indexmap::IndexMap;

use crate::model::{Component, Group, Net, PinConnection, Schematic};

/// Per-component connectivity listing.
///
/// Each component prints a header line (reference, value, footprint, custom
/// properties) followed by one line per connected pin. Power-net pins render
/// as `pin  <- RAIL`; other pins list their peers and the net name when one
/// exists. `filter`, when given, limits output to the named references.
pub fn format_netlist(sch: &Schematic, filter: Option<&HashSet<String>>) -> String {
    let pin_index = build_pin_index(&sch.nets);

    let mut out = String::new();
    for comp in &sch.components {
        if let Some(filter) = filter {
            if !filter.contains(&comp.reference) {
                continue;
            }
        }
        out.push_str(&component_header(comp));
        out.push('\n');
        for ((comp_ref, pin_name), entries) in &pin_index {
            if comp_ref != &comp.reference {
                continue;
            }
            for (net, peers) in entries {
                out.push_str(&pin_line(pin_name, net, peers));
                out.push('\n');
            }
        }
        out.push('\n');
    }

    let trimmed = out.trim_end_matches('\n');
    format!("{trimmed}\n")
}

pub fn format_summary(sch: &Schematic) -> String {
    let mut refs: Vec<&str> = sch.components.iter().map(|c| c.reference.as_str()).collect();
    refs.sort();
    let mut net_names: Vec<&str> = sch
        .nets
        .iter()
        .filter_map(|n| n.name.as_deref())
        .collect();
    net_names.sort();

    let named = if net_names.is_empty() {
        "Named nets: (none)".to_string()
    } else {
        format!("Named nets: {}", net_names.join(", "))
    };
    format!(
        "Components: {}\nNets: {}\n\nReferences: {}\n\n{}\n",
        sch.components.len(),
        sch.nets.len(),
        refs.join(", "),
        named,
    )
}

/// Column-aligned bill of materials, sorted by reference. The pin count is
/// the number of net connections each reference participates in.
pub fn format_bom(sch: &Schematic) -> String {
    let mut pin_counts: HashMap<&str, usize> = HashMap::new();
    for net in &sch.nets {
        for conn in &net.connections {
            *pin_counts.entry(conn.component_ref.as_str()).or_default() += 1;
        }
    }

    let mut comps: Vec<&Component> = sch.components.iter().collect();
    comps.sort_by(|a, b| a.reference.cmp(&b.reference));

    let width = |header: &str, field: fn(&Component) -> &str| -> usize {
        comps
            .iter()
            .map(|c| field(c).len())
            .max()
            .unwrap_or(0)
            .max(header.len())
    };
    let ref_width = width("Ref", |c| &c.reference);
    let val_width = width("Value", |c| &c.value);
    let fp_width = width("Footprint", |c| &c.footprint);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<ref_width$}  {:<val_width$}  {:<fp_width$}  Pins",
        "Ref", "Value", "Footprint",
    );
    for comp in comps {
        let pins = pin_counts.get(comp.reference.as_str()).copied().unwrap_or(0);
        let _ = writeln!(
            out,
            "{:<ref_width$}  {:<val_width$}  {:<fp_width$}  {pins}",
            comp.reference, comp.value, comp.footprint,
        );
    }
    out
}

pub fn format_groups(groups: &[Group]) -> String {
    let mut out = String::new();
    for group in groups {
        let label = group.name.as_deref().unwrap_or("(unlabeled)");
        let _ = writeln!(out, "{label}: {}", group.references.join(", "));
    }
    out
}

/// `(component ref, pin name)` -> each net that pin sits on, paired with the
/// other connections of that net. Insertion order follows net order so the
/// netlist report is stable.
#[allow(clippy::type_complexity)]
fn build_pin_index(nets: &[Net]) -> IndexMap<(String, String), Vec<(&Net, Vec<&PinConnection>)>> {
    let mut index: IndexMap<(String, String), Vec<(&Net, Vec<&PinConnection>)>> = IndexMap::new();
    for net in nets {
        for (i, conn) in net.connections.iter().enumerate() {
            let peers: Vec<&PinConnection> = net
                .connections
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, c)| c)
                .collect();
            index
                .entry((conn.component_ref.clone(), conn.pin_name.clone()))
                .or_default()
                .push((net, peers));
        }
    }
    index
}

fn component_header(comp: &Component) -> String {
    let mut parts = vec![
        comp.reference.clone(),
        comp.value.clone(),
        comp.footprint.clone(),
    ];
    if !comp.properties.is_empty() {
        let props: Vec<String> = comp
            .properties
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        parts.push(format!("{{{}}}", props.join(", ")));
    }
    parts.join("  ")
}

fn pin_line(pin_name: &str, net: &Net, peers: &[&PinConnection]) -> String {
    if net.is_power {
        return format!("  {pin_name}  <- {}", net.name.as_deref().unwrap_or(""));
    }

    let mut parts = vec![format!("  {pin_name}")];
    if !peers.is_empty() {
        let peer_strs: Vec<String> = peers
            .iter()
            .map(|p| format!("{}:{}", p.component_ref, p.pin_name))
            .collect();
        parts.push(format!("-- {}", peer_strs.join(", ")));
    }
    if let Some(name) = &net.name {
        parts.push(format!("({name})"));
    }
    parts.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(reference: &str, pin: &str) -> PinConnection {
        PinConnection {
            component_ref: reference.to_string(),
            pin_name: pin.to_string(),
        }
    }

    fn component(reference: &str, value: &str, footprint: &str) -> Component {
        Component {
            reference: reference.to_string(),
            base_ref: reference.to_string(),
            value: value.to_string(),
            footprint: footprint.to_string(),
            properties: Default::default(),
        }
    }

    fn test_schematic() -> Schematic {
        Schematic {
            components: vec![
                component("R1", "10k", "R_0805"),
                component("C1", "100nF", ""),
            ],
            nets: vec![
                Net {
                    name: Some("SIG".into()),
                    connections: vec![conn("R1", "1"), conn("C1", "1")],
                    is_power: false,
                },
                Net {
                    name: Some("GND".into()),
                    connections: vec![conn("C1", "2")],
                    is_power: true,
                },
                Net {
                    name: None,
                    connections: vec![conn("R1", "2")],
                    is_power: false,
                },
            ],
            groups: vec![],
        }
    }

    #[test]
    fn netlist_lists_pins_with_peers_and_power_arrows() {
        let text = format_netlist(&test_schematic(), None);
        assert!(text.contains("R1  10k  R_0805\n"));
        assert!(text.contains("  1  -- C1:1  (SIG)\n"));
        // Unconnected pin: no peer part, no net name.
        assert!(text.contains("\n  2\n"));
        assert!(text.contains("  2  <- GND\n"));
        assert!(text.ends_with('\n'));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn netlist_filter_limits_components() {
        let mut filter = HashSet::new();
        filter.insert("C1".to_string());
        let text = format_netlist(&test_schematic(), Some(&filter));
        assert!(text.contains("C1  100nF"));
        assert!(!text.contains("R1  10k"));
    }

    #[test]
    fn header_appends_custom_properties() {
        let mut comp = component("U1", "LM358", "SOIC-8");
        comp.properties.insert("MPN".into(), "LM358DR".into());
        comp.properties.insert("Tolerance".into(), "5%".into());
        assert_eq!(
            component_header(&comp),
            "U1  LM358  SOIC-8  {MPN: LM358DR, Tolerance: 5%}"
        );
    }

    #[test]
    fn summary_counts_and_sorted_names() {
        let text = format_summary(&test_schematic());
        assert!(text.starts_with("Components: 2\nNets: 3\n"));
        assert!(text.contains("References: C1, R1\n"));
        assert!(text.contains("Named nets: GND, SIG\n"));
    }

    #[test]
    fn summary_without_named_nets() {
        let sch = Schematic {
            components: vec![component("R1", "10k", "")],
            nets: vec![Net { name: None, connections: vec![conn("R1", "1")], is_power: false }],
            groups: vec![],
        };
        assert!(format_summary(&sch).contains("Named nets: (none)\n"));
    }

    #[test]
    fn bom_is_aligned_and_sorted() {
        let text = format_bom(&test_schematic());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Ref  Value  Footprint  Pins");
        assert_eq!(lines[1], "C1   100nF             2");
        assert_eq!(lines[2], "R1   10k    R_0805     2");
    }

    #[test]
    fn groups_render_unlabeled_placeholder() {
        let groups = vec![
            Group { name: Some("Power".into()), references: vec!["C1".into(), "U1".into()] },
            Group { name: None, references: vec!["R1".into()] },
        ];
        assert_eq!(format_groups(&groups), "Power: C1, U1\n(unlabeled): R1\n");
    }
}
