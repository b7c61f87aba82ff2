//! Rectangle-based component grouping.
//!
//! Graphical rectangles act as group boundaries. A rectangle takes its name
//! from the first free text item sitting on (or just inside) its top edge;
//! components whose anchor falls inside the rectangle join the group. A
//! component may belong to several overlapping rectangles; components inside
//! no rectangle land in a trailing "Ungrouped" remainder.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::geometry::Position;
use crate::model::Group;
use crate::parser::document::{Rectangle, SchematicDoc, TextItem};

/// Vertical distance (mm) a text item may sit from a rectangle's top edge
/// and still label it.
const GROUP_LABEL_Y_TOLERANCE: f64 = 3.0;

/// Name of the rectangle, if any: the first text whose x falls within the
/// horizontal span and whose y is within tolerance of the top edge.
fn rectangle_label<'a>(rect: &Rectangle, texts: &'a [TextItem]) -> Option<&'a str> {
    let (x1, y1, x2, _y2) = rect.normalized();
    texts
        .iter()
        .find(|t| {
            x1 <= t.at.x && t.at.x <= x2 && (t.at.y - y1).abs() <= GROUP_LABEL_Y_TOLERANCE
        })
        .map(|t| t.text.as_str())
}

fn contains(rect: &Rectangle, p: Position) -> bool {
    let (x1, y1, x2, y2) = rect.normalized();
    x1 <= p.x && p.x <= x2 && y1 <= p.y && p.y <= y2
}

/// Assign components to groups from the document's rectangles and text.
/// `positions` maps each resolved reference to its placement anchor.
pub fn assign_groups(doc: &SchematicDoc, positions: &IndexMap<String, Position>) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut grouped: HashSet<String> = HashSet::new();

    for rect in &doc.rectangles {
        let mut references: Vec<String> = positions
            .iter()
            .filter(|(_, at)| contains(rect, **at))
            .map(|(reference, _)| reference.clone())
            .collect();
        if references.is_empty() {
            continue;
        }
        references.sort();
        grouped.extend(references.iter().cloned());
        groups.push(Group {
            name: rectangle_label(rect, &doc.texts).map(str::to_string),
            references,
        });
    }

    let mut ungrouped: Vec<String> = positions
        .keys()
        .filter(|reference| !grouped.contains(reference.as_str()))
        .cloned()
        .collect();
    if !ungrouped.is_empty() {
        ungrouped.sort();
        groups.push(Group {
            name: Some("Ungrouped".to_string()),
            references: ungrouped,
        });
    }

    debug!(count = groups.len(), "groups assigned");
    groups
}
