//! Structured view of a `.kicad_sch` file.
//!
//! [`SchematicDoc`] is the input boundary of the extraction core: symbol
//! placements, library symbol definitions, wires, junctions, labels, and the
//! graphical rectangles/text used for grouping. It stays close to the file
//! structure; all electrical interpretation happens in the extraction
//! modules.

use std::collections::HashMap;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

use crate::geometry::{Mirror, Position};
use crate::library;
use crate::parser::sexp::{self, Sexp, SexpError};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SexpError),
    #[error("not a kicad_sch document (top-level tag is '{0}')")]
    NotASchematic(String),
    #[error("{node} node is missing required field '{field}'")]
    MissingField { node: &'static str, field: &'static str },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("symbol '{0}' has no placement")]
    MissingPlacement(String),
}

/// Electrical type of a library pin, as declared in the symbol library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectricalType {
    Input,
    Output,
    Bidirectional,
    TriState,
    Passive,
    Free,
    PowerIn,
    PowerOut,
    OpenCollector,
    OpenEmitter,
    NoConnect,
    Unspecified,
}

impl ElectricalType {
    pub fn from_keyword(kw: &str) -> Self {
        match kw {
            "input" => Self::Input,
            "output" => Self::Output,
            "bidirectional" => Self::Bidirectional,
            "tri_state" => Self::TriState,
            "passive" => Self::Passive,
            "free" => Self::Free,
            "power_in" => Self::PowerIn,
            "power_out" => Self::PowerOut,
            "open_collector" => Self::OpenCollector,
            "open_emitter" => Self::OpenEmitter,
            "no_connect" => Self::NoConnect,
            _ => Self::Unspecified,
        }
    }
}

/// Pin definition inside a library symbol sub-unit; `at` is library-relative.
#[derive(Debug, Clone)]
pub struct LibPin {
    pub number: String,
    pub name: String,
    pub electrical: ElectricalType,
    pub at: Position,
}

/// One sub-unit of a library symbol. Unit 0 holds pins shared by all units.
#[derive(Debug, Clone)]
pub struct LibUnit {
    pub number: u32,
    pub pins: Vec<LibPin>,
}

#[derive(Debug, Clone)]
pub struct LibSymbol {
    pub id: String,
    pub power: bool,
    pub units: Vec<LibUnit>,
}

/// A symbol placed on the sheet.
#[derive(Debug, Clone)]
pub struct SymbolInstance {
    pub lib_id: String,
    pub at: Position,
    pub rotation: f64,
    pub mirror: Option<Mirror>,
    pub unit: u32,
    pub is_power: bool,
    /// All properties in file order, including the reserved ones.
    pub properties: IndexMap<String, String>,
}

impl SymbolInstance {
    pub fn reference(&self) -> &str {
        self.properties.get("Reference").map(String::as_str).unwrap_or("")
    }

    pub fn value(&self) -> &str {
        self.properties.get("Value").map(String::as_str).unwrap_or("")
    }

    pub fn footprint(&self) -> &str {
        self.properties.get("Footprint").map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct Wire {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone)]
pub struct Junction {
    pub at: Position,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    pub at: Position,
}

#[derive(Debug, Clone)]
pub struct Rectangle {
    pub start: Position,
    pub end: Position,
}

impl Rectangle {
    /// Corners normalized so min <= max on both axes: (x1, y1, x2, y2).
    pub fn normalized(&self) -> (f64, f64, f64, f64) {
        (
            self.start.x.min(self.end.x),
            self.start.y.min(self.end.y),
            self.start.x.max(self.end.x),
            self.start.y.max(self.end.y),
        )
    }
}

#[derive(Debug, Clone)]
pub struct TextItem {
    pub text: String,
    pub at: Position,
}

/// Parsed schematic document for a single flat sheet.
#[derive(Debug, Clone, Default)]
pub struct SchematicDoc {
    pub symbols: Vec<SymbolInstance>,
    /// Library symbols keyed by their sanitized table key (see [`library`]).
    pub lib_symbols: HashMap<String, LibSymbol>,
    pub wires: Vec<Wire>,
    pub junctions: Vec<Junction>,
    pub labels: Vec<Label>,
    pub global_labels: Vec<Label>,
    pub rectangles: Vec<Rectangle>,
    pub texts: Vec<TextItem>,
}

impl SchematicDoc {
    /// Parse schematic source text into a document.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let root = sexp::parse(input)?;
        let tag = root.tag().unwrap_or("");
        if tag != "kicad_sch" {
            return Err(ParseError::NotASchematic(tag.to_string()));
        }

        let mut doc = SchematicDoc::default();

        if let Some(libs) = root.child("lib_symbols") {
            for node in libs.children("symbol") {
                let lib = parse_lib_symbol(node)?;
                doc.lib_symbols.insert(library::table_key(&lib.id), lib);
            }
        }

        for node in root.children("symbol") {
            doc.symbols.push(parse_symbol_instance(node, &doc.lib_symbols)?);
        }
        for node in root.children("wire") {
            doc.wires.push(parse_wire(node)?);
        }
        for node in root.children("junction") {
            doc.junctions.push(Junction { at: parse_at(node, "junction")? });
        }
        for node in root.children("label") {
            doc.labels.push(parse_label(node, "label")?);
        }
        for node in root.children("global_label") {
            doc.global_labels.push(parse_label(node, "global_label")?);
        }
        for node in root.children("rectangle") {
            doc.rectangles.push(parse_rectangle(node)?);
        }
        for node in root.children("text") {
            let text = node
                .atom_at(1)
                .ok_or(ParseError::MissingField { node: "text", field: "value" })?
                .to_string();
            doc.texts.push(TextItem { text, at: parse_at(node, "text")? });
        }

        // Buses, bus entries, and hierarchical sheets are out of scope for a
        // flat single-sheet netlist; any such nodes are ignored above.

        Ok(doc)
    }
}

fn parse_f64(raw: &str) -> Result<f64, ParseError> {
    raw.parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))
}

/// Read the `(at x y [rot])` child of a node; only x/y are returned.
fn parse_at(node: &Sexp, what: &'static str) -> Result<Position, ParseError> {
    let at = node
        .child("at")
        .ok_or(ParseError::MissingField { node: what, field: "at" })?;
    let x = at
        .atom_at(1)
        .ok_or(ParseError::MissingField { node: what, field: "at.x" })?;
    let y = at
        .atom_at(2)
        .ok_or(ParseError::MissingField { node: what, field: "at.y" })?;
    Ok(Position::new(parse_f64(x)?, parse_f64(y)?))
}

fn parse_xy(node: &Sexp) -> Result<Position, ParseError> {
    let x = node
        .atom_at(1)
        .ok_or(ParseError::MissingField { node: "xy", field: "x" })?;
    let y = node
        .atom_at(2)
        .ok_or(ParseError::MissingField { node: "xy", field: "y" })?;
    Ok(Position::new(parse_f64(x)?, parse_f64(y)?))
}

fn parse_wire(node: &Sexp) -> Result<Wire, ParseError> {
    let pts = node
        .child("pts")
        .ok_or(ParseError::MissingField { node: "wire", field: "pts" })?;
    let mut xy = pts.children("xy");
    let start = xy
        .next()
        .ok_or(ParseError::MissingField { node: "wire", field: "pts.start" })?;
    let end = xy
        .next()
        .ok_or(ParseError::MissingField { node: "wire", field: "pts.end" })?;
    Ok(Wire {
        start: parse_xy(start)?,
        end: parse_xy(end)?,
    })
}

fn parse_label(node: &Sexp, what: &'static str) -> Result<Label, ParseError> {
    let text = node
        .atom_at(1)
        .ok_or(ParseError::MissingField { node: what, field: "text" })?
        .to_string();
    Ok(Label { text, at: parse_at(node, what)? })
}

fn parse_rectangle(node: &Sexp) -> Result<Rectangle, ParseError> {
    let corner = |key: &'static str, field: &'static str| -> Result<Position, ParseError> {
        let c = node
            .child(key)
            .ok_or(ParseError::MissingField { node: "rectangle", field })?;
        let x = c
            .atom_at(1)
            .ok_or(ParseError::MissingField { node: "rectangle", field })?;
        let y = c
            .atom_at(2)
            .ok_or(ParseError::MissingField { node: "rectangle", field })?;
        Ok(Position::new(parse_f64(x)?, parse_f64(y)?))
    };
    Ok(Rectangle {
        start: corner("start", "start")?,
        end: corner("end", "end")?,
    })
}

fn parse_lib_pin(node: &Sexp) -> Result<LibPin, ParseError> {
    let electrical = node
        .atom_at(1)
        .map(ElectricalType::from_keyword)
        .unwrap_or(ElectricalType::Unspecified);
    let number = node
        .child("number")
        .and_then(|n| n.atom_at(1))
        .ok_or(ParseError::MissingField { node: "pin", field: "number" })?
        .to_string();
    let name = node
        .child("name")
        .and_then(|n| n.atom_at(1))
        .unwrap_or("~")
        .to_string();
    Ok(LibPin {
        number,
        name,
        electrical,
        at: parse_at(node, "pin")?,
    })
}

/// Unit number of a library sub-symbol, from the `NAME_<unit>_<style>`
/// naming convention.
fn sub_unit_number(sub_name: &str) -> Option<u32> {
    let mut parts = sub_name.rsplitn(3, '_');
    let _style = parts.next()?;
    parts.next()?.parse().ok()
}

fn parse_lib_symbol(node: &Sexp) -> Result<LibSymbol, ParseError> {
    let id = node
        .atom_at(1)
        .ok_or(ParseError::MissingField { node: "lib symbol", field: "id" })?
        .to_string();
    let power = node.child("power").is_some();

    let mut units = Vec::new();
    for sub in node.children("symbol") {
        let Some(sub_name) = sub.atom_at(1) else {
            continue;
        };
        let Some(number) = sub_unit_number(sub_name) else {
            warn!(lib_id = %id, sub = %sub_name, "library sub-symbol name has no unit number");
            continue;
        };
        let pins: Vec<LibPin> = sub
            .children("pin")
            .map(parse_lib_pin)
            .collect::<Result<_, _>>()?;
        if pins.is_empty() {
            // Graphics-only sub-units carry no connectivity.
            continue;
        }
        units.push(LibUnit { number, pins });
    }

    Ok(LibSymbol { id, power, units })
}

fn parse_symbol_instance(
    node: &Sexp,
    lib_symbols: &HashMap<String, LibSymbol>,
) -> Result<SymbolInstance, ParseError> {
    let lib_id = node
        .child("lib_id")
        .and_then(|n| n.atom_at(1))
        .ok_or(ParseError::MissingField { node: "symbol", field: "lib_id" })?
        .to_string();

    let mut properties = IndexMap::new();
    for prop in node.children("property") {
        let (Some(name), Some(value)) = (prop.atom_at(1), prop.atom_at(2)) else {
            continue;
        };
        properties.insert(name.to_string(), value.to_string());
    }

    let reference = properties
        .get("Reference")
        .cloned()
        .ok_or(ParseError::MissingField { node: "symbol", field: "Reference" })?;

    // Every placed symbol must have a location; there is no sane default.
    let at_node = node
        .child("at")
        .ok_or_else(|| ParseError::MissingPlacement(reference.clone()))?;
    let x = at_node
        .atom_at(1)
        .ok_or_else(|| ParseError::MissingPlacement(reference.clone()))?;
    let y = at_node
        .atom_at(2)
        .ok_or_else(|| ParseError::MissingPlacement(reference.clone()))?;
    let at = Position::new(parse_f64(x)?, parse_f64(y)?);
    let rotation = match at_node.atom_at(3) {
        Some(raw) => parse_f64(raw)?,
        None => 0.0,
    };

    let mirror = match node.child("mirror").and_then(|n| n.atom_at(1)) {
        Some("x") => Some(Mirror::X),
        Some("y") => Some(Mirror::Y),
        _ => None,
    };

    let unit = node
        .child("unit")
        .and_then(|n| n.atom_at(1))
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1);

    let is_power = lib_id.starts_with("power:")
        || library::lookup(lib_symbols, &lib_id).is_some_and(|lib| lib.power);

    Ok(SymbolInstance {
        lib_id,
        at,
        rotation,
        mirror,
        unit,
        is_power,
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_unit_number_follows_naming_convention() {
        assert_eq!(sub_unit_number("R_0_1"), Some(0));
        assert_eq!(sub_unit_number("4081_5_1"), Some(5));
        assert_eq!(sub_unit_number("LM358_2_1"), Some(2));
        assert_eq!(sub_unit_number("noname"), None);
        assert_eq!(sub_unit_number("bad_x_1"), None);
    }

    #[test]
    fn rejects_non_schematic_root() {
        let err = SchematicDoc::parse("(kicad_pcb)").unwrap_err();
        assert!(matches!(err, ParseError::NotASchematic(_)));
    }

    #[test]
    fn symbol_without_placement_is_a_hard_error() {
        let src = r#"(kicad_sch
            (symbol (lib_id "Device:R") (unit 1)
                (property "Reference" "R1" (at 0 0 0))
                (property "Value" "10k" (at 0 0 0))))"#;
        let err = SchematicDoc::parse(src).unwrap_err();
        match err {
            ParseError::MissingPlacement(reference) => assert_eq!(reference, "R1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parses_placement_rotation_and_mirror() {
        let src = r#"(kicad_sch
            (symbol (lib_id "Device:R") (at 100 50 90) (mirror y) (unit 1)
                (property "Reference" "R1" (at 0 0 0))))"#;
        let doc = SchematicDoc::parse(src).unwrap();
        let sym = &doc.symbols[0];
        assert_eq!(sym.at, Position::new(100.0, 50.0));
        assert_eq!(sym.rotation, 90.0);
        assert_eq!(sym.mirror, Some(Mirror::Y));
        assert_eq!(sym.reference(), "R1");
        assert_eq!(sym.footprint(), "");
    }

    #[test]
    fn power_library_prefix_marks_symbol_as_power() {
        let src = r##"(kicad_sch
            (symbol (lib_id "power:GND") (at 10 10 0) (unit 1)
                (property "Reference" "#PWR01" (at 0 0 0))
                (property "Value" "GND" (at 0 0 0))))"##;
        let doc = SchematicDoc::parse(src).unwrap();
        assert!(doc.symbols[0].is_power);
    }

    #[test]
    fn pin_defaults_and_electrical_types() {
        let src = r#"(kicad_sch
            (lib_symbols
                (symbol "Device:R"
                    (symbol "R_0_1" (rectangle (start -1 -2) (end 1 2)))
                    (symbol "R_1_1"
                        (pin passive line (at 0 3.81 270) (length 1.27)
                            (name "~" (effects (font (size 1.27 1.27))))
                            (number "1" (effects (font (size 1.27 1.27)))))
                        (pin power_in line (at 0 -3.81 90) (length 1.27)
                            (name "VSS" (effects (font (size 1.27 1.27))))
                            (number "2" (effects (font (size 1.27 1.27)))))))))"#;
        let doc = SchematicDoc::parse(src).unwrap();
        let lib = doc.lib_symbols.get("Device_R").unwrap();
        // The graphics-only R_0_1 sub-unit is dropped.
        assert_eq!(lib.units.len(), 1);
        let pins = &lib.units[0].pins;
        assert_eq!(pins[0].electrical, ElectricalType::Passive);
        assert_eq!(pins[0].name, "~");
        assert_eq!(pins[1].electrical, ElectricalType::PowerIn);
        assert_eq!(pins[1].at, Position::new(0.0, -3.81));
    }
}
