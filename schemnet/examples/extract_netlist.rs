//! Simple extraction example: parse a schematic and print its netlist.

use schemnet::{parse_schematic, report, SchemnetError};
use std::path::Path;

fn main() -> Result<(), SchemnetError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/blinker.kicad_sch".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example extract_netlist [path/to/file.kicad_sch]");
        std::process::exit(1);
    }

    let sch = parse_schematic(path)?;

    println!("{}", report::format_summary(&sch));
    println!("{}", report::format_netlist(&sch, None));

    if !sch.groups.is_empty() {
        println!("Groups:");
        print!("{}", report::format_groups(&sch.groups));
    }

    Ok(())
}
