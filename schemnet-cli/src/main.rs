//! Schemnet CLI - KiCad schematic netlist extraction from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use globset::Glob;
use schemnet::{parse_schematic, report, CircuitGraph, Schematic};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "schemnet")]
#[command(about = "Extract netlist connectivity and component info from KiCad schematics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show per-component pin connections and net assignments
    Netlist {
        /// Path to .kicad_sch file
        #[arg(value_name = "FILE")]
        schematic: PathBuf,

        /// Filter by component reference (glob, e.g. 'U1*'); connected
        /// neighbors are included in the output
        #[arg(long = "ref", value_name = "PATTERN")]
        reference: Option<String>,

        /// Filter by net name
        #[arg(long, value_name = "NAME")]
        net: Option<String>,

        /// One-line-per-schematic summary instead of the full netlist
        #[arg(long)]
        summary: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Print a bill of materials sorted by reference
    Bom {
        /// Path to .kicad_sch file
        #[arg(value_name = "FILE")]
        schematic: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List component groups defined by rectangles drawn on the schematic
    Groups {
        /// Path to .kicad_sch file
        #[arg(value_name = "FILE")]
        schematic: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripting
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Netlist { schematic, reference, net, summary, format } => {
            handle_netlist(&schematic, reference.as_deref(), net.as_deref(), summary, format)
        }
        Commands::Bom { schematic, format } => handle_bom(&schematic, format),
        Commands::Groups { schematic, format } => handle_groups(&schematic, format),
    };

    process::exit(exit_code);
}

fn load(path: &PathBuf) -> Result<Schematic, i32> {
    match parse_schematic(path) {
        Ok(sch) => Ok(sch),
        Err(err) => {
            eprintln!("error: {}: {err}", path.display());
            Err(1)
        }
    }
}

fn handle_netlist(
    path: &PathBuf,
    reference: Option<&str>,
    net: Option<&str>,
    summary: bool,
    format: OutputFormat,
) -> i32 {
    let sch = match load(path) {
        Ok(sch) => sch,
        Err(code) => return code,
    };

    if format == OutputFormat::Json {
        return print_json(&sch);
    }

    if summary {
        print!("{}", report::format_summary(&sch));
        return 0;
    }

    let filter = match component_filter(&sch, reference, net) {
        Ok(filter) => filter,
        Err(code) => return code,
    };
    print!("{}", report::format_netlist(&sch, filter.as_ref()));
    0
}

/// Resolve --ref/--net into a set of references to print.
///
/// A reference pattern selects matching components plus everything that
/// shares a net with them; combined with --net, the pattern only matches
/// components on that net. --net alone selects the net's components.
fn component_filter(
    sch: &Schematic,
    reference: Option<&str>,
    net: Option<&str>,
) -> Result<Option<HashSet<String>>, i32> {
    let Some(pattern) = reference else {
        let Some(net_name) = net else {
            return Ok(None);
        };
        let refs: HashSet<String> = sch
            .nets
            .iter()
            .filter(|n| n.name.as_deref() == Some(net_name))
            .flat_map(|n| n.connected_refs().map(str::to_string))
            .collect();
        return Ok(Some(refs));
    };

    let glob = match Glob::new(pattern) {
        Ok(glob) => glob.compile_matcher(),
        Err(err) => {
            eprintln!("error: invalid --ref pattern '{pattern}': {err}");
            return Err(1);
        }
    };

    let mut matched: HashSet<String> = sch
        .components
        .iter()
        .filter(|c| glob.is_match(&c.reference))
        .map(|c| c.reference.clone())
        .collect();

    if let Some(net_name) = net {
        let on_net: HashSet<&str> = sch
            .nets
            .iter()
            .filter(|n| n.name.as_deref() == Some(net_name))
            .flat_map(|n| n.connected_refs())
            .collect();
        matched.retain(|r| on_net.contains(r.as_str()));
    }

    let graph = CircuitGraph::from_schematic(sch);
    let mut filter = matched.clone();
    for reference in &matched {
        filter.extend(graph.neighbors(reference));
    }
    Ok(Some(filter))
}

fn handle_bom(path: &PathBuf, format: OutputFormat) -> i32 {
    let sch = match load(path) {
        Ok(sch) => sch,
        Err(code) => return code,
    };
    match format {
        OutputFormat::Human => {
            print!("{}", report::format_bom(&sch));
            0
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&sch.components) {
            Ok(json) => {
                println!("{json}");
                0
            }
            Err(err) => {
                eprintln!("error: {err}");
                1
            }
        },
    }
}

fn handle_groups(path: &PathBuf, format: OutputFormat) -> i32 {
    let sch = match load(path) {
        Ok(sch) => sch,
        Err(code) => return code,
    };
    match format {
        OutputFormat::Human => {
            print!("{}", report::format_groups(&sch.groups));
            0
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&sch.groups) {
            Ok(json) => {
                println!("{json}");
                0
            }
            Err(err) => {
                eprintln!("error: {err}");
                1
            }
        },
    }
}

fn print_json(sch: &Schematic) -> i32 {
    match serde_json::to_string_pretty(sch) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}
