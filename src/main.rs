//! txchain CLI - drive a transmitter's parameter set from the command line

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use txchain::config::{ConfigRecord, ConfigValue, StationSettings};
use txchain::flowgraphs::Transmitter;
use txchain::parameter::Role;
use txchain::sink::TracingSink;
use txchain::value::Value;

#[derive(Parser)]
#[command(name = "txchain")]
#[command(about = "Parameter recomputation for USRP transmit flow graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every transmitter variant
    List,

    /// Show a transmitter's parameters in evaluation order
    Describe {
        /// Transmitter variant
        #[arg(value_enum)]
        transmitter: Transmitter,
    },

    /// Initialize a transmitter and apply parameter updates
    Run {
        /// Transmitter variant
        #[arg(value_enum)]
        transmitter: Transmitter,

        /// Initial configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Station settings file (defaults to the user config directory)
        #[arg(long)]
        station: Option<PathBuf>,

        /// USRP number; selects the output address from the station settings
        #[arg(short, long)]
        usrp: Option<usize>,

        /// Update applied after initialization, in order (NAME=VALUE)
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        sets: Vec<String>,

        /// Write the final primary values to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            for &transmitter in Transmitter::all() {
                println!("{:<18} {}", transmitter.name(), transmitter.table().title);
            }
        }

        Commands::Describe { transmitter } => describe(transmitter)?,

        Commands::Run {
            transmitter,
            config,
            station,
            usrp,
            sets,
            save,
        } => run(transmitter, config, station, usrp, &sets, save)?,
    }

    Ok(())
}

fn describe(transmitter: Transmitter) -> Result<(), Box<dyn std::error::Error>> {
    let graph = transmitter.graph()?;
    let dag = graph.dependency_graph();
    println!("{} - {}", graph.name(), graph.title());
    println!(
        "{} parameters, {} dependencies, {} sources",
        dag.node_count(),
        dag.edge_count(),
        dag.source_nodes().len()
    );
    println!();

    for &id in dag.evaluation_order() {
        let spec = graph.spec(id);
        let rank = dag.rank(id).unwrap_or_default();
        let role = match &spec.role {
            Role::Primary { default: Some(default) } => format!("primary, default {}", default),
            Role::Primary { default: None } => "primary, required".to_string(),
            Role::Derived { dependencies, .. } => format!("derived from {}", dependencies.join(", ")),
        };
        println!(
            "{:>3} {:<22} {:<8} {:<28} {}",
            rank, spec.name, spec.kind, spec.domain, role
        );
        if let Some(label) = &spec.label {
            println!("{:<26} {}", "", label);
        }
        for sink in &spec.sinks {
            println!("{:<26} -> {}", "", sink);
        }
        let feeds: Vec<&str> = dag
            .dependents(id)
            .into_iter()
            .map(|d| graph.spec(d).name.as_str())
            .collect();
        if !feeds.is_empty() {
            println!("{:<26} feeds {}", "", feeds.join(", "));
        }
        if spec.is_primary() {
            let affected = graph.affected_by(&spec.name)?;
            if !affected.is_empty() {
                println!("{:<26} updates {}", "", affected.join(", "));
            }
        }
    }

    Ok(())
}

fn run(
    transmitter: Transmitter,
    config: Option<PathBuf>,
    station: Option<PathBuf>,
    usrp: Option<usize>,
    sets: &[String],
    save: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut record = match &config {
        Some(path) => ConfigRecord::load(path)?,
        None => ConfigRecord::new(),
    };

    let settings = match station.or_else(StationSettings::default_path) {
        Some(path) => StationSettings::load(&path)?,
        None => StationSettings::default(),
    };

    let table = transmitter.table();
    if let Some(usrp) = usrp {
        record.insert("outputIpAddr", settings.usrp_address(usrp)?);
        if table.find("usrpNum").is_some() {
            record.insert("usrpNum", usrp as i64);
        }
    }
    resolve_media(&mut record, &settings);

    let mut params = transmitter.initialize(&record)?;

    let sink_names: Vec<String> = params.graph().sink_names().map(str::to_string).collect();
    for name in &sink_names {
        params.bind(name, TracingSink::new(name))?;
    }
    let calls = params.apply_initial_sinks()?;
    println!("{}: {} initial sink calls", transmitter, calls);

    for assignment in sets {
        let (name, value) = parse_assignment(assignment)?;
        let changes = params.set(name, value)?;
        if changes.is_empty() {
            println!("{}: unchanged", assignment);
        }
        for change in &changes {
            println!("  {} = {}", change.parameter, change.value);
        }
    }

    let values: serde_json::Map<String, serde_json::Value> = params
        .values()
        .into_iter()
        .map(|(name, value)| Ok((name.to_string(), serde_json::to_value(value)?)))
        .collect::<Result<_, serde_json::Error>>()?;
    println!("{}", serde_json::to_string_pretty(&values)?);

    if let Some(path) = save {
        params.snapshot().save(&path)?;
        println!("Saved {} primary values to {}", params.snapshot().len(), path.display());
    }

    Ok(())
}

/// Point relative media file names at the station's media directory
fn resolve_media(record: &mut ConfigRecord, settings: &StationSettings) {
    if settings.media_directory.is_empty() {
        return;
    }
    let media: Vec<(String, String)> = record
        .iter()
        .filter(|(name, _)| name.ends_with("FileName"))
        .filter_map(|(name, value)| match value {
            ConfigValue::Text(file) if Path::new(file).is_relative() => Some((
                name.to_string(),
                settings.media_path(file).to_string_lossy().into_owned(),
            )),
            _ => None,
        })
        .collect();
    for (name, path) in media {
        record.insert(&name, path);
    }
}

/// Parse `NAME=VALUE`; the value is an integer, a number or text
fn parse_assignment(assignment: &str) -> Result<(&str, Value), String> {
    let (name, raw) = assignment
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", assignment))?;
    let name = name.trim();
    let raw = raw.trim();
    let value = if let Ok(i) = raw.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(x) = raw.parse::<f64>() {
        Value::Real(x)
    } else {
        Value::Text(raw.to_string())
    };
    Ok((name, value))
}
