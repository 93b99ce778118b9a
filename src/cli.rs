use crate::config::load_config;
use crate::layout::{build_flat_graph, build_focus_tree, compute_family_layout, focus_people};
use crate::layout_dump::GraphDump;
use crate::parser::parse_people;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "famtree", version, about = "Family forest layout engine")]
pub struct Args {
    /// Input JSON person list or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout mode
    #[arg(short = 'm', long = "mode", value_enum, default_value = "forest")]
    pub mode: Mode,

    /// Restrict the view to the neighbourhood of this person
    #[arg(short = 'f', long = "focus")]
    pub focus: Option<String>,

    /// Relationship hops kept around the focus person
    #[arg(short = 'd', long = "depth", default_value_t = 3)]
    pub depth: usize,

    /// Keep forest coordinates instead of normalizing generation ranks
    #[arg(long = "no-normalize")]
    pub no_normalize: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Tree-per-root layout with duplicate references
    Forest,
    /// One node per person, dagre positions
    Flat,
    /// Nested ancestors/descendants around --focus
    Tree,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let output = render(&args)?;
    write_output(&output, args.output.as_deref())
}

/// Produces the JSON document the arguments ask for.
pub fn render(args: &Args) -> Result<String> {
    let mut config = load_config(args.config.as_deref())?.layout;
    if args.no_normalize {
        config.rank.enabled = false;
    }

    let input = read_input(args.input.as_deref())?;
    let mut people = parse_people(&input)?;
    tracing::info!(people = people.len(), mode = ?args.mode, "loaded person records");

    if args.mode == Mode::Tree {
        let root = args
            .focus
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("--focus is required for tree mode"))?;
        let tree = build_focus_tree(&people, root, config.max_depth)
            .ok_or_else(|| anyhow::anyhow!("Person {root} not found"))?;
        return Ok(serde_json::to_string_pretty(&tree)?);
    }

    if let Some(root) = args.focus.as_deref() {
        people = focus_people(&people, root, args.depth);
        if people.is_empty() {
            return Err(anyhow::anyhow!("Person {root} not found"));
        }
    }

    let graph = match args.mode {
        Mode::Flat => build_flat_graph(&people, &config),
        _ => compute_family_layout(&people, &config),
    };
    GraphDump::from_graph(&graph).to_json_string()
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path.filter(|p| *p != Path::new("-")) {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(contents: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
