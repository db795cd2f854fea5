use arbora::render::{LayoutOptions, PathRequest, layout_dendrogram, rebuild_tree};
use arbora::{Clustering, ConfigOverrides, DecisionPaths, Forest, Instance, NodeId, RenderConfig};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Arbora(arbora::Error),
    Render(arbora_render::Error),
    Json(serde_json::Error),
    InvalidArgument(String),
    NoTree { index: usize, len: usize },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Arbora(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            CliError::NoTree { index, len } => {
                write!(f, "tree index {index} out of range (model has {len} trees)")
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<arbora::Error> for CliError {
    fn from(value: arbora::Error) -> Self {
        Self::Arbora(value)
    }
}

impl From<arbora_render::Error> for CliError {
    fn from(value: arbora_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Tree,
    Dendrogram,
    Validate,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    verbosity: u8,
    tree_index: usize,
    orientation: Option<i64>,
    from_root: Option<i64>,
    from_leaves: Option<i64>,
    node_attrs: Option<Vec<String>>,
    link_attrs: Option<Vec<String>>,
    abbreviate: bool,
    path: Option<String>,
    instance: Option<String>,
    threshold_cut: Option<f64>,
    config: Option<String>,
    sets: Vec<String>,
}

#[derive(Serialize)]
struct ValidateOut {
    tree: usize,
    criterion: Option<String>,
    nodes: Option<usize>,
    levels: Option<usize>,
}

fn usage() -> &'static str {
    "arbora-cli\n\
\n\
USAGE:\n\
  arbora-cli [tree] [--tree <i>] [--orientation 0|90|180|270] [--from-root <n>] [--from-leaves <n>] [--node-attrs a,b] [--link-attrs a,b] [--abbreviate] [--path <json>] [--instance v1,v2,...] [--config <path>] [--set key=value]... [--pretty] [<model.json>|-]\n\
  arbora-cli dendrogram [--threshold-cut <d>] [--config <path>] [--set key=value]... [--pretty] [<clustering.json>|-]\n\
  arbora-cli validate [<model.json>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - tree prints the laid-out scene of one member tree as JSON; a member without tree_ prints null.\n\
  - --path takes one decision path ([0, 1, 4]) or one path per tree ([[0, 1], [0, 2]]).\n\
  - dendrogram cuts at half the maximum distance unless --threshold-cut is given.\n\
  - -v / -vv / -vvv raise log verbosity on stderr; RUST_LOG takes precedence.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_number<T: std::str::FromStr>(raw: &str) -> Result<T, CliError> {
    raw.trim().parse::<T>().map_err(|_| CliError::Usage(usage()))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "tree" => args.command = Command::Tree,
            "dendrogram" => args.command = Command::Dendrogram,
            "validate" => args.command = Command::Validate,
            "--pretty" => args.pretty = true,
            "--abbreviate" => args.abbreviate = true,
            "-v" => args.verbosity = args.verbosity.saturating_add(1),
            "-vv" => args.verbosity = args.verbosity.saturating_add(2),
            "-vvv" => args.verbosity = args.verbosity.saturating_add(3),
            "--tree" => args.tree_index = parse_number(next_value(&mut it)?)?,
            "--orientation" => args.orientation = Some(parse_number(next_value(&mut it)?)?),
            "--from-root" => args.from_root = Some(parse_number(next_value(&mut it)?)?),
            "--from-leaves" => args.from_leaves = Some(parse_number(next_value(&mut it)?)?),
            "--node-attrs" => args.node_attrs = Some(parse_list(next_value(&mut it)?)),
            "--link-attrs" => args.link_attrs = Some(parse_list(next_value(&mut it)?)),
            "--path" => args.path = Some(next_value(&mut it)?.clone()),
            "--instance" => args.instance = Some(next_value(&mut it)?.clone()),
            "--threshold-cut" => {
                let cut: f64 = parse_number(next_value(&mut it)?)?;
                if !cut.is_finite() {
                    return Err(CliError::Usage(usage()));
                }
                args.threshold_cut = Some(cut);
            }
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--set" => args.sets.push(next_value(&mut it)?.clone()),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_tracing(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

/// Config file, then dedicated flags, then `--set` assignments.
fn build_config(args: &Args) -> Result<RenderConfig, CliError> {
    let mut overrides = ConfigOverrides::empty_object();
    if let Some(path) = args.config.as_deref() {
        let doc: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        overrides.deep_merge(&doc);
    }
    if let Some(o) = args.orientation {
        overrides.set_value("tree.orientation", Value::from(o));
    }
    if let Some(n) = args.from_root {
        overrides.set_value("tree.visible_depth_from_root", Value::from(n));
    }
    if let Some(n) = args.from_leaves {
        overrides.set_value("tree.visible_depth_from_leaves", Value::from(n));
    }
    if let Some(attrs) = &args.node_attrs {
        overrides.set_value("labels.node_attributes", Value::from(attrs.clone()));
    }
    if let Some(attrs) = &args.link_attrs {
        overrides.set_value("labels.link_attributes", Value::from(attrs.clone()));
    }
    if args.abbreviate {
        overrides.set_value("labels.abbreviate", Value::Bool(true));
    }
    for assignment in &args.sets {
        overrides.set_assignment(assignment)?;
    }
    Ok(overrides.resolve()?)
}

fn selected_path(raw: &str, tree_index: usize) -> Result<Vec<NodeId>, CliError> {
    let value: Value = serde_json::from_str(raw)?;
    let paths = DecisionPaths::from_value(&value);
    let path = if paths.len() == 1 {
        paths.get(0)
    } else {
        paths.get(tree_index)
    };
    Ok(path.map(<[NodeId]>::to_vec).unwrap_or_default())
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;

    match args.command {
        Command::Tree => {
            let config = build_config(&args)?;
            let forest = Forest::from_json_str(&text)?;
            let Some(model) = forest.get(args.tree_index) else {
                return Err(CliError::NoTree {
                    index: args.tree_index,
                    len: forest.len(),
                });
            };

            let path = match args.path.as_deref() {
                Some(raw) => selected_path(raw, args.tree_index)?,
                None => Vec::new(),
            };
            let instance = match args.instance.as_deref() {
                Some(raw) => Some(Instance::parse(raw).map_err(CliError::InvalidArgument)?),
                None => None,
            };
            let highlight = (!path.is_empty()).then(|| PathRequest {
                path: &path,
                instance: instance.as_ref(),
            });

            let scene = rebuild_tree(model, &config, highlight, &LayoutOptions::default())?;
            write_json(&scene, args.pretty)
        }
        Command::Dendrogram => {
            let config = build_config(&args)?;
            let clustering = Clustering::from_json_str(&text)?;
            let cut = args
                .threshold_cut
                .unwrap_or_else(|| clustering.max_distance() / 2.0);
            let scene = layout_dendrogram(&clustering, cut, &config)?;
            write_json(&scene, args.pretty)
        }
        Command::Validate => {
            let forest = Forest::from_json_str(&text)?;
            for (i, model) in forest.members.iter().enumerate() {
                let out = ValidateOut {
                    tree: i,
                    criterion: model.criterion.clone(),
                    nodes: model.tree.as_ref().map(|t| t.capacity),
                    levels: model.tree.as_ref().map(|t| t.level_count()),
                };
                write_json(&out, false)?;
            }
            Ok(())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_tracing(args.verbosity);

    match run(args) {
        Ok(()) => {}
        Err(err @ CliError::NoTree { .. }) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
