use archmap_core::{ArchitectureModel, EntityKind, SemanticLayer, View, ViewKind, classify};
use archmap_layout::{LayoutConfig, LayoutSession, Orchestrator};
use futures::executor::block_on;
use serde::Serialize;
use std::io::Read;
use std::str::FromStr;
use tracing::Level;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Model(archmap_core::Error),
    Config(archmap_layout::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Model(err) => write!(f, "{err}"),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<archmap_core::Error> for CliError {
    fn from(value: archmap_core::Error) -> Self {
        Self::Model(value)
    }
}

impl From<archmap_layout::Error> for CliError {
    fn from(value: archmap_layout::Error) -> Self {
        Self::Config(value)
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
    Layout,
    Classify,
    Centrality,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    verbose: bool,
    view: ViewKind,
    focus: Option<String>,
    selected: Option<String>,
    filter: Option<String>,
    config: Option<String>,
}

impl Args {
    fn view(&self) -> View {
        View {
            kind: self.view,
            focus: self.focus.clone(),
            selected: self.selected.clone(),
            filter: self.filter.clone(),
        }
    }
}

#[derive(Serialize)]
struct ClassifiedOut<'a> {
    id: &'a str,
    kind: EntityKind,
    layer: SemanticLayer,
}

fn usage() -> &'static str {
    "archmap-cli\n\
\n\
USAGE:\n\
  archmap-cli [layout] [--view landscape|context|container|component|deployment] [--focus <id>] [--selected <id>] [--filter <query>] [--config <path>] [--pretty] [--verbose] [<path>|-]\n\
  archmap-cli classify [--pretty] [<path>|-]\n\
  archmap-cli centrality [--pretty] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the model JSON is read from stdin.\n\
  - layout prints {nodes, edges, isLayouting} for the requested view.\n\
  - --config takes a partial JSON layout config merged onto the defaults.\n\
  - Logs go to stderr; --verbose enables debug output.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "classify" => args.command = Command::Classify,
            "centrality" => args.command = Command::Centrality,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--view" => {
                let Some(kind) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.view = match ViewKind::from_str(kind) {
                    Ok(ViewKind::Unknown) | Err(_) => return Err(CliError::Usage(usage())),
                    Ok(kind) => kind,
                };
            }
            "--focus" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.focus = Some(id.clone());
            }
            "--selected" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.selected = Some(id.clone());
            }
            "--filter" => {
                let Some(query) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.filter = Some(query.clone());
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
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
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
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

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
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

fn load_config(path: Option<&str>) -> Result<LayoutConfig, CliError> {
    match path {
        None => Ok(LayoutConfig::default()),
        Some(path) => Ok(LayoutConfig::from_json_str(&std::fs::read_to_string(path)?)?),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let model = ArchitectureModel::from_json_str(&text)?;
    tracing::debug!(
        persons = model.persons.len(),
        systems = model.systems.len(),
        containers = model.containers.len(),
        components = model.components.len(),
        relationships = model.relationships.len(),
        "model loaded"
    );

    match args.command {
        Command::Layout => {
            let config = load_config(args.config.as_deref())?;
            let session = LayoutSession::new(Orchestrator::with_config(config));
            let view = args.view();
            block_on(session.refresh(Some(&model), &view));
            write_json(&session.snapshot(), args.pretty)
        }
        Command::Classify => {
            let out: Vec<ClassifiedOut<'_>> = model
                .entities()
                .map(|entity| ClassifiedOut {
                    id: entity.id(),
                    kind: entity.kind(),
                    layer: classify(&entity),
                })
                .collect();
            write_json(&out, args.pretty)
        }
        Command::Centrality => {
            write_json(&archmap_core::centrality::calculate(&model), args.pretty)
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

    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
