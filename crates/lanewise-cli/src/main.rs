use futures::executor::block_on;
use lanewise::{CrossContainerFlows, Direction, Graph, LayoutOptions, ProcessModel};
use serde::Serialize;
use serde_json::Value;
use std::io::{Read, Write};
use std::str::FromStr;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Layout(lanewise::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Layout(err) => write!(f, "layout failed: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<lanewise::Error> for CliError {
    fn from(value: lanewise::Error) -> Self {
        Self::Layout(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum InputFormat {
    #[default]
    Graph,
    Process,
}

impl FromStr for InputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(Self::Graph),
            "process" => Ok(Self::Process),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    input: Option<String>,
    format: InputFormat,
    config: Option<String>,
    direction: Option<Direction>,
    spacing: Option<f64>,
    cross_container_flows: Option<CrossContainerFlows>,
    pretty: bool,
    summary: bool,
    out: Option<String>,
}

fn usage() -> &'static str {
    "lanewise\n\
\n\
USAGE:\n\
  lanewise [--format graph|process] [--config <file.json>] [--direction right|down] [--spacing <n>] [--cross-container-flows omit|orthogonal] [--pretty] [--summary] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - --format process reads the editor's process JSON (process/lanes/elements/flows) instead of a\n\
    flat element/flow graph.\n\
  - --config reads layout options from a JSON object; command-line flags override it.\n\
  - The laid-out graph JSON is written to stdout unless --out is given.\n\
  - --summary prints the canvas size to stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--pretty" => args.pretty = true,
            "--summary" => args.summary = true,
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.format = fmt
                    .parse::<InputFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--direction" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.direction = Some(dir.parse().map_err(|_| CliError::Usage(usage()))?);
            }
            "--spacing" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let spacing = n.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(spacing.is_finite() && spacing >= 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.spacing = Some(spacing);
            }
            "--cross-container-flows" => {
                let Some(mode) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.cross_container_flows =
                    Some(mode.parse().map_err(|_| CliError::Usage(usage()))?);
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
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

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    bytes.push(b'\n');
    match out {
        None => std::io::stdout().lock().write_all(&bytes)?,
        Some(path) => std::fs::write(path, bytes)?,
    }
    Ok(())
}

fn layout_options(args: &Args) -> Result<LayoutOptions, CliError> {
    let mut options = match args.config.as_deref() {
        Some(path) => {
            let cfg: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            LayoutOptions::from_config(&cfg)
        }
        None => LayoutOptions::default(),
    };
    if let Some(direction) = args.direction {
        options.direction = direction;
    }
    if let Some(spacing) = args.spacing {
        options.spacing = spacing;
    }
    if let Some(mode) = args.cross_container_flows {
        options.cross_container_flows = mode;
    }
    Ok(options)
}

fn run(args: Args) -> Result<(), CliError> {
    let options = layout_options(&args)?;
    let text = read_input(args.input.as_deref())?;
    let graph = match args.format {
        InputFormat::Graph => serde_json::from_str::<Graph>(&text)?,
        InputFormat::Process => serde_json::from_str::<ProcessModel>(&text)?.into_graph(),
    };

    let laid_out = block_on(lanewise::apply_layout(&graph, &options))?;

    if args.summary {
        let routed = laid_out
            .flows
            .iter()
            .filter(|f| f.waypoints.is_some())
            .count();
        match laid_out.bounds() {
            Some(b) => eprintln!(
                "{} elements, {}/{} flows routed, canvas {:.0}x{:.0}",
                laid_out.elements.len(),
                routed,
                laid_out.flows.len(),
                b.width(),
                b.height()
            ),
            None => eprintln!("empty diagram"),
        }
    }

    write_json(&laid_out, args.pretty, args.out.as_deref())
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

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
