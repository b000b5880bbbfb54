use workspace_engine::{
    BoxPoints, RunOptions, Scheme, Traversal, WorkspaceMapper, presets,
};

use std::fs;
use std::path::PathBuf;

const USAGE: &str = r#"workspace_cli (workspace-engine)

USAGE:
  workspace_cli list
  workspace_cli run <preset> [options]

PRESETS:
  2rpr
  dextar
  polar_arm
  sin_cos

OPTIONS (run):
  --resolution <n>   Cells per grid axis (default 50)
  --budget <p>       Contraction iterations per cell (default 10)
  --scheme <name>    classical | boundary | bicentered | unified
  --subdivide        Recursive subdivision instead of the uniform scan
  --out <path>       Write the JSON report to this file instead of stdout
  -h, --help         Show this help
"#;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("workspace_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "list" => {
            print_presets();
            Ok(())
        }
        "run" => cmd_run(&mut args),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_usage() {
    println!("{USAGE}");
}

fn print_presets() {
    for registration in presets::REGISTRATIONS {
        println!("{}", registration.kind.name());
    }
}

#[derive(serde::Serialize)]
struct Report<'a> {
    preset: &'a str,
    scheme: &'a str,
    resolution: usize,
    budget: usize,
    traversal: &'a str,
    area_cells: usize,
    border_cells: usize,
    area: &'a BoxPoints,
    border: &'a BoxPoints,
}

fn cmd_run(args: &mut Args) -> Result<(), String> {
    let preset_name = args.next().ok_or("missing preset name")?;

    let mut options = RunOptions::default();
    let mut out_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--resolution" => {
                options.resolution = parse_count(&args.value("--resolution")?, "--resolution")?;
            }
            "--budget" => {
                options.budget = parse_count(&args.value("--budget")?, "--budget")?;
            }
            "--scheme" => {
                let name = args.value("--scheme")?;
                options.scheme = Scheme::resolve(&name)
                    .ok_or_else(|| format!("unknown scheme `{name}`\n\n{USAGE}"))?;
            }
            "--subdivide" => options.traversal = Traversal::Subdivision,
            "--out" => out_path = Some(PathBuf::from(args.value("--out")?)),
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
        }
    }

    let kind = presets::resolve(&preset_name).ok_or_else(|| unknown_preset(&preset_name))?;
    let mechanism = kind.build();

    let mapper = WorkspaceMapper::new(mechanism).map_err(|e| e.to_string())?;
    let outcome = mapper.run(&options).map_err(|e| e.to_string())?;

    let report = Report {
        preset: mapper.mechanism().name(),
        scheme: options.scheme.name(),
        resolution: options.resolution,
        budget: options.budget,
        traversal: match options.traversal {
            Traversal::UniformScan => "uniform",
            Traversal::Subdivision => "subdivision",
        },
        area_cells: outcome.area.len(),
        border_cells: outcome.border.len(),
        area: &outcome.area,
        border: &outcome.border,
    };

    let json = serde_json::to_string_pretty(&report).map_err(|e| format!("serialize report: {e}"))?;

    if let Some(path) = out_path.as_deref() {
        fs::write(path, json).map_err(|e| format!("write {}: {e}", path.display()))?;
        eprintln!("wrote {}", path.display());
    } else {
        println!("{json}");
    }

    eprintln!(
        "{}: area={} border={}",
        report.preset, report.area_cells, report.border_cells
    );

    Ok(())
}

fn parse_count(value: &str, flag: &str) -> Result<usize, String> {
    let parsed: usize = value
        .parse()
        .map_err(|_| format!("invalid value `{value}` for {flag}"))?;
    if parsed == 0 {
        return Err(format!("{flag} must be at least 1"));
    }
    Ok(parsed)
}

fn unknown_preset(name: &str) -> String {
    let mut msg = format!("unknown preset `{name}`\n\navailable presets:\n");
    for registration in presets::REGISTRATIONS {
        msg.push_str(&format!("  {}\n", registration.kind.name()));
    }
    msg
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next()
            .ok_or_else(|| format!("missing value for {flag}"))
    }
}
