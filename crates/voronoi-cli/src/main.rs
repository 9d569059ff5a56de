use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::fmt::SubscriberBuilder;

use voronoi_diagram::{Point2, VoronoiConfig, VoronoiDiagram};

mod script;
use script::Instruction;

#[derive(Parser)]
#[command(name = "voronoi")]
#[command(about = "Incremental Voronoi diagram CLI: run a script of point/line insertions")]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Run a script of insertions against a fresh diagram.
    Run {
        /// Path to the instruction script.
        script: PathBuf,
        /// Sites must lie strictly inside this radius of the origin.
        #[arg(long, default_value_t = 10.0)]
        far_radius: f64,
        /// Number of bins per axis in the face grid.
        #[arg(long, default_value_t = 50)]
        bins: usize,
        /// Abort the whole run on the first invalid or failed instruction
        /// instead of logging it and continuing with the next line.
        #[arg(long)]
        strict: bool,
        /// Print the final diagram dump after the run.
        #[arg(long)]
        print: bool,
    },
    /// Run a script and emit a one-line JSON summary instead of per-line output.
    Report {
        script: PathBuf,
        #[arg(long, default_value_t = 10.0)]
        far_radius: f64,
        #[arg(long, default_value_t = 50)]
        bins: usize,
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cli = Cli::parse();
    match cli.action {
        Action::Run { script, far_radius, bins, strict, print } => run(script, far_radius, bins, strict, print),
        Action::Report { script, far_radius, bins, strict } => report(script, far_radius, bins, strict),
    }
}

fn load_diagram(far_radius: f64, bins: usize) -> VoronoiDiagram {
    VoronoiDiagram::new(VoronoiConfig::new(far_radius, bins))
}

fn read_script(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))
}

/// Runs every instruction in `text` against `diagram`, returning the count of
/// instructions that succeeded and the count that were rejected or failed.
/// Each instruction is logged via `tracing` as it completes; in non-strict
/// mode a failure is a `tracing::warn!` and the run continues with the next
/// line, matching the teacher's "log and continue" orchestration style.
fn run_script(diagram: &mut VoronoiDiagram, text: &str, strict: bool, mut on_line: impl FnMut(usize, &Instruction, &Result<()>)) -> Result<(usize, usize)> {
    let mut ok = 0usize;
    let mut failed = 0usize;
    for (lineno, parsed) in script::parse_script(text) {
        let instr = match parsed {
            Ok(instr) => instr,
            Err(e) => {
                if strict {
                    return Err(e);
                }
                tracing::warn!(lineno, error = %e, "skipping unparsable line");
                failed += 1;
                continue;
            }
        };
        let outcome: Result<()> = match instr {
            Instruction::Point(x, y) => diagram
                .insert_point_site(Point2::new(x, y))
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!("{e}")),
            Instruction::Line(i, j) => diagram.insert_line_site(i, j).map_err(|e| anyhow::anyhow!("{e}")),
        };
        on_line(lineno, &instr, &outcome);
        match &outcome {
            Ok(()) => ok += 1,
            Err(e) => {
                failed += 1;
                if strict {
                    return Err(anyhow::anyhow!("line {lineno}: {e}"));
                }
                tracing::warn!(lineno, error = %e, "instruction failed, continuing");
            }
        }
    }
    Ok((ok, failed))
}

fn run(script_path: PathBuf, far_radius: f64, bins: usize, strict: bool, print: bool) -> Result<()> {
    let text = read_script(&script_path)?;
    let mut diagram = load_diagram(far_radius, bins);
    tracing::info!(far_radius, bins, script = %script_path.display(), "starting run");

    let (ok, failed) = run_script(&mut diagram, &text, strict, |lineno, instr, outcome| match (instr, outcome) {
        (Instruction::Point(x, y), Ok(())) => println!("line {lineno}: point ({x}, {y}) -> ok"),
        (Instruction::Point(x, y), Err(e)) => println!("line {lineno}: point ({x}, {y}) -> error: {e}"),
        (Instruction::Line(i, j), Ok(())) => println!("line {lineno}: line {i}-{j} -> ok"),
        (Instruction::Line(i, j), Err(e)) => println!("line {lineno}: line {i}-{j} -> error: {e}"),
    })?;

    tracing::info!(ok, failed, "run complete");
    if print {
        println!("{}", diagram.print());
    }
    Ok(())
}

fn report(script_path: PathBuf, far_radius: f64, bins: usize, strict: bool) -> Result<()> {
    let text = read_script(&script_path)?;
    let mut diagram = load_diagram(far_radius, bins);
    let (ok, failed) = run_script(&mut diagram, &text, strict, |_, _, _| {})?;

    let summary = json!({
        "far_radius": far_radius,
        "bins": bins,
        "instructions_ok": ok,
        "instructions_failed": failed,
        "num_point_sites": diagram.num_point_sites(),
        "num_line_sites": diagram.num_line_sites(),
        "num_vertices": diagram.num_vertices(),
        "num_split_vertices": diagram.num_split_vertices(),
        "version": diagram.version(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_script(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn run_script_counts_successes_and_failures() {
        let mut diagram = load_diagram(10.0, 20);
        let text = "point 1 0\npoint -1 0\npoint 1 0\n"; // third is coincident
        let (ok, failed) = run_script(&mut diagram, text, false, |_, _, _| {}).unwrap();
        assert_eq!(ok, 2);
        assert_eq!(failed, 1);
        assert_eq!(diagram.num_point_sites(), 2);
    }

    #[test]
    fn strict_mode_aborts_on_first_failure() {
        let mut diagram = load_diagram(10.0, 20);
        let text = "point 1 0\npoint 1 0\npoint -1 0\n";
        let err = run_script(&mut diagram, text, true, |_, _, _| {}).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert_eq!(diagram.num_point_sites(), 1);
    }

    #[test]
    fn run_subcommand_end_to_end_on_a_temp_file() {
        let script = write_script("point 1 0\npoint -1 0\npoint 0 1\n");
        let text = read_script(&script.path().to_path_buf()).unwrap();
        let mut diagram = load_diagram(10.0, 50);
        let (ok, failed) = run_script(&mut diagram, &text, false, |_, _, _| {}).unwrap();
        assert_eq!(ok, 3);
        assert_eq!(failed, 0);
        assert_eq!(diagram.num_point_sites(), 3);
    }
}
