use std::error::Error;
use std::process;

use clap::{Arg, ArgAction, Command};
use duct::cmd;

type AnyResult<T> = Result<T, Box<dyn Error>>;
type StepFn = fn() -> AnyResult<()>;
type Step = (&'static str, StepFn);

fn cli() -> Command {
    Command::new("style-selector-task")
        .about("Tasks for the style-selector workspace")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("lint").about("Check formatting and run clippy"))
        .subcommand(Command::new("test").about("Run the workspace test suite"))
        .subcommand(
            Command::new("bench")
                .about("Run the selection benchmarks")
                .arg(
                    Arg::new("quick")
                        .long("quick")
                        .action(ArgAction::SetTrue)
                        .help("Compile the benchmarks without running them"),
                ),
        )
        .subcommand(Command::new("all").about("Run lint and tests"))
}

fn main() {
    if let Err(error) = run() {
        eprintln!("xtask error: {error}");
        process::exit(1);
    }
}

fn run() -> AnyResult<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("lint", _)) => run_lint(),
        Some(("test", _)) => run_tests(),
        Some(("bench", bench)) => run_bench(bench.get_flag("quick")),
        Some(("all", _)) => run_all(),
        _ => unreachable!(),
    }
}

fn run_lint() -> AnyResult<()> {
    println!("Running lint...");
    run_cmd("cargo", &["fmt", "--all", "--", "--check"])?;
    run_cmd(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

fn run_tests() -> AnyResult<()> {
    println!("Running tests...");
    run_cmd("cargo", &["test", "--workspace"])
}

fn run_bench(quick: bool) -> AnyResult<()> {
    println!("Running benchmarks...");
    if quick {
        run_cmd("cargo", &["bench", "-p", "style-selector", "--no-run"])
    } else {
        run_cmd("cargo", &["bench", "-p", "style-selector"])
    }
}

fn run_all() -> AnyResult<()> {
    const STEPS: &[Step] = &[("Lint", run_lint), ("Tests", run_tests)];

    let failures: Vec<String> = STEPS
        .iter()
        .filter_map(|(label, step)| {
            step().err().map(|error| {
                eprintln!("{label} failed: {error}");
                format!("{label}: {error}")
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("One or more tasks failed:\n{}", failures.join("\n")).into())
    }
}

fn run_cmd(program: &str, args: &[&str]) -> AnyResult<()> {
    println!("> {} {}", program, args.join(" "));
    cmd(program, args).run()?;
    Ok(())
}
