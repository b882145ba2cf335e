//! CLI entry point for graft

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use graft::{
    ContentPhase, ContentReport, ModuleConfig, StructurePhase, StructureReport, default_chain,
    init_tracing,
};

#[derive(Parser, Debug)]
#[command(name = "graft")]
#[command(about = "Migrates a legacy JavaScript module tree to ES6 modules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    module: ModuleArgs,

    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print the run report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Transform file contents from the source into the target tree
    Content,
    /// Move, rename and delete files in the target tree
    Structure,
    /// Run the content phase, then the structure phase
    Migrate,
}

#[derive(Args, Debug)]
struct ModuleArgs {
    /// TOML module configuration
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Source module directory (overrides the config file)
    #[arg(long, value_name = "DIR", global = true)]
    source: Option<PathBuf>,

    /// Target module directory (overrides the config file)
    #[arg(long, value_name = "DIR", global = true)]
    target: Option<PathBuf>,

    /// JS namespace of the module (overrides the config file)
    #[arg(long, global = true)]
    namespace: Option<String>,
}

impl ModuleArgs {
    fn load(&self) -> graft::Result<ModuleConfig> {
        let mut config = match &self.config {
            Some(path) => ModuleConfig::from_file(path)?,
            None => ModuleConfig::default(),
        };
        if let Some(source) = &self.source {
            config.source_dir = source.clone();
        }
        if let Some(target) = &self.target {
            config.target_dir = target.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct MigrateReport<'a> {
    content: &'a ContentReport,
    structure: &'a StructureReport,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.module.load().unwrap_or_else(|e| {
        eprintln!("graft: {}", e);
        process::exit(1);
    });

    let result = match cli.command {
        Command::Content => run_content(&config).map(|r| print_content(&r, cli.json)),
        Command::Structure => run_structure(&config).map(|r| print_structure(&r, cli.json)),
        Command::Migrate => run_content(&config).and_then(|content| {
            let structure = run_structure(&config)?;
            if cli.json {
                print_json(&MigrateReport {
                    content: &content,
                    structure: &structure,
                });
            } else {
                print_content(&content, false);
                print_structure(&structure, false);
            }
            Ok(())
        }),
    };

    if let Err(e) = result {
        eprintln!("graft: {}", e);
        process::exit(1);
    }
}

fn run_content(config: &ModuleConfig) -> graft::Result<ContentReport> {
    ContentPhase::new(config, default_chain(config)).run()
}

fn run_structure(config: &ModuleConfig) -> graft::Result<StructureReport> {
    StructurePhase::new(config).run()
}

fn print_content(report: &ContentReport, json: bool) {
    if json {
        print_json(report);
        return;
    }
    println!(
        "content: {} files visited, {} processed, {} written, {} copied, {} deleted",
        report.visited,
        report.processed,
        report.write.written,
        report.write.copied,
        report.write.deleted
    );
    if report.imports_inserted > 0 || report.manual_fixes > 0 {
        println!(
            "content: imports added to {} files, {} manual fixes applied",
            report.imports_inserted, report.manual_fixes
        );
    }
    for warning in &report.warnings {
        println!("warning: {}: {}", warning.path.display(), warning.message);
    }
}

fn print_structure(report: &StructureReport, json: bool) {
    if json {
        print_json(report);
        return;
    }
    println!(
        "structure: {} moved, {} renamed, {} deleted, {} empty directories removed",
        report.moved, report.renamed, report.deleted, report.pruned
    );
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("graft: error writing output: {}", e);
            process::exit(1);
        }
    }
}
