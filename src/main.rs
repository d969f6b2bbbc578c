mod args;
mod cli;
mod config;
mod deps;
mod descriptor;
mod error;
mod logging;
mod pkgconfig;
mod project;
mod scaffold;
mod scheduler;
mod script_mode;
mod shell;
mod sources;
mod tool;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use console::style;
use walkdir::WalkDir;

use cli::Cli;
use error::{Error, Result};
use project::{new_loaded_projects, Project};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.show_version {
        println!("buildsmith {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if cli.show_type_sizes {
        print_type_sizes();
        return Ok(());
    }

    if let Some(schema_target) = &cli.schema {
        let text = descriptor::schema_text();
        match schema_target {
            Some(path) => std::fs::write(path, text)
                .map_err(|e| Error::CannotCreate(PathBuf::from(path), e))?,
            None => print!("{}", text),
        }
        return Ok(());
    }

    if let Some(name) = &cli.new_project {
        let target = PathBuf::from(name);
        return scaffold::create_project(&target, name);
    }

    if cli.shebang {
        if !cli.validate_shebang_is_sole_flag() {
            return Err(Error::Config(
                PathBuf::from("-#"),
                "script mode (-#) must be the only flag given".to_string(),
            ));
        }
        let source = cli
            .positional
            .first()
            .ok_or_else(|| Error::Config(PathBuf::from("-#"), "no source file given".to_string()))?;
        let forwarded = &cli.positional[1.min(cli.positional.len())..];
        return script_mode::run(Path::new(source), forwarded);
    }

    let descriptor_path = resolve_descriptor_path(cli.positional.first().map(String::as_str))?;

    if let Some(update_target) = &cli.update_project {
        let descriptor = descriptor::ProjectDescriptor::load(&descriptor_path)?;
        descriptor.write(&PathBuf::from(update_target))?;
        return Ok(());
    }

    let loaded = new_loaded_projects();
    let num_threads = cli.num_threads.unwrap_or_else(default_thread_count);
    let project = Project::load(&descriptor_path, num_threads, cli.rebuild, cli.truncate_output, &loaded)?;

    let config_name = match &cli.active_config {
        Some(name) => name.clone(),
        None if cli.interactive => interactive_choose_configuration(&project)?,
        None => project.find_default_configuration_name()?,
    };

    let start = Instant::now();
    let build_result = project.build(&config_name, &loaded);
    if cli.time_build {
        println!("build took {:?}", start.elapsed());
    }
    build_result?;

    if cli.run_after_build {
        project.run_output_file(&config_name, &[])?;
    }

    Ok(())
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// When no descriptor path is given, searches the current directory for a
/// single `*.json`/`*.bproj` project file.
fn resolve_descriptor_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }

    let cwd = std::env::current_dir().map_err(|e| Error::Filesystem(PathBuf::from("."), e))?;
    let mut candidates = Vec::new();
    for entry in WalkDir::new(&cwd).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry.path().extension().and_then(|e| e.to_str());
        if matches!(ext, Some("json") | Some("bproj")) {
            candidates.push(entry.path().to_path_buf());
        }
    }

    match candidates.len() {
        0 => Err(Error::NoProjectFound(cwd)),
        1 => Ok(candidates.remove(0)),
        _ => {
            let names = candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Err(Error::AmbiguousProject(cwd, names))
        }
    }
}

fn interactive_choose_configuration(project: &Project) -> Result<String> {
    use std::io::{self, BufRead, Write};

    let names: Vec<&String> = project.configurations.keys().collect();
    println!("Choose a configuration to build:");
    for (i, name) in names.iter().enumerate() {
        println!("  {}: {}", i + 1, name);
    }
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line).ok();
    let choice: usize = line.trim().parse().unwrap_or(0);

    names
        .get(choice.wrapping_sub(1))
        .map(|s| (*s).clone())
        .ok_or_else(|| Error::Config(PathBuf::from("<stdin>"), "invalid configuration choice".to_string()))
}

fn print_type_sizes() {
    println!("u8:  {} byte(s)", std::mem::size_of::<u8>());
    println!("u16: {} byte(s)", std::mem::size_of::<u16>());
    println!("u32: {} byte(s)", std::mem::size_of::<u32>());
}
