use clap::{Arg, Command};
use mmt::runner;
use std::path::Path;
use std::process;

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|found| found.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

fn main() {
    pretty_env_logger::init();

    let matches = Command::new("mmt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interpreter for a small scripting language with Thai keywords")
        .arg(
            Arg::new("file")
                .help("The script to execute (.thl source or .json program)")
                .value_name("FILE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("target")
                .help("Write the parsed program to this .json file instead of running it")
                .value_name("TARGET")
                .index(2),
        )
        .try_get_matches();

    let matches = match matches {
        Ok(matches) => matches,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            match e.print() {
                Ok(()) => process::exit(code),
                Err(_) => process::exit(1),
            }
        }
    };

    let Some(file) = matches.get_one::<String>("file") else {
        process::exit(1);
    };
    let path = Path::new(file);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        process::exit(1);
    }

    let code = match matches.get_one::<String>("target") {
        Some(target) => {
            let target = Path::new(target);
            if !has_extension(path, "thl") {
                eprintln!("Error: '{}' must be a .thl source file", path.display());
                process::exit(1);
            }
            if !has_extension(target, "json") {
                eprintln!("Error: '{}' must be a .json file", target.display());
                process::exit(1);
            }
            runner::emit_ir(path, target)
        }
        None => {
            if !has_extension(path, "thl") && !has_extension(path, "json") {
                eprintln!("Error: '{}' must be a .thl or .json file", path.display());
                process::exit(1);
            }
            runner::run_file(path)
        }
    };

    process::exit(code);
}
