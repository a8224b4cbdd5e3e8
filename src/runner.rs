use crate::error::MmtError;
use crate::evaluator::Evaluator;
use crate::ir;
use crate::parser::parse_source;
use log::{debug, error};
use std::fs;
use std::path::Path;

/// Parses and evaluates `source` against stdin/stdout. `filename` is used
/// to resolve imports and in error reports.
pub fn run(source: &str, filename: Option<&str>) -> Result<(), MmtError> {
    let program = parse_source(source)?;

    let mut evaluator = Evaluator::new();
    if let Some(name) = filename {
        evaluator = evaluator.with_path(Path::new(name));
    }
    evaluator.evaluate_program(&program)
}

fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text)),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            None
        }
    }
}

/// Runs a source file or a serialized program and returns the process exit code.
pub fn run_file(path: &Path) -> i32 {
    let Some(text) = read_source(path) else {
        return 1;
    };
    let name = path.display().to_string();

    let is_ir = path
        .extension()
        .map(|extension| extension.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if is_ir {
        debug!("Loading serialized program {}", name);
        ir::from_json(&text)
            .and_then(|program| Evaluator::new().with_path(path).evaluate_program(&program))
            .map_err(|e| e.with_origin(&name, None))
    } else {
        debug!("Running {}", name);
        run(&text, Some(&name))
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{} failed", name);
            e.report(&text, Some(&name));
            1
        }
    }
}

/// Parses a source file and writes its serialized form to `target` instead
/// of running it.
pub fn emit_ir(path: &Path, target: &Path) -> i32 {
    let Some(source) = read_source(path) else {
        return 1;
    };
    let name = path.display().to_string();

    let json = match parse_source(&source).and_then(|program| ir::to_json(&program)) {
        Ok(json) => json,
        Err(e) => {
            e.report(&source, Some(&name));
            return 1;
        }
    };

    if let Some(dir) = target.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("Error creating directory '{}': {}", dir.display(), e);
            return 1;
        }
    }

    match fs::write(target, json) {
        Ok(()) => {
            debug!("Wrote {}", target.display());
            0
        }
        Err(e) => {
            eprintln!("Error writing file '{}': {}", target.display(), e);
            1
        }
    }
}
