use crate::ast::{FunctionDecl, Stmt};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

impl From<&FunctionDecl> for FunctionDef {
    fn from(decl: &FunctionDecl) -> Self {
        Self {
            name: decl.name.clone(),
            params: decl.params.clone(),
            body: decl.body.clone(),
        }
    }
}

/// Per-file evaluation context: the functions a file declared, the modules
/// it imported, and the exports waiting to be collected by its importer.
#[derive(Debug, Default)]
pub struct Module {
    pub path: Option<PathBuf>,
    pub source: Option<Rc<str>>,
    pub functions: HashMap<String, Rc<FunctionDef>>,
    pub namespaces: HashMap<String, Namespace>,
    pub pending_exports: HashMap<String, Rc<FunctionDef>>,
}

impl Module {
    pub fn new(path: Option<PathBuf>, source: Option<Rc<str>>) -> Self {
        Self {
            path,
            source,
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> String {
        self.path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<input>".to_string())
    }
}

/// An imported module as seen through its alias. Calls through the alias
/// run with `module` as the current module so the callee finds its own
/// helpers and imports.
#[derive(Debug, Clone)]
pub struct Namespace {
    pub module: Rc<RefCell<Module>>,
    pub exports: HashMap<String, Rc<FunctionDef>>,
}

/// Text of a module together with the path it was resolved to.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    pub path: PathBuf,
    pub text: String,
}

impl ModuleSource {
    /// Serialized IR is recognised by its `.json` extension.
    pub fn is_ir(&self) -> bool {
        self.path
            .extension()
            .map(|extension| extension.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

pub trait ModuleLoader {
    /// Resolves `request` relative to the importing file (`None` for source
    /// that did not come from a file) and returns its contents.
    fn load(&self, importer: Option<&Path>, request: &str) -> Result<ModuleSource, String>;
}

/// Joins `request` onto the importer's directory and folds away `.` and
/// `..` components so the same file always maps to the same path.
pub fn resolve_path(importer: Option<&Path>, request: &str) -> PathBuf {
    let request = Path::new(request);
    let joined = match importer.and_then(Path::parent) {
        Some(dir) if !request.is_absolute() => dir.join(request),
        _ => request.to_path_buf(),
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn strip_bom(text: String) -> String {
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Loads modules from disk. Paths without an importing file resolve against
/// the working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl ModuleLoader for FileLoader {
    fn load(&self, importer: Option<&Path>, request: &str) -> Result<ModuleSource, String> {
        let path = resolve_path(importer, request);
        let text = fs::read_to_string(&path).map_err(|e| format!("Cannot read module '{}': {}", path.display(), e))?;
        Ok(ModuleSource {
            path,
            text: strip_bom(text),
        })
    }
}

/// Serves modules from a map of paths to contents, for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, text: &str) -> Self {
        self.files.insert(resolve_path(None, path), text.to_string());
        self
    }
}

impl ModuleLoader for MemoryLoader {
    fn load(&self, importer: Option<&Path>, request: &str) -> Result<ModuleSource, String> {
        let path = resolve_path(importer, request);
        let text = self
            .files
            .get(&path)
            .cloned()
            .ok_or_else(|| format!("Cannot read module '{}': no such file", path.display()))?;
        Ok(ModuleSource { path, text })
    }
}
