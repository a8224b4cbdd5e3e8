use crate::ast::{Expr, FunctionDecl, Literal, Program, Stmt, UnaryOp};
use crate::environment::{Environment, ScopeError};
use crate::error::{MmtError, Span, Unwind};
use crate::ir;
use crate::module::{resolve_path, FileLoader, FunctionDef, Module, ModuleLoader, ModuleSource, Namespace};
use crate::operators;
use crate::parser::parse_source;
use crate::value::{ArrayRef, ObjectRef, Value};
use log::{debug, trace};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub type EvalResult<T> = Result<T, Unwind>;

/// How a statement finished. Anything but `Normal` stops the enclosing
/// statement list and is handled by the nearest loop or call.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break(Span),
    Continue(Span),
}

/// A storage location, resolved once so that reading and writing it back
/// does not evaluate the target expression twice.
enum Place {
    Variable { name: String, span: Span },
    Element { items: ArrayRef, position: usize, span: Span },
    Key { entries: ObjectRef, key: String, span: Span },
    Member { entries: ObjectRef, name: String, span: Span },
    /// An index into a value that has no assignable elements.
    Indexed { container: Value, index: Value, span: Span },
    /// A member of a value that is not an object.
    Detached { value: Value, name: String, span: Span },
}

fn runtime_error<T>(span: Span, message: String) -> EvalResult<T> {
    Err(MmtError::runtime_error(span, message).into())
}

fn io_error(span: Span, error: io::Error) -> Unwind {
    MmtError::runtime_error(span, format!("I/O error: {}", error)).into()
}

/// Records the module an error was raised in so it is reported against the
/// right file.
fn attach_origin(unwind: Unwind, module: &Rc<RefCell<Module>>) -> Unwind {
    match unwind {
        Unwind::Error(error) => {
            let module = module.borrow();
            Unwind::Error(error.with_origin(&module.display_name(), module.source.clone()))
        }
        Unwind::Exit => Unwind::Exit,
    }
}

/// Position of an element for indexing, insertion and erasure. Accepts
/// integers and floats without a fractional part.
fn index_position(index: &Value, span: Span) -> EvalResult<usize> {
    match index {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::Float(n) if n.is_finite() && n.fract() == 0.0 && *n >= 0.0 => Ok(*n as usize),
        Value::Int(_) | Value::Float(_) if index_is_negative(index) => {
            runtime_error(span, format!("Index {} must not be negative", index))
        }
        Value::Float(_) => runtime_error(span, format!("Index {} must be a whole number", index)),
        other => runtime_error(span, format!("Index must be a number, found {}", other.describe())),
    }
}

fn index_is_negative(index: &Value) -> bool {
    match index {
        Value::Int(n) => *n < 0,
        Value::Float(n) => *n < 0.0,
        _ => false,
    }
}

fn checked_index(index: &Value, len: usize, span: Span) -> EvalResult<usize> {
    let position = index_position(index, span)?;
    if position >= len {
        return runtime_error(span, format!("Index {} is out of range for length {}", position, len));
    }
    Ok(position)
}

/// Byte offset of the character at `position`, or the end of the string.
fn char_offset(text: &str, position: usize) -> usize {
    text.char_indices()
        .nth(position)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

pub struct Evaluator {
    environment: Environment,
    module: Rc<RefCell<Module>>,
    loader: Box<dyn ModuleLoader>,
    import_stack: Vec<PathBuf>,
    output: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Evaluator wired to the process's stdin/stdout that loads imports from disk.
    pub fn new() -> Self {
        Self::with_io(Box::new(io::stdout()), Box::new(io::BufReader::new(io::stdin())))
    }

    pub fn with_io(output: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        Self {
            environment: Environment::new(),
            module: Rc::new(RefCell::new(Module::default())),
            loader: Box::new(FileLoader),
            import_stack: Vec::new(),
            output,
            input,
        }
    }

    pub fn with_loader(mut self, loader: Box<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Sets the file the program was read from; imports resolve relative to it.
    pub fn with_path(self, path: &Path) -> Self {
        self.module.borrow_mut().path = Some(resolve_path(None, &path.to_string_lossy()));
        self
    }

    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), MmtError> {
        let root = self.module.borrow().path.clone();
        if let Some(path) = &root {
            self.import_stack.push(path.clone());
        }

        debug!("Evaluating {} top-level statements", program.statements.len());
        let result = self.run_top_level(&program.statements);

        if root.is_some() {
            self.import_stack.pop();
        }
        let flushed = self.output.flush();

        match result {
            Ok(()) | Err(Unwind::Exit) => {
                flushed.map_err(|e| MmtError::runtime_error(Span::default(), format!("I/O error: {}", e)))
            }
            Err(Unwind::Error(error)) => Err(error),
        }
    }

    /// Runs the statements of a program or module body, where no loop or
    /// function is there to receive a control transfer.
    fn run_top_level(&mut self, statements: &[Stmt]) -> EvalResult<()> {
        for statement in statements {
            match self.execute_statement(statement)? {
                Flow::Normal => {}
                Flow::Return(_) => {
                    return runtime_error(statement.span(), "'คืนค่า' used outside of a function".to_string());
                }
                Flow::Break(span) => {
                    return runtime_error(span, "'ออกจากการทำซ้ำ' used outside of a loop".to_string());
                }
                Flow::Continue(span) => {
                    return runtime_error(span, "'ไปยังรอบถัดไป' used outside of a loop".to_string());
                }
            }
        }
        Ok(())
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> EvalResult<Flow> {
        for statement in statements {
            let flow = self.execute_statement(statement)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Runs statements in a fresh scope that is dropped however they finish.
    fn execute_block(&mut self, statements: &[Stmt]) -> EvalResult<Flow> {
        self.environment.push_scope();
        let result = self.execute_statements(statements);
        self.environment.pop_scope();
        result
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match stmt {
            Stmt::Expression { expr, .. } => {
                self.evaluate_expression(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::VarDecl {
                name,
                is_const,
                initializer,
                span,
            } => {
                let value = match initializer {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Null,
                };
                self.declare(name, value, *is_const, *span)?;
                Ok(Flow::Normal)
            }
            Stmt::Print { args, span } => {
                for arg in args {
                    let value = self.evaluate_expression(arg)?;
                    write!(self.output, "{}", value).map_err(|e| io_error(*span, e))?;
                }
                self.output.flush().map_err(|e| io_error(*span, e))?;
                Ok(Flow::Normal)
            }
            Stmt::Input { name, span } => {
                self.output.flush().map_err(|e| io_error(*span, e))?;
                let mut line = String::new();
                self.input.read_line(&mut line).map_err(|e| io_error(*span, e))?;
                let text = line.strip_suffix('\n').unwrap_or(&line);
                let text = text.strip_suffix('\r').unwrap_or(text).to_string();
                self.assign_variable(name, Value::String(text), *span)?;
                Ok(Flow::Normal)
            }
            Stmt::Block { statements, .. } => self.execute_block(statements),
            Stmt::If {
                condition,
                then_branch,
                elif_branches,
                else_branch,
                ..
            } => {
                if self.condition(condition)? {
                    return self.execute_block(then_branch);
                }
                for branch in elif_branches {
                    if self.condition(&branch.condition)? {
                        return self.execute_block(&branch.body);
                    }
                }
                match else_branch {
                    Some(body) => self.execute_block(body),
                    None => Ok(Flow::Normal),
                }
            }
            Stmt::While { condition, body, .. } => {
                while self.condition(condition)? {
                    match self.execute_block(body)? {
                        Flow::Break(_) => break,
                        Flow::Normal | Flow::Continue(_) => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile { body, condition, .. } => {
                loop {
                    match self.execute_block(body)? {
                        Flow::Break(_) => break,
                        Flow::Normal | Flow::Continue(_) => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    if !self.condition(condition)? {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                initializer,
                condition,
                update,
                body,
                ..
            } => {
                self.environment.push_scope();
                let result = self.execute_for(initializer.as_deref(), condition.as_ref(), update.as_ref(), body);
                self.environment.pop_scope();
                result
            }
            Stmt::Break { span } => Ok(Flow::Break(*span)),
            Stmt::Continue { span } => Ok(Flow::Continue(*span)),
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Function(decl) => {
                self.define_function(decl, false);
                Ok(Flow::Normal)
            }
            Stmt::Export { functions, .. } => {
                for decl in functions {
                    self.define_function(decl, true);
                }
                Ok(Flow::Normal)
            }
            Stmt::Import { path, alias, span } => {
                self.import_module(path, alias, *span)?;
                Ok(Flow::Normal)
            }
            Stmt::Comment { .. } => Ok(Flow::Normal),
            Stmt::Exit { .. } => {
                debug!("Program requested exit");
                Err(Unwind::Exit)
            }
        }
    }

    /// Body of a `ทำซ้ำ` loop; the caller owns the scope of the initializer.
    fn execute_for(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Expr>,
        body: &[Stmt],
    ) -> EvalResult<Flow> {
        if let Some(init) = initializer {
            self.execute_statement(init)?;
        }

        loop {
            if let Some(condition) = condition {
                if !self.condition(condition)? {
                    break;
                }
            }

            match self.execute_block(body)? {
                Flow::Break(_) => break,
                Flow::Normal | Flow::Continue(_) => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }

            if let Some(update) = update {
                self.evaluate_expression(update)?;
            }
        }

        Ok(Flow::Normal)
    }

    fn condition(&mut self, expr: &Expr) -> EvalResult<bool> {
        match self.evaluate_expression(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(MmtError::runtime_error_with_help(
                expr.span(),
                format!("Condition must be a boolean, found {}", other.describe()),
                "Compare the value explicitly, e.g. (x != 0).".to_string(),
            )
            .into()),
        }
    }

    fn declare(&mut self, name: &str, value: Value, is_const: bool, span: Span) -> EvalResult<()> {
        trace!("Declare {} ({})", name, value.type_name());
        self.environment.declare(name, value, is_const).map_err(|error| match error {
            ScopeError::AlreadyDeclared => MmtError::runtime_error_with_help(
                span,
                format!("Variable '{}' is already declared in this scope", name),
                "Assign to it with 'คือ' instead of declaring it again.".to_string(),
            ),
            _ => MmtError::runtime_error(span, format!("Cannot declare '{}'", name)),
        })?;
        Ok(())
    }

    fn assign_variable(&mut self, name: &str, value: Value, span: Span) -> EvalResult<()> {
        self.environment.assign(name, value).map_err(|error| match error {
            ScopeError::Constant => MmtError::runtime_error(span, format!("Cannot assign to constant '{}'", name)),
            _ => MmtError::runtime_error_with_help(
                span,
                format!("Undefined variable '{}'", name),
                format!("Declare it first: ให้ {} คือ ...;", name),
            ),
        })?;
        Ok(())
    }

    fn define_function(&mut self, decl: &FunctionDecl, export: bool) {
        trace!("Define function {} (exported: {})", decl.name, export);
        let function = Rc::new(FunctionDef::from(decl));
        let mut module = self.module.borrow_mut();
        if export {
            module.pending_exports.insert(decl.name.clone(), Rc::clone(&function));
        }
        module.functions.insert(decl.name.clone(), function);
    }

    fn load_program(&self, source: &ModuleSource) -> Result<Program, MmtError> {
        if source.is_ir() {
            ir::from_json(&source.text)
        } else {
            parse_source(&source.text)
        }
    }

    fn import_module(&mut self, request: &str, alias: &str, span: Span) -> EvalResult<()> {
        let importer = self.module.borrow().path.clone();
        let source = self
            .loader
            .load(importer.as_deref(), request)
            .map_err(|message| MmtError::runtime_error(span, message))?;

        if self.import_stack.contains(&source.path) {
            return Err(MmtError::runtime_error_with_help(
                span,
                format!("Circular import of '{}'", source.path.display()),
                "Modules must not import each other in a cycle.".to_string(),
            )
            .into());
        }
        if source.text.trim().is_empty() {
            return runtime_error(span, format!("Module '{}' is empty", source.path.display()));
        }

        debug!("Importing {} as {}", source.path.display(), alias);
        let text: Option<Rc<str>> = (!source.is_ir()).then(|| Rc::from(source.text.as_str()));
        let module = Rc::new(RefCell::new(Module::new(Some(source.path.clone()), text)));

        let program = self
            .load_program(&source)
            .map_err(|error| attach_origin(error.into(), &module))?;

        let caller_module = std::mem::replace(&mut self.module, Rc::clone(&module));
        let caller_environment = std::mem::replace(&mut self.environment, Environment::new());
        self.import_stack.push(source.path.clone());

        let result = self.run_top_level(&program.statements);

        self.import_stack.pop();
        self.environment = caller_environment;
        self.module = caller_module;
        result.map_err(|unwind| attach_origin(unwind, &module))?;

        let exports = std::mem::take(&mut module.borrow_mut().pending_exports);
        debug!("Module {} exports {} function(s)", alias, exports.len());
        self.module
            .borrow_mut()
            .namespaces
            .insert(alias.to_string(), Namespace { module, exports });
        Ok(())
    }

    fn resolve_function(
        &self,
        namespace: Option<&str>,
        name: &str,
        span: Span,
    ) -> EvalResult<(Rc<FunctionDef>, Option<Rc<RefCell<Module>>>)> {
        let module = self.module.borrow();
        let Some(alias) = namespace else {
            return match module.functions.get(name) {
                Some(function) => Ok((Rc::clone(function), None)),
                None => runtime_error(span, format!("Undefined function '{}'", name)),
            };
        };

        let Some(imported) = module.namespaces.get(alias) else {
            return Err(MmtError::runtime_error_with_help(
                span,
                format!("Unknown module '{}'", alias),
                format!("Import it first: นำเข้า \"file.thl\" แทน {};", alias),
            )
            .into());
        };
        match imported.exports.get(name) {
            Some(function) => Ok((Rc::clone(function), Some(Rc::clone(&imported.module)))),
            None => runtime_error(span, format!("Module '{}' does not export '{}'", alias, name)),
        }
    }

    fn call_function(&mut self, namespace: Option<&str>, name: &str, args: &[Expr], span: Span) -> EvalResult<Value> {
        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            arguments.push(self.evaluate_expression(arg)?);
        }

        let (function, callee_module) = self.resolve_function(namespace, name, span)?;
        if arguments.len() != function.params.len() {
            return Err(MmtError::runtime_error_with_help(
                span,
                format!(
                    "Function '{}' expects {} argument(s) but got {}",
                    name,
                    function.params.len(),
                    arguments.len()
                ),
                format!("Parameters: ({})", function.params.join(", ")),
            )
            .into());
        }

        trace!("Call {} with {} argument(s)", name, arguments.len());
        let caller_module = callee_module.map(|module| std::mem::replace(&mut self.module, module));
        self.environment.push_scope();

        let result = self.invoke(&function, arguments, span).and_then(|flow| match flow {
            Flow::Normal => Ok(Value::Null),
            Flow::Return(value) => Ok(value),
            Flow::Break(span) => runtime_error(span, "'ออกจากการทำซ้ำ' used outside of a loop".to_string()),
            Flow::Continue(span) => runtime_error(span, "'ไปยังรอบถัดไป' used outside of a loop".to_string()),
        });

        self.environment.pop_scope();
        match caller_module {
            Some(caller) => {
                let callee = std::mem::replace(&mut self.module, caller);
                result.map_err(|unwind| attach_origin(unwind, &callee))
            }
            None => result,
        }
    }

    fn invoke(&mut self, function: &FunctionDef, arguments: Vec<Value>, span: Span) -> EvalResult<Flow> {
        for (param, value) in function.params.iter().zip(arguments) {
            self.declare(param, value, false, span)?;
        }
        self.execute_statements(&function.body)
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(n) => Value::Float(*n),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),
            Expr::Array { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_expression(element)?);
                }
                Ok(Value::array(items))
            }
            Expr::Object { entries, .. } => {
                let mut map = BTreeMap::new();
                for entry in entries {
                    let value = self.evaluate_expression(&entry.value)?;
                    map.insert(entry.key.clone(), value);
                }
                Ok(Value::object(map))
            }
            Expr::Variable { name, span } => self.read_variable(name, *span),
            Expr::Assign { target, value, span } => {
                let value = self.evaluate_expression(value)?;
                self.assign_to(target, value.clone(), *span)?;
                Ok(value)
            }
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                Ok(operators::binary(*operator, &left, &right, *span)?)
            }
            Expr::Unary { operator, operand, span } => self.evaluate_unary(*operator, operand, *span),
            Expr::Ln { operand, span } => {
                let value = self.evaluate_expression(operand)?;
                Ok(operators::natural_log(&value, *span)?)
            }
            Expr::Convert { expr, target, span } => {
                let value = self.evaluate_expression(expr)?;
                Ok(operators::convert(&value, *target, *span)?)
            }
            Expr::Length { target, span } => match self.evaluate_expression(target)? {
                Value::Array(items) => Ok(Value::Int(items.borrow().len() as i64)),
                Value::Object(entries) => Ok(Value::Int(entries.borrow().len() as i64)),
                Value::String(text) => Ok(Value::Int(text.chars().count() as i64)),
                other => runtime_error(*span, format!("Cannot take the size of {}", other.describe())),
            },
            Expr::Member { object, name, span } => match self.evaluate_expression(object)? {
                Value::Object(entries) => {
                    let member = entries.borrow().get(name).cloned();
                    match member {
                        Some(value) => Ok(value),
                        None => runtime_error(*span, format!("Object has no member '{}'", name)),
                    }
                }
                other => runtime_error(*span, format!("Cannot read member '{}' of {}", name, other.describe())),
            },
            Expr::Index { target, index, span } => {
                let container = self.evaluate_expression(target)?;
                let index = self.evaluate_expression(index)?;
                self.read_index(&container, &index, *span)
            }
            Expr::Call {
                namespace,
                name,
                args,
                span,
            } => self.call_function(namespace.as_deref(), name, args, *span),
            Expr::Push { target, value, span } => self.push(target, value, *span),
            Expr::Pop { target, span } => self.pop(target, *span),
            Expr::Insert {
                target,
                index,
                value,
                span,
            } => self.insert(target, index, value, *span),
            Expr::Erase { target, index, span } => self.erase(target, index, *span),
        }
    }

    fn evaluate_unary(&mut self, operator: UnaryOp, operand: &Expr, span: Span) -> EvalResult<Value> {
        let delta = match operator {
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => 1,
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => -1,
            _ => {
                let value = self.evaluate_expression(operand)?;
                return Ok(operators::unary(operator, &value, span)?);
            }
        };

        let (value, place) = self.method_target(operand)?;
        let updated = operators::step(operator, &value, delta, span)?;
        if let Some(place) = place {
            self.write_place(place, updated.clone(), span)?;
        }

        match operator {
            UnaryOp::PostIncrement | UnaryOp::PostDecrement => Ok(value),
            _ => Ok(updated),
        }
    }

    fn read_variable(&self, name: &str, span: Span) -> EvalResult<Value> {
        match self.environment.get(name) {
            Some(value) => Ok(value),
            None => Err(MmtError::runtime_error_with_help(
                span,
                format!("Undefined variable '{}'", name),
                format!("Declare it first: ให้ {} คือ ...;", name),
            )
            .into()),
        }
    }

    /// Evaluates the sub-expressions of an assignment target exactly once.
    fn resolve_place(&mut self, target: &Expr) -> EvalResult<Place> {
        match target {
            Expr::Variable { name, span } => Ok(Place::Variable {
                name: name.clone(),
                span: *span,
            }),
            Expr::Index { target, index, span } => {
                let container = self.evaluate_expression(target)?;
                let index = self.evaluate_expression(index)?;
                match container {
                    Value::Array(items) => {
                        let position = checked_index(&index, items.borrow().len(), *span)?;
                        Ok(Place::Element {
                            items,
                            position,
                            span: *span,
                        })
                    }
                    Value::Object(entries) => match index {
                        Value::String(key) => Ok(Place::Key {
                            entries,
                            key,
                            span: *span,
                        }),
                        other => runtime_error(*span, format!("Object keys must be strings, found {}", other.describe())),
                    },
                    container => Ok(Place::Indexed {
                        container,
                        index,
                        span: *span,
                    }),
                }
            }
            Expr::Member { object, name, span } => match self.evaluate_expression(object)? {
                Value::Object(entries) => Ok(Place::Member {
                    entries,
                    name: name.clone(),
                    span: *span,
                }),
                value => Ok(Place::Detached {
                    value,
                    name: name.clone(),
                    span: *span,
                }),
            },
            other => runtime_error(other.span(), "Invalid assignment target".to_string()),
        }
    }

    fn read_place(&self, place: &Place) -> EvalResult<Value> {
        match place {
            Place::Variable { name, span } => self.read_variable(name, *span),
            Place::Element { items, position, span } => match items.borrow().get(*position) {
                Some(value) => Ok(value.clone()),
                None => runtime_error(*span, format!("Index {} is out of range", position)),
            },
            Place::Key { entries, key, span } => match entries.borrow().get(key) {
                Some(value) => Ok(value.clone()),
                None => runtime_error(*span, format!("Object has no key \"{}\"", key)),
            },
            Place::Member { entries, name, span } => match entries.borrow().get(name) {
                Some(value) => Ok(value.clone()),
                None => runtime_error(*span, format!("Object has no member '{}'", name)),
            },
            Place::Indexed { container, index, span } => self.read_index(container, index, *span),
            Place::Detached { value, name, span } => {
                runtime_error(*span, format!("Cannot read member '{}' of {}", name, value.describe()))
            }
        }
    }

    /// Stores into a resolved place. `span` is the assignment's span, used
    /// for errors about the variable itself.
    fn write_place(&mut self, place: Place, value: Value, span: Span) -> EvalResult<()> {
        match place {
            Place::Variable { name, .. } => self.assign_variable(&name, value, span),
            Place::Element {
                items,
                position,
                span: index_span,
            } => {
                let mut items = items.borrow_mut();
                let len = items.len();
                match items.get_mut(position) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => runtime_error(index_span, format!("Index {} is out of range for length {}", position, len)),
                }
            }
            Place::Key { entries, key, .. } => {
                entries.borrow_mut().insert(key, value);
                Ok(())
            }
            Place::Member { entries, name, .. } => {
                entries.borrow_mut().insert(name, value);
                Ok(())
            }
            Place::Indexed {
                container,
                span: index_span,
                ..
            } => runtime_error(index_span, format!("Cannot assign to an element of {}", container.describe())),
            Place::Detached {
                value: object,
                name,
                span: member_span,
            } => runtime_error(member_span, format!("Cannot set member '{}' of {}", name, object.describe())),
        }
    }

    /// Stores `value` into a variable, array element or object member.
    fn assign_to(&mut self, target: &Expr, value: Value, span: Span) -> EvalResult<()> {
        let place = self.resolve_place(target)?;
        self.write_place(place, value, span)
    }

    /// Current value of a method or step target, with its location when the
    /// target names one.
    fn method_target(&mut self, target: &Expr) -> EvalResult<(Value, Option<Place>)> {
        if !target.is_lvalue() {
            return Ok((self.evaluate_expression(target)?, None));
        }
        let place = self.resolve_place(target)?;
        let value = self.read_place(&place)?;
        Ok((value, Some(place)))
    }

    fn read_index(&self, container: &Value, index: &Value, span: Span) -> EvalResult<Value> {
        match container {
            Value::Array(items) => {
                let items = items.borrow();
                let position = checked_index(index, items.len(), span)?;
                Ok(items[position].clone())
            }
            Value::String(text) => {
                let position = checked_index(index, text.chars().count(), span)?;
                Ok(Value::String(text.chars().skip(position).take(1).collect()))
            }
            Value::Object(entries) => match index {
                Value::String(key) => match entries.borrow().get(key) {
                    Some(value) => Ok(value.clone()),
                    None => runtime_error(span, format!("Object has no key \"{}\"", key)),
                },
                other => runtime_error(span, format!("Object keys must be strings, found {}", other.describe())),
            },
            other => runtime_error(span, format!("Cannot index into {}", other.describe())),
        }
    }

    /// Strings are values, so string edits are written back to the place the
    /// target named.
    fn store_string(&mut self, place: Option<Place>, text: String, span: Span) -> EvalResult<()> {
        if let Some(place) = place {
            self.write_place(place, Value::String(text), span)?;
        }
        Ok(())
    }

    fn push(&mut self, target: &Expr, value: &Expr, span: Span) -> EvalResult<Value> {
        let (container, place) = self.method_target(target)?;
        let item = self.evaluate_expression(value)?;
        match (container, item) {
            (Value::Array(items), item) => {
                items.borrow_mut().push(item);
            }
            (Value::String(mut text), Value::String(suffix)) => {
                text.push_str(&suffix);
                self.store_string(place, text, span)?;
            }
            (Value::String(_), other) => {
                return runtime_error(span, format!("Cannot append {} to a string", other.describe()));
            }
            (other, _) => {
                return runtime_error(span, format!("Cannot use 'เพิ่ม' on {}", other.describe()));
            }
        }
        Ok(Value::Null)
    }

    fn pop(&mut self, target: &Expr, span: Span) -> EvalResult<Value> {
        let (container, place) = self.method_target(target)?;
        match container {
            Value::Array(items) => {
                let popped = items.borrow_mut().pop();
                match popped {
                    Some(item) => Ok(item),
                    None => runtime_error(span, "Cannot pop from an empty array".to_string()),
                }
            }
            Value::String(mut text) => match text.pop() {
                Some(c) => {
                    self.store_string(place, text, span)?;
                    Ok(Value::String(c.to_string()))
                }
                None => runtime_error(span, "Cannot pop from an empty string".to_string()),
            },
            other => runtime_error(span, format!("Cannot use 'ดึงออก' on {}", other.describe())),
        }
    }

    fn insert(&mut self, target: &Expr, index: &Expr, value: &Expr, span: Span) -> EvalResult<Value> {
        let (container, place) = self.method_target(target)?;
        let index = self.evaluate_expression(index)?;
        let item = self.evaluate_expression(value)?;
        let position = index_position(&index, span)?;

        match (container, item) {
            (Value::Array(items), item) => {
                let mut items = items.borrow_mut();
                if position > items.len() {
                    return runtime_error(
                        span,
                        format!("Insert position {} is out of range for length {}", position, items.len()),
                    );
                }
                items.insert(position, item);
            }
            (Value::String(mut text), Value::String(fragment)) => {
                let len = text.chars().count();
                if position > len {
                    return runtime_error(
                        span,
                        format!("Insert position {} is out of range for length {}", position, len),
                    );
                }
                text.insert_str(char_offset(&text, position), &fragment);
                self.store_string(place, text, span)?;
            }
            (Value::String(_), other) => {
                return runtime_error(span, format!("Cannot insert {} into a string", other.describe()));
            }
            (other, _) => {
                return runtime_error(span, format!("Cannot use 'แทรก' on {}", other.describe()));
            }
        }
        Ok(Value::Null)
    }

    fn erase(&mut self, target: &Expr, index: &Expr, span: Span) -> EvalResult<Value> {
        let (container, place) = self.method_target(target)?;
        let index = self.evaluate_expression(index)?;

        match container {
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if items.is_empty() {
                    return runtime_error(span, "Cannot erase from an empty array".to_string());
                }
                let position = checked_index(&index, items.len(), span)?;
                Ok(items.remove(position))
            }
            Value::String(mut text) => {
                let len = text.chars().count();
                if len == 0 {
                    return runtime_error(span, "Cannot erase from an empty string".to_string());
                }
                let position = checked_index(&index, len, span)?;
                let removed = text.remove(char_offset(&text, position));
                self.store_string(place, text, span)?;
                Ok(Value::String(removed.to_string()))
            }
            other => runtime_error(span, format!("Cannot use 'ลบ' on {}", other.describe())),
        }
    }
}
