use crate::value::Value;
use log::trace;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeError {
    AlreadyDeclared,
    Undefined,
    Constant,
}

/// Stack of scopes. The bottom scope is the global scope of the running
/// module; blocks, loop iterations and calls push and pop on top of it.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<HashMap<String, Binding>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
        trace!("Entered scope {}", self.scopes.len());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        trace!("Left scope {}", self.scopes.len() + 1);
    }

    /// Creates a binding in the innermost scope. Shadowing an outer binding
    /// is allowed, redeclaring in the same scope is not.
    pub fn declare(&mut self, name: &str, value: Value, is_const: bool) -> Result<(), ScopeError> {
        let scope = self.scopes.last_mut().ok_or(ScopeError::Undefined)?;
        if scope.contains_key(name) {
            return Err(ScopeError::AlreadyDeclared);
        }
        scope.insert(name.to_string(), Binding { value, is_const });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .map(|binding| binding.value.clone())
    }

    /// Rebinds the innermost visible binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        let binding = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .ok_or(ScopeError::Undefined)?;

        if binding.is_const {
            return Err(ScopeError::Constant);
        }
        binding.value = value;
        Ok(())
    }
}
