//! Run‑time scopes.
//!
//! An [`Environment`] is one scope of name → value bindings plus an optional
//! link to the enclosing scope.  Scopes are shared through
//! `Rc<RefCell<Environment>>` because a closure may keep its defining scope
//! alive after the block that created it has exited; many children may point
//! at the same parent.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a scope.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root scope with no parent (the globals).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this scope only; rebinding an existing name overwrites it.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up here, then outward along the chain.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrite the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Read `name` from exactly this scope, without walking outward.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// The scope `distance` hops up from `env`.  A chain shorter than
    /// `distance` means the resolver and the interpreter disagree, which is
    /// reported rather than papered over.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Result<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for hop in 0..distance {
            let parent: Option<EnvRef> = current.borrow().enclosing.clone();

            match parent {
                Some(parent) => current = parent,
                None => {
                    return Err(LoxError::runtime(format!(
                        "Scope chain ended after {} of {} hops.",
                        hop, distance
                    )));
                }
            }
        }

        Ok(current)
    }

    /// Read a resolved local `distance` scopes up.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
        debug!("get_at '{}' distance {}", name.lexeme, distance);

        let scope: EnvRef = Self::ancestor(env, distance)?;
        let value: Option<Value> = scope.borrow().get_here(&name.lexeme);

        value.ok_or_else(|| undefined(name))
    }

    /// Variant of [`get_at`](Self::get_at) for implicit names (`this`, `super`).
    pub fn get_name_at(env: &EnvRef, distance: usize, name: &str) -> Result<Value> {
        let scope: EnvRef = Self::ancestor(env, distance)?;
        let value: Option<Value> = scope.borrow().get_here(name);

        value.ok_or_else(|| LoxError::runtime(format!("Undefined variable '{}'.", name)))
    }

    /// Write a resolved local `distance` scopes up.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
        debug!("assign_at '{}' distance {}", name.lexeme, distance);

        let scope: EnvRef = Self::ancestor(env, distance)?;
        scope.borrow_mut().define(&name.lexeme, value);

        Ok(())
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime_at(name, format!("Undefined variable '{}'.", name.lexeme))
}
