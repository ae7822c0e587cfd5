use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to an environment. Closures clone this handle, so a
/// captured scope stays alive exactly as long as something can still
/// reach it.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Clone)]
struct Binding {
    value: Object,
    mutable: bool,
}

/// One lexical scope: a name table plus an optional enclosing scope.
/// Lookup walks outward; definition always targets this scope; assignment
/// walks outward to the scope that owns the binding.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Binding>,
    outer: Option<EnvRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    NotFound,
    Immutable,
}

impl Environment {
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn enclosed(outer: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => match &self.outer {
                Some(outer) => outer.borrow().get(name),
                None => None,
            },
        }
    }

    /// True when this scope itself binds `name`; outer scopes are not
    /// consulted, which is what allows shadowing across function calls.
    pub fn contains_local(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    pub fn define(&mut self, name: String, value: Object, mutable: bool) {
        self.store.insert(name, Binding { value, mutable });
    }

    pub fn assign(&mut self, name: &str, value: Object) -> Result<(), AssignError> {
        if let Some(binding) = self.store.get_mut(name) {
            if !binding.mutable {
                return Err(AssignError::Immutable);
            }
            binding.value = value;
            Ok(())
        } else if let Some(outer) = &self.outer {
            outer.borrow_mut().assign(name, value)
        } else {
            Err(AssignError::NotFound)
        }
    }
}
