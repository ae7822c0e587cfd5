use crate::ast::Block;
use crate::env::EnvRef;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type BuiltinFn = fn(Vec<Object>) -> Object;

/// A native operation from the fixed builtin table.
#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// A user function value: parameters, body, and the environment captured
/// at the site of the `fn` literal (shared, not copied).
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Block,
    pub env: EnvRef,
}

/// The closed runtime value union. Composite values (arrays, hash maps,
/// functions) are `Rc`-shared: cloning an `Object` clones a handle, and
/// `==` on them is handle identity.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    String(String),
    Boolean(bool),
    Null,
    Array(Rc<Vec<Object>>),
    HashMap(Rc<HashMap<HashKey, HashPair>>),
    Function(Rc<Function>),
    Builtin(Builtin),
    /// Internal wrapper that carries a `return` outward through blocks;
    /// unwrapped at the function or program boundary, never user-visible.
    ReturnValue(Box<Object>),
    Error(String),
}

/// Key form for hash maps; only integers, strings, and booleans qualify.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::String(_) => "STRING",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::Array(_) => "ARRAY",
            Object::HashMap(_) => "HASHMAP",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
        }
    }

    /// Only `null` and `false` are falsy; every other value, including
    /// integer zero, counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(value) => Some(HashKey::Integer(*value)),
            Object::String(value) => Some(HashKey::String(value.clone())),
            Object::Boolean(value) => Some(HashKey::Boolean(*value)),
            _ => None,
        }
    }
}

/// Equality exactly as the language's `==` sees it: integers, strings,
/// booleans, and null structurally; arrays, hash maps, and functions by
/// identity of the shared handle; builtins by native fn identity.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(l), Object::Integer(r)) => l == r,
            (Object::String(l), Object::String(r)) => l == r,
            (Object::Boolean(l), Object::Boolean(r)) => l == r,
            (Object::Null, Object::Null) => true,
            (Object::Array(l), Object::Array(r)) => Rc::ptr_eq(l, r),
            (Object::HashMap(l), Object::HashMap(r)) => Rc::ptr_eq(l, r),
            (Object::Function(l), Object::Function(r)) => Rc::ptr_eq(l, r),
            (Object::Builtin(l), Object::Builtin(r)) => l.func as usize == r.func as usize,
            (Object::ReturnValue(l), Object::ReturnValue(r)) => l == r,
            (Object::Error(l), Object::Error(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::String(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::Null => write!(f, "null"),
            Object::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Object::HashMap(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
            Object::Function(function) => {
                write!(f, "fn({}) {{ {} }}", function.parameters.join(", "), function.body)
            }
            Object::Builtin(_) => write!(f, "builtin function"),
            Object::ReturnValue(value) => write!(f, "{}", value),
            Object::Error(message) => write!(f, "{}", message),
        }
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

// The captured environment is omitted: it can reach back to this very
// function, and walking it would never terminate.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish()
    }
}
