use crate::object::{Builtin, BuiltinFn, Object};
use std::rc::Rc;

/// The fixed table of native operations. Names resolve only after the
/// environment chain misses, so a user binding can shadow any of these.
pub fn lookup(name: &str) -> Option<Builtin> {
    let (name, func): (&'static str, BuiltinFn) = match name {
        "len" => ("len", builtin_len),
        "first" => ("first", builtin_first),
        "last" => ("last", builtin_last),
        "rest" => ("rest", builtin_rest),
        "push" => ("push", builtin_push),
        "typeof" => ("typeof", builtin_typeof),
        "debug" => ("debug", builtin_debug),
        "println" => ("println", builtin_println),
        "printf" => ("printf", builtin_printf),
        _ => return None,
    };

    Some(Builtin { name, func })
}

fn wrong_arity(got: usize, expected: usize) -> Object {
    Object::Error(format!(
        "wrong number of arguments. got={}, expected={}",
        got, expected
    ))
}

fn builtin_len(args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    match &args[0] {
        Object::Array(elements) => Object::Integer(elements.len() as i64),
        Object::String(value) => Object::Integer(value.chars().count() as i64),
        other => Object::Error(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_first(args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    match &args[0] {
        Object::Array(elements) => match elements.first() {
            Some(element) => element.clone(),
            None => Object::Null,
        },
        Object::String(value) => match value.chars().next() {
            Some(c) => Object::String(c.to_string()),
            None => Object::Null,
        },
        other => Object::Error(format!(
            "argument to `first` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_last(args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    match &args[0] {
        Object::Array(elements) => match elements.last() {
            Some(element) => element.clone(),
            None => Object::Null,
        },
        Object::String(value) => match value.chars().last() {
            Some(c) => Object::String(c.to_string()),
            None => Object::Null,
        },
        other => Object::Error(format!(
            "argument to `last` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_rest(args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    match &args[0] {
        Object::Array(elements) => {
            if elements.is_empty() {
                return Object::Null;
            }
            Object::Array(Rc::new(elements[1..].to_vec()))
        }
        Object::String(value) => {
            if value.is_empty() {
                return Object::Null;
            }
            Object::String(value.chars().skip(1).collect())
        }
        other => Object::Error(format!(
            "argument to `rest` not supported, got {}",
            other.type_name()
        )),
    }
}

/// Copy-on-write append: the argument array is never touched.
fn builtin_push(args: Vec<Object>) -> Object {
    if args.len() != 2 {
        return wrong_arity(args.len(), 2);
    }

    match &args[0] {
        Object::Array(elements) => {
            let mut appended = elements.as_ref().clone();
            appended.push(args[1].clone());
            Object::Array(Rc::new(appended))
        }
        other => Object::Error(format!(
            "argument to `push` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_typeof(args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    Object::String(args[0].type_name().to_string())
}

fn builtin_debug(args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    println!("{}", args[0]);
    Object::Null
}

fn builtin_println(args: Vec<Object>) -> Object {
    for arg in &args {
        println!("{}", arg);
    }

    Object::Null
}

/// `printf("{} and {}", a, b)`: `{}` placeholders are filled left to
/// right; only strings and integers may be substituted. The template is
/// validated before anything is printed.
fn builtin_printf(args: Vec<Object>) -> Object {
    if args.len() < 2 {
        return Object::Error(format!(
            "wrong number of arguments. got={}, expected at least 2",
            args.len()
        ));
    }

    let template = match &args[0] {
        Object::String(value) => value,
        other => {
            return Object::Error(format!(
                "first argument has to be a string. got={}",
                other.type_name()
            ))
        }
    };

    let mut substitutions = Vec::new();
    for arg in &args[1..] {
        match arg {
            Object::String(value) => substitutions.push(value.clone()),
            Object::Integer(value) => substitutions.push(value.to_string()),
            other => {
                return Object::Error(format!(
                    "only strings and integers can be used with 'printf'. got={}",
                    other.type_name()
                ))
            }
        }
    }

    let mut out = String::new();
    let mut values = substitutions.into_iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            if let Some(value) = values.next() {
                chars.next();
                out.push_str(&value);
                continue;
            }
        }
        out.push(c);
    }

    println!("{}", out);
    Object::Null
}
