use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::builtins;
use crate::env::{AssignError, EnvRef, Environment};
use crate::object::{Function, HashKey, HashPair, Object};
use std::collections::HashMap;
use std::rc::Rc;

/// Evaluate a whole program against a root environment. Yields `None`
/// for an empty program or one whose final statement produces no value
/// (a successful `let` or reassignment); a top-level `return` is
/// unwrapped to its inner value, and the first error stops everything.
pub fn eval_program(program: &Program, env: &EnvRef) -> Option<Object> {
    let mut result = None;

    for statement in &program.statements {
        match eval_statement(statement, env) {
            Some(Object::ReturnValue(value)) => return Some(*value),
            Some(Object::Error(message)) => return Some(Object::Error(message)),
            other => result = other,
        }
    }

    result
}

fn eval_statement(statement: &Stmt, env: &EnvRef) -> Option<Object> {
    match statement {
        Stmt::Let {
            name,
            value,
            mutable,
        } => {
            let value = eval_expression(value, env);
            if short_circuits(&value) {
                return Some(value);
            }

            if env.borrow().contains_local(name) {
                return Some(Object::Error(format!(
                    "identifier '{}' already exists",
                    name
                )));
            }

            env.borrow_mut().define(name.clone(), value, *mutable);
            None
        }
        Stmt::Reassign { name, value } => {
            let value = eval_expression(value, env);
            if short_circuits(&value) {
                return Some(value);
            }

            match env.borrow_mut().assign(name, value) {
                Ok(()) => None,
                Err(AssignError::Immutable) => Some(Object::Error(format!(
                    "identifier '{}' is not mutable",
                    name
                ))),
                Err(AssignError::NotFound) => {
                    Some(Object::Error(format!("identifier not found: {}", name)))
                }
            }
        }
        Stmt::Return { value } => {
            let value = match value {
                Some(expr) => eval_expression(expr, env),
                None => Object::Null,
            };

            match value {
                Object::Error(_) | Object::ReturnValue(_) => Some(value),
                value => Some(Object::ReturnValue(Box::new(value))),
            }
        }
        Stmt::Expression { expr } => Some(eval_expression(expr, env)),
    }
}

/// Evaluate a block's statements in order. A `ReturnValue` or an `Error`
/// passes through still wrapped, so the enclosing construct decides what
/// to do with it.
fn eval_block(block: &Block, env: &EnvRef) -> Option<Object> {
    let mut result = None;

    for statement in &block.statements {
        match eval_statement(statement, env) {
            Some(value @ (Object::ReturnValue(_) | Object::Error(_))) => return Some(value),
            other => result = other,
        }
    }

    result
}

fn eval_expression(expr: &Expr, env: &EnvRef) -> Object {
    match expr {
        Expr::Identifier(name) => eval_identifier(name, env),
        Expr::Integer(value) => Object::Integer(*value),
        Expr::String(value) => Object::String(value.clone()),
        Expr::Boolean(value) => Object::Boolean(*value),
        Expr::Array(elements) => match eval_expressions(elements, env) {
            Ok(elements) => Object::Array(Rc::new(elements)),
            Err(interrupt) => interrupt,
        },
        Expr::Hash(pairs) => eval_hash_literal(pairs, env),
        Expr::Prefix { operator, right } => {
            let right = eval_expression(right, env);
            if short_circuits(&right) {
                return right;
            }
            eval_prefix_expression(*operator, right)
        }
        Expr::Infix {
            operator,
            left,
            right,
        } => {
            let left = eval_expression(left, env);
            if short_circuits(&left) {
                return left;
            }
            let right = eval_expression(right, env);
            if short_circuits(&right) {
                return right;
            }
            eval_infix_expression(*operator, left, right)
        }
        Expr::If {
            condition,
            consequence,
            alternative,
        } => eval_if_expression(condition, consequence, alternative.as_ref(), env),
        Expr::For { condition, body } => eval_for_expression(condition, body, env),
        Expr::Function { parameters, body } => Object::Function(Rc::new(Function {
            parameters: parameters.clone(),
            body: body.clone(),
            env: Rc::clone(env),
        })),
        Expr::Call {
            function,
            arguments,
        } => {
            let callee = eval_expression(function, env);
            if short_circuits(&callee) {
                return callee;
            }

            match eval_expressions(arguments, env) {
                Ok(arguments) => apply_function(callee, arguments),
                Err(interrupt) => interrupt,
            }
        }
        Expr::Index { left, index } => {
            let left = eval_expression(left, env);
            if short_circuits(&left) {
                return left;
            }
            let index = eval_expression(index, env);
            if short_circuits(&index) {
                return index;
            }
            eval_index_expression(left, index)
        }
        Expr::Placeholder => {
            Object::Error("'$' placeholder used outside of a pipe expression".to_string())
        }
    }
}

fn eval_identifier(name: &str, env: &EnvRef) -> Object {
    if let Some(value) = env.borrow().get(name) {
        return value;
    }

    if let Some(builtin) = builtins::lookup(name) {
        return Object::Builtin(builtin);
    }

    Object::Error(format!("identifier not found: {}", name))
}

fn eval_expressions(exprs: &[Expr], env: &EnvRef) -> Result<Vec<Object>, Object> {
    let mut results = Vec::with_capacity(exprs.len());

    for expr in exprs {
        let value = eval_expression(expr, env);
        if short_circuits(&value) {
            return Err(value);
        }
        results.push(value);
    }

    Ok(results)
}

fn eval_prefix_expression(operator: PrefixOp, right: Object) -> Object {
    match operator {
        PrefixOp::Not => Object::Boolean(!right.is_truthy()),
        PrefixOp::Neg => match right {
            Object::Integer(value) => Object::Integer(value.wrapping_neg()),
            other => Object::Error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix_expression(operator: InfixOp, left: Object, right: Object) -> Object {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => {
            eval_integer_infix_expression(operator, *l, *r)
        }
        (Object::String(l), Object::String(r)) => match operator {
            InfixOp::Add => Object::String(format!("{}{}", l, r)),
            InfixOp::Eq => Object::Boolean(l == r),
            InfixOp::NotEq => Object::Boolean(l != r),
            _ => Object::Error(format!("unknown operator: STRING {} STRING", operator)),
        },
        _ => match operator {
            // Identity comparison: two structurally equal but distinct
            // arrays, hash maps, or functions are never ==
            InfixOp::Eq => Object::Boolean(left == right),
            InfixOp::NotEq => Object::Boolean(left != right),
            _ if left.type_name() != right.type_name() => Object::Error(format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
            _ => Object::Error(format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
        },
    }
}

fn eval_integer_infix_expression(operator: InfixOp, left: i64, right: i64) -> Object {
    match operator {
        InfixOp::Add => Object::Integer(left.wrapping_add(right)),
        InfixOp::Sub => Object::Integer(left.wrapping_sub(right)),
        InfixOp::Mul => Object::Integer(left.wrapping_mul(right)),
        InfixOp::Div => {
            if right == 0 {
                Object::Error("division by zero".to_string())
            } else {
                Object::Integer(left.wrapping_div(right))
            }
        }
        InfixOp::Lt => Object::Boolean(left < right),
        InfixOp::Gt => Object::Boolean(left > right),
        InfixOp::Eq => Object::Boolean(left == right),
        InfixOp::NotEq => Object::Boolean(left != right),
    }
}

fn eval_if_expression(
    condition: &Expr,
    consequence: &Block,
    alternative: Option<&Block>,
    env: &EnvRef,
) -> Object {
    let condition = eval_expression(condition, env);
    if short_circuits(&condition) {
        return condition;
    }

    if condition.is_truthy() {
        eval_block(consequence, env).unwrap_or(Object::Null)
    } else if let Some(alternative) = alternative {
        eval_block(alternative, env).unwrap_or(Object::Null)
    } else {
        Object::Null
    }
}

/// Pre-test loop. The body's `ReturnValue` leaves still wrapped: a
/// `return` inside the loop exits the whole surrounding evaluation, not
/// just the loop. Normal termination yields `null`.
fn eval_for_expression(condition: &Expr, body: &Block, env: &EnvRef) -> Object {
    loop {
        let condition = eval_expression(condition, env);
        if short_circuits(&condition) {
            return condition;
        }

        if !condition.is_truthy() {
            break;
        }

        if let Some(result) = eval_block(body, env) {
            if matches!(result, Object::ReturnValue(_) | Object::Error(_)) {
                return result;
            }
        }
    }

    Object::Null
}

fn apply_function(callee: Object, arguments: Vec<Object>) -> Object {
    match callee {
        Object::Function(function) => {
            if arguments.len() != function.parameters.len() {
                return Object::Error(format!(
                    "wrong number of arguments. got={}, expected={}",
                    arguments.len(),
                    function.parameters.len()
                ));
            }

            // One fresh scope per call, extending the environment the
            // function captured at its definition site (never the caller's)
            let call_env = Environment::enclosed(&function.env);
            for (parameter, argument) in function.parameters.iter().zip(arguments) {
                call_env
                    .borrow_mut()
                    .define(parameter.clone(), argument, false);
            }

            let result = eval_block(&function.body, &call_env).unwrap_or(Object::Null);
            unwrap_return_value(result)
        }
        Object::Builtin(builtin) => (builtin.func)(arguments),
        other => Object::Error(format!("not a function: {}", other.type_name())),
    }
}

fn unwrap_return_value(value: Object) -> Object {
    match value {
        Object::ReturnValue(inner) => *inner,
        value => value,
    }
}

fn eval_index_expression(left: Object, index: Object) -> Object {
    match left {
        Object::Array(elements) => match index {
            Object::Integer(i) => eval_array_index(&elements, i),
            other => Object::Error(format!(
                "type of {} cannot be used to index ARRAY",
                other.type_name()
            )),
        },
        Object::HashMap(pairs) => match index.hash_key() {
            Some(key) => match pairs.get(&key) {
                Some(pair) => pair.value.clone(),
                None => Object::Null,
            },
            None => Object::Error(format!(
                "type of {} cannot be used as hash key",
                index.type_name()
            )),
        },
        Object::String(value) => match index {
            Object::Integer(i) => eval_string_index(&value, i),
            other => Object::Error(format!(
                "type of {} cannot be used to index STRING",
                other.type_name()
            )),
        },
        other => Object::Error(format!("cannot index {}", other.type_name())),
    }
}

/// `-1` is the last element; every other out-of-range or negative index
/// is `null`, never a failure.
fn eval_array_index(elements: &[Object], index: i64) -> Object {
    let length = elements.len() as i64;

    if length == 0 {
        return Object::Null;
    }

    let effective = if index == -1 { length - 1 } else { index };

    if effective < 0 || effective >= length {
        return Object::Null;
    }

    elements[effective as usize].clone()
}

fn eval_string_index(value: &str, index: i64) -> Object {
    let length = value.chars().count() as i64;

    if length == 0 {
        return Object::Null;
    }

    let effective = if index == -1 { length - 1 } else { index };

    if effective < 0 || effective >= length {
        return Object::Null;
    }

    match value.chars().nth(effective as usize) {
        Some(c) => Object::String(c.to_string()),
        None => Object::Null,
    }
}

fn eval_hash_literal(pairs: &[(Expr, Expr)], env: &EnvRef) -> Object {
    let mut map: HashMap<HashKey, HashPair> = HashMap::new();

    for (key_expr, value_expr) in pairs {
        let key = eval_expression(key_expr, env);
        if short_circuits(&key) {
            return key;
        }

        let hash_key = match key.hash_key() {
            Some(hash_key) => hash_key,
            None => {
                return Object::Error(format!(
                    "type of {} cannot be used as hash key",
                    key.type_name()
                ))
            }
        };

        let value = eval_expression(value_expr, env);
        if short_circuits(&value) {
            return value;
        }

        // Duplicate keys overwrite
        map.insert(hash_key, HashPair { key, value });
    }

    Object::HashMap(Rc::new(map))
}

/// An `Error` or a still-wrapped `ReturnValue` aborts whatever expression
/// evaluation is in flight and propagates outward untouched.
fn short_circuits(value: &Object) -> bool {
    matches!(value, Object::Error(_) | Object::ReturnValue(_))
}
