use crate::env::{EnvRef, Environment};
use crate::evaluator::eval_program;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, Write};

/// Interactive loop with a single root environment that persists across
/// inputs, so bindings from one line are visible on the next.
pub fn start() {
    println!("Rill v0.1.0");
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let env = Environment::new();

    loop {
        print!(">> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }

                eval_line(line, &env);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn eval_line(source: &str, env: &EnvRef) {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        for error in parser.errors() {
            error.report(source, None);
        }
        return;
    }

    if let Some(result) = eval_program(&program, env) {
        println!("{}", result);
    }
}
