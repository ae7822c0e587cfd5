use crate::env::Environment;
use crate::evaluator::eval_program;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Run a complete source text against a fresh root environment. Parse
/// diagnostics are rendered as reports and stop the run; otherwise the
/// final value's display form is printed (runtime errors included —
/// their message is the display form).
pub fn run(source: &str, filename: Option<&str>) {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        for error in parser.errors() {
            error.report(source, filename);
        }
        return;
    }

    let env = Environment::new();
    if let Some(result) = eval_program(&program, &env) {
        println!("{}", result);
    }
}
