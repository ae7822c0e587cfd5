// Parser robustness tests.
//
// The parser never aborts: it collects diagnostics and keeps going from
// the next statement boundary. These suites check that malformed input
// produces the right diagnostics (and never a crash), and that valid
// input stays diagnostic-free.

use rill::{Lexer, Parser};

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_be_clean: bool,
    pub expected_error_contains: Option<String>,
}

impl TestCase {
    pub fn clean(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_be_clean: true,
            expected_error_contains: None,
        }
    }

    pub fn diagnosed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_be_clean: false,
            expected_error_contains: None,
        }
    }

    pub fn diagnosed_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_be_clean: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ok {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  FAIL {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  CRASH {}: {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Parse input, returning the collected diagnostic messages
fn parse_diagnostics(input: &str) -> Vec<String> {
    let mut parser = Parser::new(Lexer::new(input));
    parser.parse_program();
    parser
        .errors()
        .iter()
        .map(|error| error.message.clone())
        .collect()
}

fn run_single_test(test: &TestCase) -> TestResult {
    // Catch panics: a parse must never crash, no matter the input
    let result = std::panic::catch_unwind(|| parse_diagnostics(&test.input));

    let messages = match result {
        Ok(messages) => messages,
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            return TestResult::Crash(panic_msg);
        }
    };

    match (messages.is_empty(), test.should_be_clean) {
        (true, true) => TestResult::Pass,
        (false, true) => TestResult::Fail(format!(
            "expected no diagnostics, got: {:?}",
            messages
        )),
        (true, false) => TestResult::Fail("expected diagnostics, got none".to_string()),
        (false, false) => {
            if let Some(expected) = &test.expected_error_contains {
                if messages.iter().any(|msg| msg.contains(expected)) {
                    TestResult::Pass
                } else {
                    TestResult::Fail(format!(
                        "no diagnostic contains {:?}; got: {:?}",
                        expected, messages
                    ))
                }
            } else {
                TestResult::Pass
            }
        }
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expression_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    suite.add_test(TestCase::diagnosed_with_message(
        "unmatched_opening_paren",
        "(1 + 2",
        "expected next token to be ), got EOF instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "unmatched_closing_paren",
        "1 + 2)",
        "no prefix parse function for ) found",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "empty_parentheses",
        "()",
        "no prefix parse function for ) found",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "unmatched_opening_bracket",
        "[1, 2",
        "expected next token to be ], got EOF instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "dangling_infix_operator",
        "1 +",
        "no prefix parse function for EOF found",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "double_plus",
        "1 ++ 2",
        "no prefix parse function for + found",
    ));

    // Unary minus makes these parse fine
    suite.add_test(TestCase::clean("double_minus", "1 -- 2"));
    suite.add_test(TestCase::clean("mixed_operators", "1 +- 2"));

    suite.add_test(TestCase::diagnosed_with_message(
        "unrecognized_character",
        "1 @ 2",
        "unrecognized character '@'",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "lone_pipe_is_illegal",
        "a | b",
        "unrecognized character '|'",
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    suite.add_test(TestCase::clean("empty_input", ""));
    suite.add_test(TestCase::clean("only_whitespace", "   \n\t  "));

    let deep_parens = "(".repeat(100) + "1" + &")".repeat(100);
    suite.add_test(TestCase::clean("deeply_nested_parens", &deep_parens));

    // The literal just runs to end of input
    suite.add_test(TestCase::clean("unterminated_string_runs_to_eof", "\"hello"));

    suite.add_test(TestCase::diagnosed_with_message(
        "integer_overflow",
        "99999999999999999999999999",
        "could not parse",
    ));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statements");

    suite.add_test(TestCase::clean("let_statement", "let x = 5;"));
    suite.add_test(TestCase::clean("let_mut_statement", "let mut x = 5;"));
    suite.add_test(TestCase::clean("reassignment", "x = 5;"));
    suite.add_test(TestCase::clean("return_with_value", "return 5;"));
    suite.add_test(TestCase::clean("bare_return", "return;"));
    suite.add_test(TestCase::clean("semicolons_are_optional", "let x = 5 let y = 6"));

    suite.add_test(TestCase::diagnosed_with_message(
        "let_missing_name",
        "let = 5;",
        "expected next token to be IDENT, got = instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "let_missing_equals",
        "let x 5;",
        "expected next token to be =, got INT instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "let_mut_missing_name",
        "let mut = 5;",
        "expected next token to be IDENT, got = instead",
    ));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow");

    suite.add_test(TestCase::clean("valid_if", "if (true) { 1 }"));
    suite.add_test(TestCase::clean("valid_if_else", "if (x < 2) { 1 } else { 2 }"));
    suite.add_test(TestCase::clean("valid_for", "for (x < 3) { x = x + 1; }"));

    suite.add_test(TestCase::diagnosed_with_message(
        "if_missing_parens",
        "if true { 1 }",
        "expected next token to be (, got true instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "if_missing_body",
        "if (true) 1",
        "expected next token to be {, got INT instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "for_missing_parens",
        "for x < 3 { 1 }",
        "expected next token to be (, got IDENT instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "unclosed_block",
        "if (true) { let x = 1;",
        "expected '}' to close block, got EOF instead",
    ));

    suite
}

fn create_function_and_call_tests() -> TestSuite {
    let mut suite = TestSuite::new("Functions and Calls");

    suite.add_test(TestCase::clean("function_literal", "fn(x, y) { x + y }"));
    suite.add_test(TestCase::clean("empty_parameter_list", "fn() { 1 }"));
    suite.add_test(TestCase::clean("simple_call", "foo()"));
    suite.add_test(TestCase::clean("call_with_args", "foo(1, 2, 3)"));
    suite.add_test(TestCase::clean("immediate_invocation", "fn(x) { x }(5)"));

    suite.add_test(TestCase::diagnosed_with_message(
        "parameters_missing_comma",
        "fn(x y) { x }",
        "expected next token to be ), got IDENT instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "non_identifier_parameter",
        "fn(1) { 1 }",
        "expected next token to be IDENT, got INT instead",
    ));

    suite.add_test(TestCase::diagnosed("call_missing_closing_paren", "foo(1, 2"));
    suite.add_test(TestCase::diagnosed("call_trailing_comma", "foo(1, 2,)"));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literals");

    suite.add_test(TestCase::clean("integer_literal", "42"));
    suite.add_test(TestCase::clean("string_literal", "\"hello\""));
    suite.add_test(TestCase::clean("boolean_literals", "true; false"));
    suite.add_test(TestCase::clean("array_literal", "[1, 2, 3]"));
    suite.add_test(TestCase::clean("empty_array", "[]"));
    suite.add_test(TestCase::clean("hash_literal", "{\"a\": 1, 2: \"b\", true: 3}"));
    suite.add_test(TestCase::clean("empty_hash", "{}"));
    suite.add_test(TestCase::clean("nested_collections", "[{\"a\": [1, 2]}, {}]"));

    suite.add_test(TestCase::diagnosed_with_message(
        "hash_missing_colon",
        "{\"a\" 1}",
        "expected next token to be :, got INT instead",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "hash_missing_value",
        "{\"a\": }",
        "no prefix parse function for } found",
    ));

    suite
}

fn create_pipe_and_dot_tests() -> TestSuite {
    let mut suite = TestSuite::new("Pipes and Dot Sugar");

    suite.add_test(TestCase::clean("pipe_with_placeholder", "5 |> add(10, $)"));
    suite.add_test(TestCase::clean("chained_pipes", "1 |> f($) |> g($, 2)"));
    suite.add_test(TestCase::clean("dot_index", "arr.0"));
    suite.add_test(TestCase::clean("dot_method_call", "arr.len()"));
    suite.add_test(TestCase::clean("dot_string_key", "map.\"key\""));

    suite.add_test(TestCase::diagnosed_with_message(
        "pipe_without_placeholder",
        "5 |> add(10)",
        "pipe expression requires a '$' placeholder in the argument list",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "pipe_with_empty_arguments",
        "5 |> f()",
        "pipe expression requires a '$' placeholder in the argument list",
    ));

    suite.add_test(TestCase::diagnosed_with_message(
        "pipe_with_two_placeholders",
        "5 |> add($, $)",
        "multiple '$' placeholders in pipe expression",
    ));

    // A stray $ parses; misuse is a runtime error, not a parse error
    suite.add_test(TestCase::clean("stray_placeholder_parses", "$"));

    suite
}

// ============================================================================
// Main Test Functions
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    let mut all_passed = true;

    let suites = vec![
        create_malformed_expression_tests(),
        create_edge_case_tests(),
        create_statement_tests(),
        create_control_flow_tests(),
        create_function_and_call_tests(),
        create_literal_tests(),
        create_pipe_and_dot_tests(),
    ];

    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            all_passed = false;
        }
    }

    assert!(all_passed, "some parser robustness tests failed; see output above");
}

fn parse_to_string(input: &str) -> String {
    let mut parser = Parser::new(Lexer::new(input));
    let program = parser.parse_program();
    assert!(
        parser.errors().is_empty(),
        "unexpected diagnostics for {:?}: {:?}",
        input,
        parser.errors()
    );
    program.to_string()
}

#[test]
fn ast_display_forms() {
    assert_eq!(parse_to_string("let foo = barbaz;"), "let foo = barbaz;");
    assert_eq!(parse_to_string("let mut x = 1;"), "let mut x = 1;");
    assert_eq!(parse_to_string("x = 2;"), "x = 2;");
    assert_eq!(parse_to_string("return x;"), "return x;");
    assert_eq!(parse_to_string("return;"), "return;");
    assert_eq!(parse_to_string("fn(x) { x + 2; }"), "fn(x) { (x + 2) }");
}

#[test]
fn operator_precedence_via_display() {
    assert_eq!(parse_to_string("-a * b"), "((-a) * b)");
    assert_eq!(parse_to_string("!-a"), "(!(-a))");
    assert_eq!(parse_to_string("a + b + c"), "((a + b) + c)");
    assert_eq!(parse_to_string("a + b * c"), "(a + (b * c))");
    assert_eq!(parse_to_string("a + b / c"), "(a + (b / c))");
    assert_eq!(parse_to_string("5 < 4 != 3 > 4"), "((5 < 4) != (3 > 4))");
    assert_eq!(
        parse_to_string("3 + 4 * 5 == 3 * 1 + 4 * 5"),
        "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"
    );
    assert_eq!(parse_to_string("(5 + 5) * 2"), "((5 + 5) * 2)");
    assert_eq!(parse_to_string("-(5 + 5)"), "(-(5 + 5))");
    assert_eq!(
        parse_to_string("a * [1, 2, 3][b * c] * d"),
        "((a * ([1, 2, 3][(b * c)])) * d)"
    );
    assert_eq!(
        parse_to_string("add(a + b + c * d / f + g)"),
        "add((((a + b) + ((c * d) / f)) + g))"
    );
}

#[test]
fn sugar_rewrites_via_display() {
    // Dot call prepends the receiver; dot index binds tighter than +
    assert_eq!(parse_to_string("x.len()"), "len(x)");
    assert_eq!(parse_to_string("x.push(4)"), "push(x, 4)");
    assert_eq!(parse_to_string("a.0"), "(a[0])");
    assert_eq!(parse_to_string("a.0 + b.1"), "((a[0]) + (b[1]))");
    // The pipe substitutes its left side for the placeholder
    assert_eq!(parse_to_string("5 |> add(10, $)"), "add(10, 5)");
    assert_eq!(
        parse_to_string("f(1) |> g($, 2)"),
        "g(f(1), 2)"
    );
}

#[test]
fn parser_recovers_at_statement_boundaries() {
    let mut parser = Parser::new(Lexer::new("let = 5; let y = 2; y;"));
    let program = parser.parse_program();

    // The broken first statement is diagnosed and skipped; the rest parse
    assert_eq!(parser.errors().len(), 1);
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn every_diagnostic_is_collected_in_order() {
    let mut parser = Parser::new(Lexer::new("let = 1; let = 2;"));
    parser.parse_program();

    let messages: Vec<String> = parser
        .errors()
        .iter()
        .map(|error| error.message.clone())
        .collect();
    assert_eq!(messages.len(), 2);
    assert!(messages
        .iter()
        .all(|msg| msg.contains("expected next token to be IDENT")));
}
