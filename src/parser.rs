use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::error::{RillError, Span};
use crate::lexer::{Lexer, Token, TokenType};

/// Binding powers, low to high. `(` binds as a call, `|>` binds tighter
/// than a call so the piped callee is taken bare, and `[`/`.` bind
/// tightest of all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Pipe,
    Index,
}

fn token_precedence(token_type: &TokenType) -> Precedence {
    match token_type {
        TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
        TokenType::Less | TokenType::Greater => Precedence::LessGreater,
        TokenType::Plus | TokenType::Minus => Precedence::Sum,
        TokenType::Star | TokenType::Slash => Precedence::Product,
        TokenType::LeftParen => Precedence::Call,
        TokenType::Pipe => Precedence::Pipe,
        TokenType::LeftBracket | TokenType::Dot => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Two-token-lookahead Pratt parser over the pull lexer. Syntax problems
/// never abort the parse: each one is recorded as a diagnostic, the parser
/// skips to the next statement boundary, and `parse_program` returns the
/// (possibly partial) program. Callers must check `errors()` before
/// trusting the result.
pub struct Parser {
    lexer: Lexer,
    curr_token: Token,
    peek_token: Token,
    errors: Vec<RillError>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        let mut parser = Self {
            lexer,
            curr_token: Token::new(TokenType::Eof, String::new(), Span::single(0)),
            peek_token: Token::new(TokenType::Eof, String::new(), Span::single(0)),
            errors: Vec::new(),
        };

        // Fill both slots of the lookahead window
        parser.next_token();
        parser.next_token();

        parser
    }

    pub fn errors(&self) -> &[RillError] {
        &self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.curr_token_is(&TokenType::Eof) {
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => self.synchronize(),
            }
            self.next_token();
        }

        Program { statements }
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.curr_token.token_type {
            TokenType::Let => self.parse_let_statement(),
            TokenType::Return => self.parse_return_statement(),
            TokenType::Identifier if self.peek_token_is(&TokenType::Equal) => {
                self.parse_reassign_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        let mutable = if self.peek_token_is(&TokenType::Mut) {
            self.next_token();
            true
        } else {
            false
        };

        if !self.expect_peek(&TokenType::Identifier) {
            return None;
        }

        let name = self.curr_token.lexeme.clone();

        if !self.expect_peek(&TokenType::Equal) {
            return None;
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(&TokenType::Semicolon) {
            self.next_token();
        }

        Some(Stmt::Let {
            name,
            value,
            mutable,
        })
    }

    fn parse_reassign_statement(&mut self) -> Option<Stmt> {
        let name = self.curr_token.lexeme.clone();

        // The '=' is what routed us here
        self.next_token();
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(&TokenType::Semicolon) {
            self.next_token();
        }

        Some(Stmt::Reassign { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        // A bare `return` carries no value
        if self.peek_token_is(&TokenType::Semicolon)
            || self.peek_token_is(&TokenType::RightBrace)
            || self.peek_token_is(&TokenType::Eof)
        {
            if self.peek_token_is(&TokenType::Semicolon) {
                self.next_token();
            }
            return Some(Stmt::Return { value: None });
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(&TokenType::Semicolon) {
            self.next_token();
        }

        Some(Stmt::Return { value: Some(value) })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(&TokenType::Semicolon) {
            self.next_token();
        }

        Some(Stmt::Expression { expr })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek_token_is(&TokenType::Semicolon)
            && precedence < token_precedence(&self.peek_token.token_type)
        {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.curr_token.token_type {
            TokenType::Identifier => Some(Expr::Identifier(self.curr_token.lexeme.clone())),
            TokenType::Integer => self.parse_integer_literal(),
            TokenType::String => Some(Expr::String(self.curr_token.lexeme.clone())),
            TokenType::True => Some(Expr::Boolean(true)),
            TokenType::False => Some(Expr::Boolean(false)),
            TokenType::Bang => self.parse_prefix_expression(PrefixOp::Not),
            TokenType::Minus => self.parse_prefix_expression(PrefixOp::Neg),
            TokenType::LeftParen => self.parse_grouped_expression(),
            TokenType::If => self.parse_if_expression(),
            TokenType::For => self.parse_for_expression(),
            TokenType::Fn => self.parse_function_literal(),
            TokenType::LeftBracket => self.parse_array_literal(),
            TokenType::LeftBrace => self.parse_hash_literal(),
            TokenType::Dollar => Some(Expr::Placeholder),
            TokenType::Illegal => {
                self.errors.push(RillError::lex_error(
                    self.curr_token.span.clone(),
                    format!("unrecognized character '{}'", self.curr_token.lexeme),
                ));
                None
            }
            _ => {
                self.errors.push(RillError::parse_error(
                    self.curr_token.span.clone(),
                    format!(
                        "no prefix parse function for {} found",
                        self.curr_token.token_type
                    ),
                ));
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.curr_token.token_type {
            TokenType::Plus => self.parse_infix_expression(InfixOp::Add, left),
            TokenType::Minus => self.parse_infix_expression(InfixOp::Sub, left),
            TokenType::Star => self.parse_infix_expression(InfixOp::Mul, left),
            TokenType::Slash => self.parse_infix_expression(InfixOp::Div, left),
            TokenType::EqualEqual => self.parse_infix_expression(InfixOp::Eq, left),
            TokenType::BangEqual => self.parse_infix_expression(InfixOp::NotEq, left),
            TokenType::Less => self.parse_infix_expression(InfixOp::Lt, left),
            TokenType::Greater => self.parse_infix_expression(InfixOp::Gt, left),
            TokenType::LeftParen => self.parse_call_expression(left),
            TokenType::LeftBracket => self.parse_index_expression(left),
            TokenType::Dot => self.parse_dot_expression(left),
            TokenType::Pipe => self.parse_pipe_expression(left),
            _ => Some(left),
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        match self.curr_token.lexeme.parse::<i64>() {
            Ok(value) => Some(Expr::Integer(value)),
            Err(_) => {
                self.errors.push(RillError::parse_error(
                    self.curr_token.span.clone(),
                    format!("could not parse {:?} as integer", self.curr_token.lexeme),
                ));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self, operator: PrefixOp) -> Option<Expr> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expr::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, operator: InfixOp, left: Expr) -> Option<Expr> {
        let precedence = token_precedence(&self.curr_token.token_type);
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expr::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(&TokenType::RightParen) {
            return None;
        }

        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        if !self.expect_peek(&TokenType::LeftParen) {
            return None;
        }

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(&TokenType::RightParen) {
            return None;
        }
        if !self.expect_peek(&TokenType::LeftBrace) {
            return None;
        }

        let consequence = self.parse_block()?;

        let alternative = if self.peek_token_is(&TokenType::Else) {
            self.next_token();

            if !self.expect_peek(&TokenType::LeftBrace) {
                return None;
            }

            Some(self.parse_block()?)
        } else {
            None
        };

        Some(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_for_expression(&mut self) -> Option<Expr> {
        if !self.expect_peek(&TokenType::LeftParen) {
            return None;
        }

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(&TokenType::RightParen) {
            return None;
        }
        if !self.expect_peek(&TokenType::LeftBrace) {
            return None;
        }

        let body = self.parse_block()?;

        Some(Expr::For {
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_block(&mut self) -> Option<Block> {
        let opening = self.curr_token.span.clone();
        let mut statements = Vec::new();

        self.next_token();

        while !self.curr_token_is(&TokenType::RightBrace) && !self.curr_token_is(&TokenType::Eof) {
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => self.synchronize(),
            }
            self.next_token();
        }

        if self.curr_token_is(&TokenType::Eof) {
            self.errors.push(RillError::parse_error_with_help(
                opening,
                "expected '}' to close block, got EOF instead".to_string(),
                "every '{' opening a block needs a matching '}'".to_string(),
            ));
            return None;
        }

        Some(Block { statements })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        if !self.expect_peek(&TokenType::LeftParen) {
            return None;
        }

        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(&TokenType::LeftBrace) {
            return None;
        }

        let body = self.parse_block()?;

        Some(Expr::Function { parameters, body })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();

        if self.peek_token_is(&TokenType::RightParen) {
            self.next_token();
            return Some(parameters);
        }

        if !self.expect_peek(&TokenType::Identifier) {
            return None;
        }
        parameters.push(self.curr_token.lexeme.clone());

        while self.peek_token_is(&TokenType::Comma) {
            self.next_token();
            if !self.expect_peek(&TokenType::Identifier) {
                return None;
            }
            parameters.push(self.curr_token.lexeme.clone());
        }

        if !self.expect_peek(&TokenType::RightParen) {
            return None;
        }

        Some(parameters)
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let elements = self.parse_expression_list(&TokenType::RightBracket, None)?;
        Some(Expr::Array(elements))
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let mut pairs = Vec::new();

        while !self.peek_token_is(&TokenType::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(&TokenType::Colon) {
                return None;
            }

            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;

            pairs.push((key, value));

            if !self.peek_token_is(&TokenType::RightBrace)
                && !self.expect_peek(&TokenType::Comma)
            {
                return None;
            }
        }

        if !self.expect_peek(&TokenType::RightBrace) {
            return None;
        }

        Some(Expr::Hash(pairs))
    }

    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let arguments = self.parse_expression_list(&TokenType::RightParen, None)?;

        Some(Expr::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(&TokenType::RightBracket) {
            return None;
        }

        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    /// Dot sugar, resolved right here: `recv.name(args)` becomes a call to
    /// `name` with the receiver prepended; any other `recv.X` becomes an
    /// index with a single prefix-parsed `X` (so `a.0 + b` is `(a.0) + b`).
    fn parse_dot_expression(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();

        if self.curr_token_is(&TokenType::Identifier) && self.peek_token_is(&TokenType::LeftParen)
        {
            let name = self.curr_token.lexeme.clone();
            self.next_token();

            let mut arguments = vec![left];
            arguments.extend(self.parse_expression_list(&TokenType::RightParen, None)?);

            return Some(Expr::Call {
                function: Box::new(Expr::Identifier(name)),
                arguments,
            });
        }

        let index = self.parse_expression(Precedence::Index)?;

        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    /// `x |> f(a, $)`: parse the right-hand call and substitute the
    /// already-parsed left expression for the `$` in its argument list.
    /// Exactly one `$` is required.
    fn parse_pipe_expression(&mut self, left: Expr) -> Option<Expr> {
        let pipe_span = self.curr_token.span.clone();
        let precedence = token_precedence(&self.curr_token.token_type);

        self.next_token();
        let function = self.parse_expression(precedence)?;

        if !self.expect_peek(&TokenType::LeftParen) {
            return None;
        }

        let mut substituted = false;
        let arguments =
            self.parse_expression_list(&TokenType::RightParen, Some((&left, &mut substituted)))?;

        if !substituted {
            self.errors.push(RillError::parse_error_with_help(
                pipe_span,
                "pipe expression requires a '$' placeholder in the argument list".to_string(),
                "write the piped value's position explicitly, e.g. `x |> f(a, $)`".to_string(),
            ));
            return None;
        }

        Some(Expr::Call {
            function: Box::new(function),
            arguments,
        })
    }

    /// Comma-separated expressions up to `end`. When `placeholder` is set
    /// (pipe arguments), the bare `$` is replaced by the given expression
    /// and the flag records that it happened; a second `$` is a diagnostic.
    fn parse_expression_list(
        &mut self,
        end: &TokenType,
        mut placeholder: Option<(&Expr, &mut bool)>,
    ) -> Option<Vec<Expr>> {
        let mut elements = Vec::new();

        if self.peek_token_is(end) {
            self.next_token();
            return Some(elements);
        }

        self.next_token();
        elements.push(self.parse_list_element(&mut placeholder)?);

        while self.peek_token_is(&TokenType::Comma) {
            self.next_token();
            self.next_token();
            elements.push(self.parse_list_element(&mut placeholder)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(elements)
    }

    fn parse_list_element(
        &mut self,
        placeholder: &mut Option<(&Expr, &mut bool)>,
    ) -> Option<Expr> {
        if let Some((replacement, substituted)) = placeholder {
            if self.curr_token_is(&TokenType::Dollar) {
                if **substituted {
                    self.errors.push(RillError::parse_error(
                        self.curr_token.span.clone(),
                        "multiple '$' placeholders in pipe expression".to_string(),
                    ));
                    return None;
                }
                **substituted = true;
                return Some((*replacement).clone());
            }
        }

        self.parse_expression(Precedence::Lowest)
    }

    /// Skip to the next statement boundary after a diagnostic, so the rest
    /// of the input still gets parsed.
    fn synchronize(&mut self) {
        while !self.curr_token_is(&TokenType::Semicolon) && !self.curr_token_is(&TokenType::Eof) {
            self.next_token();
        }
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.curr_token = std::mem::replace(&mut self.peek_token, next);
    }

    fn curr_token_is(&self, token_type: &TokenType) -> bool {
        &self.curr_token.token_type == token_type
    }

    fn peek_token_is(&self, token_type: &TokenType) -> bool {
        &self.peek_token.token_type == token_type
    }

    fn expect_peek(&mut self, token_type: &TokenType) -> bool {
        if self.peek_token_is(token_type) {
            self.next_token();
            true
        } else {
            self.peek_error(token_type);
            false
        }
    }

    fn peek_error(&mut self, expected: &TokenType) {
        self.errors.push(RillError::parse_error(
            self.peek_token.span.clone(),
            format!(
                "expected next token to be {}, got {} instead",
                expected, self.peek_token.token_type
            ),
        ));
    }
}
