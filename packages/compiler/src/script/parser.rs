/**
 * Binding Expression Parser
 *
 * Recursive descent parser for binding fragments. Binary operators are parsed
 * by precedence climbing.
 */

use super::ast::*;
use super::lexer::{Lexer, Token, TokenType};
use crate::chars;
use crate::codedom::{BinaryOperator, UnaryOperator};
use crate::error::{CompilerError, Result};
use crate::parse_util::SourcePosition;

pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new() -> Self {
        Parser { lexer: Lexer::new() }
    }

    /// Parses a fragment into its top-level statements.
    pub fn parse(&self, input: &str) -> Result<Vec<Stmt>> {
        let tokens = self.lexer.tokenize(input)?;
        ParseScript::new(input, tokens).parse_program()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum InfixOperator {
    Binary(BinaryOperator),
    In,
    InstanceOf,
}

fn infix_operator(token: &Token) -> Option<(u8, InfixOperator)> {
    use BinaryOperator::*;
    use InfixOperator::Binary;

    match token.token_type {
        TokenType::Keyword => match token.str_value.as_str() {
            "in" => Some((7, InfixOperator::In)),
            "instanceof" => Some((7, InfixOperator::InstanceOf)),
            _ => None,
        },
        TokenType::Operator => {
            let op = match token.str_value.as_str() {
                "||" => (1, Binary(BooleanOr)),
                "&&" => (2, Binary(BooleanAnd)),
                "|" => (3, Binary(BitwiseOr)),
                "^" => (4, Binary(BitwiseXor)),
                "&" => (5, Binary(BitwiseAnd)),
                "==" => (6, Binary(ValueEquality)),
                "!=" => (6, Binary(ValueInequality)),
                "===" => (6, Binary(IdentityEquality)),
                "!==" => (6, Binary(IdentityInequality)),
                "<" => (7, Binary(LessThan)),
                ">" => (7, Binary(GreaterThan)),
                "<=" => (7, Binary(LessThanOrEqual)),
                ">=" => (7, Binary(GreaterThanOrEqual)),
                "<<" => (8, Binary(ShiftLeft)),
                ">>" => (8, Binary(ShiftRight)),
                ">>>" => (8, Binary(UShiftRight)),
                "+" => (9, Binary(Add)),
                "-" => (9, Binary(Subtract)),
                "*" => (10, Binary(Multiply)),
                "/" => (10, Binary(Divide)),
                "%" => (10, Binary(Modulus)),
                _ => return None,
            };
            Some(op)
        }
        _ => None,
    }
}

fn assignment_operator(token: &Token) -> Option<BinaryOperator> {
    use BinaryOperator::*;

    if token.token_type != TokenType::Operator {
        return None;
    }
    let op = match token.str_value.as_str() {
        "=" => Assign,
        "+=" => AddAssign,
        "-=" => SubtractAssign,
        "*=" => MultiplyAssign,
        "/=" => DivideAssign,
        "%=" => ModulusAssign,
        "&=" => BitwiseAndAssign,
        "|=" => BitwiseOrAssign,
        "^=" => BitwiseXorAssign,
        "<<=" => ShiftLeftAssign,
        ">>=" => ShiftRightAssign,
        ">>>=" => UShiftRightAssign,
        _ => return None,
    };
    Some(op)
}

/// Statement keywords outside the supported subset.
const UNSUPPORTED_STATEMENTS: &[&str] = &[
    "if", "else", "while", "do", "switch", "case", "default", "try", "catch", "finally", "throw",
    "break", "continue",
];

struct ParseScript<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    index: usize,
}

impl<'a> ParseScript<'a> {
    fn new(input: &'a str, tokens: Vec<Token>) -> Self {
        ParseScript {
            input,
            tokens,
            index: 0,
        }
    }

    fn next(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// Offset of the current token, or the end of input.
    fn input_index(&self) -> usize {
        self.next().map_or(self.input.len(), |t| t.index)
    }

    fn error(&self, message: impl Into<String>, index: usize) -> CompilerError {
        CompilerError::translation(message, SourcePosition::locate(self.input, index))
    }

    fn unexpected(&self) -> CompilerError {
        match self.next() {
            Some(token) => self.error(format!("Unexpected token '{}'", token), token.index),
            None => self.error("Unexpected end of input", self.input.len()),
        }
    }

    fn peek_character(&self, code: char) -> bool {
        self.next().map_or(false, |t| t.is_character(code))
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.next().map_or(false, |t| t.is_keyword(keyword))
    }

    fn peek_operator(&self, operator: &str) -> bool {
        self.next().map_or(false, |t| t.is_operator(operator))
    }

    fn optional_character(&mut self, code: char) -> bool {
        if self.peek_character(code) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn optional_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn optional_operator(&mut self, operator: &str) -> bool {
        if self.peek_operator(operator) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect_character(&mut self, code: char) -> Result<()> {
        if self.optional_character(code) {
            return Ok(());
        }
        Err(match self.next() {
            Some(token) => self.error(format!("Missing expected {} before '{}'", code, token), token.index),
            None => self.error(format!("Missing expected {}", code), self.input.len()),
        })
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.next() {
            Some(token) if token.is_identifier() => {
                let name = token.str_value.clone();
                self.index += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Property names after `.` may be reserved words.
    fn expect_property_name(&mut self) -> Result<String> {
        match self.next() {
            Some(token) if token.is_identifier() || token.token_type == TokenType::Keyword => {
                let name = token.str_value.clone();
                self.index += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_program(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let index = self.input_index();
        let token = match self.next() {
            Some(token) => token.clone(),
            None => return Err(self.unexpected()),
        };

        if token.is_character(chars::LBRACE) {
            self.index += 1;
            let body = self.parse_block_body()?;
            return Ok(Stmt::new(StmtKind::Block(body), index));
        }
        if token.is_character(chars::SEMICOLON) {
            self.index += 1;
            return Ok(Stmt::new(StmtKind::Empty, index));
        }

        if token.token_type == TokenType::Keyword {
            match token.str_value.as_str() {
                "var" => {
                    self.index += 1;
                    let vars = self.parse_var_list()?;
                    self.optional_character(chars::SEMICOLON);
                    return Ok(Stmt::new(StmtKind::Var(vars), index));
                }
                "function" => {
                    self.index += 1;
                    let function = self.parse_function(index)?;
                    return Ok(Stmt::new(StmtKind::Function(function), index));
                }
                "return" => {
                    self.index += 1;
                    let value = if self.at_end()
                        || self.peek_character(chars::SEMICOLON)
                        || self.peek_character(chars::RBRACE)
                    {
                        None
                    } else {
                        Some(self.parse_expression()?)
                    };
                    self.optional_character(chars::SEMICOLON);
                    return Ok(Stmt::new(StmtKind::Return(value), index));
                }
                "for" => {
                    self.index += 1;
                    return self.parse_for(index);
                }
                "with" => {
                    return Err(self.error("'with' not legal in binding expressions", index));
                }
                keyword if UNSUPPORTED_STATEMENTS.contains(&keyword) => {
                    return Err(self.error(format!("Token not yet supported ({})", keyword), index));
                }
                _ => {}
            }
        }

        let expr = self.parse_expression()?;
        self.optional_character(chars::SEMICOLON);
        Ok(Stmt::new(StmtKind::Expr(expr), index))
    }

    /// Statements up to and including the closing brace.
    fn parse_block_body(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.optional_character(chars::RBRACE) {
            if self.at_end() {
                return Err(self.error("Missing expected }", self.input.len()));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_var_list(&mut self) -> Result<Vec<VarInit>> {
        let mut vars = Vec::new();
        loop {
            let index = self.input_index();
            let name = self.expect_identifier()?;
            let init = if self.optional_operator("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            vars.push(VarInit { name, init, index });
            if !self.optional_character(chars::COMMA) {
                return Ok(vars);
            }
        }
    }

    fn parse_for(&mut self, index: usize) -> Result<Stmt> {
        self.expect_character(chars::LPAREN)?;

        let init = if self.peek_character(chars::SEMICOLON) {
            None
        } else {
            let init_index = self.input_index();
            let kind = if self.optional_keyword("var") {
                StmtKind::Var(self.parse_var_list()?)
            } else {
                StmtKind::Expr(self.parse_expression()?)
            };
            Some(Box::new(Stmt::new(kind, init_index)))
        };
        if self.peek_keyword("in") {
            return Err(self.error("Token not yet supported (for-in)", self.input_index()));
        }
        self.expect_character(chars::SEMICOLON)?;

        let test = if self.peek_character(chars::SEMICOLON) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_character(chars::SEMICOLON)?;

        let update = if self.peek_character(chars::RPAREN) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_character(chars::RPAREN)?;

        let body = self.parse_statement()?;
        Ok(Stmt::new(
            StmtKind::For {
                init,
                test,
                update,
                body: Box::new(body),
            },
            index,
        ))
    }

    /// Everything after the `function` keyword.
    fn parse_function(&mut self, index: usize) -> Result<Function> {
        let name = if self.next().map_or(false, Token::is_identifier) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        self.expect_character(chars::LPAREN)?;
        let mut params = Vec::new();
        if !self.optional_character(chars::RPAREN) {
            loop {
                params.push(self.expect_identifier()?);
                if self.optional_character(chars::RPAREN) {
                    break;
                }
                self.expect_character(chars::COMMA)?;
            }
        }

        self.expect_character(chars::LBRACE)?;
        let body = self.parse_block_body()?;
        Ok(Function {
            name,
            params,
            body,
            index,
        })
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        let first = self.parse_assignment()?;
        if !self.peek_character(chars::COMMA) {
            return Ok(first);
        }

        let index = first.index;
        let mut exprs = vec![first];
        while self.optional_character(chars::COMMA) {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::new(ExprKind::Comma(exprs), index))
    }

    fn parse_assignment(&mut self) -> Result<Expr> {
        let left = self.parse_conditional()?;

        let operator = match self.next().and_then(assignment_operator) {
            Some(operator) => operator,
            None => return Ok(left),
        };
        if !matches!(
            left.kind,
            ExprKind::Name(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
        ) {
            return Err(self.error("Invalid assignment left-hand side", left.index));
        }
        self.index += 1;

        let right = self.parse_assignment()?;
        let index = left.index;
        Ok(Expr::new(
            ExprKind::Binary {
                operator,
                left: left.boxed(),
                right: right.boxed(),
            },
            index,
        ))
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let test = self.parse_binary(1)?;
        if !self.optional_operator("?") {
            return Ok(test);
        }

        let when_true = self.parse_assignment()?;
        self.expect_character(chars::COLON)?;
        let when_false = self.parse_assignment()?;
        let index = test.index;
        Ok(Expr::new(
            ExprKind::Conditional {
                test: test.boxed(),
                when_true: when_true.boxed(),
                when_false: when_false.boxed(),
            },
            index,
        ))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let (precedence, operator) = match self.next().and_then(infix_operator) {
                Some(found) if found.0 >= min_precedence => found,
                _ => return Ok(left),
            };
            self.index += 1;

            let right = self.parse_binary(precedence + 1)?;
            let index = left.index;
            let kind = match operator {
                InfixOperator::Binary(operator) => ExprKind::Binary {
                    operator,
                    left: left.boxed(),
                    right: right.boxed(),
                },
                InfixOperator::In => ExprKind::In {
                    key: left.boxed(),
                    target: right.boxed(),
                },
                InfixOperator::InstanceOf => ExprKind::InstanceOf {
                    target: left.boxed(),
                    type_expr: right.boxed(),
                },
            };
            left = Expr::new(kind, index);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let index = self.input_index();
        let token = match self.next() {
            Some(token) => token.clone(),
            None => return Err(self.unexpected()),
        };

        let operator = match token.token_type {
            TokenType::Operator => match token.str_value.as_str() {
                "!" => Some(UnaryOperator::LogicalNegation),
                "~" => Some(UnaryOperator::BitwiseNegation),
                "-" => Some(UnaryOperator::Negation),
                "+" => Some(UnaryOperator::Positive),
                "++" => Some(UnaryOperator::PreIncrement),
                "--" => Some(UnaryOperator::PreDecrement),
                _ => None,
            },
            TokenType::Keyword => match token.str_value.as_str() {
                "typeof" => {
                    self.index += 1;
                    let operand = self.parse_unary()?;
                    return Ok(Expr::new(ExprKind::TypeOf(operand.boxed()), index));
                }
                "void" | "delete" => {
                    return Err(self.error(format!("Token not yet supported ({})", token.str_value), index));
                }
                _ => None,
            },
            _ => None,
        };

        match operator {
            Some(operator) => {
                self.index += 1;
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        operator,
                        operand: operand.boxed(),
                    },
                    index,
                ))
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let expr = self.parse_call_member()?;
        let operator = if self.optional_operator("++") {
            UnaryOperator::PostIncrement
        } else if self.optional_operator("--") {
            UnaryOperator::PostDecrement
        } else {
            return Ok(expr);
        };
        let index = expr.index;
        Ok(Expr::new(
            ExprKind::Unary {
                operator,
                operand: expr.boxed(),
            },
            index,
        ))
    }

    fn parse_call_member(&mut self) -> Result<Expr> {
        let mut expr = if self.peek_keyword("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            let index = expr.index;
            if self.optional_character(chars::PERIOD) {
                let name = self.expect_property_name()?;
                expr = Expr::new(ExprKind::Member { target: expr.boxed(), name }, index);
            } else if self.optional_character(chars::LBRACKET) {
                let key = self.parse_expression()?;
                self.expect_character(chars::RBRACKET)?;
                expr = Expr::new(ExprKind::Index { target: expr.boxed(), key: key.boxed() }, index);
            } else if self.optional_character(chars::LPAREN) {
                let args = self.parse_arguments()?;
                expr = Expr::new(ExprKind::Call { target: expr.boxed(), args }, index);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_new(&mut self) -> Result<Expr> {
        let index = self.input_index();
        self.index += 1;

        let mut target = if self.peek_keyword("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            let target_index = target.index;
            if self.optional_character(chars::PERIOD) {
                let name = self.expect_property_name()?;
                target = Expr::new(ExprKind::Member { target: target.boxed(), name }, target_index);
            } else if self.optional_character(chars::LBRACKET) {
                let key = self.parse_expression()?;
                self.expect_character(chars::RBRACKET)?;
                target = Expr::new(ExprKind::Index { target: target.boxed(), key: key.boxed() }, target_index);
            } else {
                break;
            }
        }

        let args = if self.optional_character(chars::LPAREN) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::new(ExprKind::New { target: target.boxed(), args }, index))
    }

    /// Arguments after an opening paren, through the closing paren.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.optional_character(chars::RPAREN) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment()?);
            if self.optional_character(chars::RPAREN) {
                return Ok(args);
            }
            self.expect_character(chars::COMMA)?;
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let index = self.input_index();
        let token = match self.next() {
            Some(token) => token.clone(),
            None => return Err(self.unexpected()),
        };

        let kind = match token.token_type {
            TokenType::Identifier => ExprKind::Name(token.str_value),
            TokenType::Number => ExprKind::Number(token.num_value),
            TokenType::String => ExprKind::String(token.str_value),
            TokenType::Keyword => match token.str_value.as_str() {
                "true" => ExprKind::Boolean(true),
                "false" => ExprKind::Boolean(false),
                "null" => ExprKind::Null,
                "this" => ExprKind::This,
                "function" => {
                    self.index += 1;
                    let function = self.parse_function(index)?;
                    return Ok(Expr::new(ExprKind::Function(Box::new(function)), index));
                }
                _ => return Err(self.unexpected()),
            },
            TokenType::Character => {
                self.index += 1;
                return match token.str_value.chars().next().unwrap_or(chars::EOF) {
                    chars::LPAREN => {
                        let inner = self.parse_expression()?;
                        self.expect_character(chars::RPAREN)?;
                        Ok(Expr::new(ExprKind::Parens(inner.boxed()), index))
                    }
                    chars::LBRACKET => self.parse_array_literal(index),
                    chars::LBRACE => self.parse_object_literal(index),
                    _ => {
                        self.index -= 1;
                        Err(self.unexpected())
                    }
                };
            }
            TokenType::Operator => return Err(self.unexpected()),
        };

        self.index += 1;
        Ok(Expr::new(kind, index))
    }

    fn parse_array_literal(&mut self, index: usize) -> Result<Expr> {
        let mut elements = Vec::new();
        while !self.optional_character(chars::RBRACKET) {
            elements.push(self.parse_assignment()?);
            if !self.optional_character(chars::COMMA) {
                self.expect_character(chars::RBRACKET)?;
                break;
            }
        }
        Ok(Expr::new(ExprKind::Array(elements), index))
    }

    fn parse_object_literal(&mut self, index: usize) -> Result<Expr> {
        let mut properties = Vec::new();
        while !self.optional_character(chars::RBRACE) {
            let key_index = self.input_index();
            let key = match self.next() {
                Some(token) if token.is_identifier() || token.token_type == TokenType::Keyword => {
                    PropertyKey::Name(token.str_value.clone())
                }
                Some(token) if token.is_string() => {
                    PropertyKey::Literal(Expr::new(ExprKind::String(token.str_value.clone()), key_index))
                }
                Some(token) if token.is_number() => {
                    PropertyKey::Literal(Expr::new(ExprKind::Number(token.num_value), key_index))
                }
                _ => return Err(self.unexpected()),
            };
            self.index += 1;
            self.expect_character(chars::COLON)?;
            let value = self.parse_assignment()?;
            properties.push((key, value));

            if !self.optional_character(chars::COMMA) {
                self.expect_character(chars::RBRACE)?;
                break;
            }
        }
        Ok(Expr::new(ExprKind::Object(properties), index))
    }
}
