//! Parser for CQL2-text.
//!
//! Grammar (in rough EBNF):
//!
//! filter     = or_expr
//! or_expr    = and_expr ("OR" and_expr)*
//! and_expr   = not_expr ("AND" not_expr)*
//! not_expr   = "NOT" not_expr | primary
//! primary    = "(" filter ")" | function | comparison
//! function   = (T_AFTER | T_BEFORE | S_INTERSECTS | S_WITHIN | S_CONTAINS | S_DISJOINT)
//!              "(" operand "," operand ")"
//! comparison = operand ( compare_op operand
//!                      | "IS" ["NOT"] "NULL"
//!                      | ["NOT"] "LIKE" STRING )
//! operand    = IDENT | NUMBER | STRING | WKT | TRUE | FALSE
//!            | TIMESTAMP "(" STRING ")" | DATE "(" STRING ")" | BBOX "(" NUMBER ("," NUMBER)* ")"

use super::ast::{CompareOp, Expr, Literal};
use super::json::{spatial_op, temporal_op};
use super::lexer::{Token, tokenize};
use super::{ParseError, bbox_geometry, parse_date, parse_timestamp};
use geozero::ToGeo;
use geozero::wkt::Wkt;

/// Deepest `NOT` / parenthesis nesting accepted, matching serde_json's limit.
const MAX_DEPTH: usize = 128;

/// Parser state.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

fn is_keyword(tok: &Token, keyword: &str) -> bool {
    matches!(tok, Token::Ident(name) if name.eq_ignore_ascii_case(keyword))
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        let tok = self.advance();
        if tok == expected {
            Ok(())
        } else {
            Err(ParseError::Syntax(format!(
                "expected {:?}, got {:?}",
                expected, tok
            )))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if is_keyword(self.peek(), keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_filter(&mut self) -> Result<Expr, ParseError> {
        self.parse_or_expr()
    }

    /// Parse OR expression: and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.eat_keyword("OR") {
            let right = self.parse_and_expr()?;
            left = Expr::or(left, right);
        }
        Ok(left)
    }

    /// Parse AND expression: not_expr ("AND" not_expr)*
    fn parse_and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not_expr()?;
        while self.eat_keyword("AND") {
            let right = self.parse_not_expr()?;
            left = Expr::and(left, right);
        }
        Ok(left)
    }

    /// Parse NOT expression: "NOT" not_expr | primary
    fn parse_not_expr(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::Syntax(format!(
                "filter nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        let result = if self.eat_keyword("NOT") {
            self.parse_not_expr().map(|inner| Expr::Not(Box::new(inner)))
        } else {
            self.parse_primary()
        };
        self.depth -= 1;
        result
    }

    /// Parse primary expression: "(" filter ")" | function | comparison
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Token::LParen) {
            self.advance();
            let inner = self.parse_filter()?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }

        if let Token::Ident(name) = self.peek().clone()
            && matches!(self.peek_at(1), Token::LParen)
        {
            let lowered = name.to_ascii_lowercase();
            if let Some(op) = temporal_op(&lowered) {
                self.advance();
                let (lhs, rhs) = self.parse_operand_pair()?;
                return Ok(Expr::temporal(op, lhs, rhs));
            }
            if let Some(op) = spatial_op(&lowered) {
                self.advance();
                let (lhs, rhs) = self.parse_operand_pair()?;
                return Ok(Expr::spatial(op, lhs, rhs));
            }
        }

        self.parse_comparison()
    }

    /// Parse `"(" operand "," operand ")"`
    fn parse_operand_pair(&mut self) -> Result<(Expr, Expr), ParseError> {
        self.expect(Token::LParen)?;
        let lhs = self.parse_operand()?;
        self.expect(Token::Comma)?;
        let rhs = self.parse_operand()?;
        self.expect(Token::RParen)?;
        Ok((lhs, rhs))
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_operand()?;

        let op = match self.peek() {
            Token::Eq => Some(CompareOp::Eq),
            Token::Ne => Some(CompareOp::Ne),
            Token::Lt => Some(CompareOp::Lt),
            Token::Le => Some(CompareOp::Le),
            Token::Gt => Some(CompareOp::Gt),
            Token::Ge => Some(CompareOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.advance(); // consume operator
            let rhs = self.parse_operand()?;
            return Ok(Expr::compare(op, lhs, rhs));
        }

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            if !self.eat_keyword("NULL") {
                return Err(ParseError::Syntax(format!(
                    "expected NULL, got {:?}",
                    self.peek()
                )));
            }
            let is_null = Expr::IsNull(Box::new(lhs));
            return Ok(if negated {
                Expr::Not(Box::new(is_null))
            } else {
                is_null
            });
        }

        let negated = self.eat_keyword("NOT");
        if self.eat_keyword("LIKE") {
            let pattern = match self.advance() {
                Token::Str(pattern) => pattern,
                other => {
                    return Err(ParseError::InvalidOperand(format!(
                        "LIKE pattern must be a string, got {:?}",
                        other
                    )));
                }
            };
            let like = Expr::Like {
                lhs: Box::new(lhs),
                pattern,
            };
            return Ok(if negated {
                Expr::Not(Box::new(like))
            } else {
                like
            });
        }

        Err(ParseError::Syntax(format!(
            "expected comparison after {}, got {:?}",
            lhs.kind(),
            self.peek()
        )))
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Integer(i) => Ok(Expr::Literal(Literal::Integer(i))),
            Token::Float(f) => Ok(Expr::Literal(Literal::Float(f))),
            Token::Str(s) => Ok(Expr::Literal(Literal::String(s))),
            Token::Wkt(text) => {
                let geometry = Wkt(text.as_str())
                    .to_geo()
                    .map_err(|e| ParseError::InvalidGeometry(format!("{text}: {e}")))?;
                Ok(Expr::Literal(Literal::Geometry(geometry)))
            }
            Token::Ident(name) => {
                let call = matches!(self.peek(), Token::LParen);
                if call && name.eq_ignore_ascii_case("TIMESTAMP") {
                    let value = self.parse_string_call()?;
                    return Ok(Expr::Literal(Literal::Timestamp(parse_timestamp(&value)?)));
                }
                if call && name.eq_ignore_ascii_case("DATE") {
                    let value = self.parse_string_call()?;
                    return Ok(Expr::Literal(Literal::Date(parse_date(&value)?)));
                }
                if call && name.eq_ignore_ascii_case("BBOX") {
                    let values = self.parse_number_list()?;
                    return Ok(Expr::Literal(Literal::Geometry(bbox_geometry(&values)?)));
                }
                if name.eq_ignore_ascii_case("TRUE") {
                    return Ok(Expr::Literal(Literal::Boolean(true)));
                }
                if name.eq_ignore_ascii_case("FALSE") {
                    return Ok(Expr::Literal(Literal::Boolean(false)));
                }
                if call {
                    return Err(ParseError::UnknownOperator(name));
                }
                Ok(Expr::Attribute(name))
            }
            other => Err(ParseError::Syntax(format!(
                "expected operand, got {:?}",
                other
            ))),
        }
    }

    /// Parse `"(" STRING ")"`
    fn parse_string_call(&mut self) -> Result<String, ParseError> {
        self.expect(Token::LParen)?;
        let value = match self.advance() {
            Token::Str(value) => value,
            other => {
                return Err(ParseError::InvalidOperand(format!(
                    "expected quoted string, got {:?}",
                    other
                )));
            }
        };
        self.expect(Token::RParen)?;
        Ok(value)
    }

    /// Parse `"(" NUMBER ("," NUMBER)* ")"`
    fn parse_number_list(&mut self) -> Result<Vec<f64>, ParseError> {
        self.expect(Token::LParen)?;
        let mut values = Vec::new();
        loop {
            match self.advance() {
                Token::Integer(i) => values.push(i as f64),
                Token::Float(f) => values.push(f),
                other => {
                    return Err(ParseError::InvalidOperand(format!(
                        "expected number, got {:?}",
                        other
                    )));
                }
            }
            match self.advance() {
                Token::Comma => continue,
                Token::RParen => break,
                other => {
                    return Err(ParseError::Syntax(format!(
                        "expected ',' or ')', got {:?}",
                        other
                    )));
                }
            }
        }
        Ok(values)
    }
}

/// Parse a CQL2-text filter into an AST.
pub fn parse_text(input: &str) -> Result<Expr, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::Syntax("empty filter".to_string()));
    }

    let tokens = tokenize(input).map_err(ParseError::Syntax)?;
    let mut parser = Parser::new(tokens);
    let ast = parser.parse_filter()?;

    // Ensure we consumed all tokens
    if !matches!(parser.peek(), Token::Eof) {
        return Err(ParseError::Syntax(format!(
            "unexpected token after expression: {:?}",
            parser.peek()
        )));
    }

    Ok(ast)
}
