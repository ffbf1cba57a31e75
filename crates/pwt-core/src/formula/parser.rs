//! Pratt parser (top-down operator precedence) for formulas
//!
//! Grammar, loosely:
//!
//! ```text
//! expr    := unary (binop expr)*
//! unary   := ('-' | '+') expr@3 | postfix
//! postfix := primary ( '(' args ')' | '[' expr ']' | '.' ident )*
//! primary := number | ident | '(' expr ')'
//! ```

use super::ast::{BinOp, Expr, ExprKind, Ident, UnaryOp};
use super::error::{ParseError, ParseErrorKind};
use crate::lexer::{LexError, Lexer, Span, Token, TokenKind};

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest expression tree a formula may produce
pub const MAX_NESTING: u32 = 200;

/// The formula parser
pub struct Parser {
    /// All tokens from the formula, ending with `Eof`
    tokens: Vec<Token>,
    /// Current position in the token stream
    position: usize,
    /// Depth of the expression tree being built
    depth: u32,
}

impl Parser {
    /// Parse a complete formula
    ///
    /// Lexer errors are reported before any syntax error. The whole input
    /// must be consumed.
    pub fn parse_formula(source: &str) -> ParseResult<Expr> {
        let (tokens, lex_errors) = Lexer::tokenize(source);
        if let Some(lex_err) = lex_errors.into_iter().next() {
            let LexError::UnexpectedChar(ch) = lex_err.error;
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedCharacter(ch),
                lex_err.span,
            ));
        }

        let mut parser = Parser {
            tokens,
            position: 0,
            depth: 0,
        };
        let expr = parser.expression()?;
        if !parser.is_eof() {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    found: parser.current_kind(),
                    expected: "operator or end of formula".to_string(),
                },
                parser.current().span,
            ));
        }
        Ok(expr)
    }

    // ==================== Token Management ====================

    /// Get the current token (the trailing `Eof` once input is exhausted)
    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn is_eof(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_eof() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    found: self.current_kind(),
                    expected: kind.to_string(),
                },
                self.current().span,
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Ident> {
        let token = self.current().clone();
        if token.kind == TokenKind::Ident {
            self.advance();
            Ok(Ident::new(token.lexeme, token.span))
        } else {
            Err(ParseError::new(ParseErrorKind::ExpectedIdentifier, token.span))
        }
    }

    /// End offset of the most recently consumed token
    fn previous_end(&self, fallback: u32) -> u32 {
        self.position
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(fallback, |t| t.span.end)
    }

    // ==================== Expression Parsing ====================

    fn expression(&mut self) -> ParseResult<Expr> {
        self.parse_precedence(0)
    }

    /// Parse expression with given minimum precedence
    fn parse_precedence(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let entry_depth = self.depth;
        self.descend()?;
        let mut left = self.prefix_expr()?;

        while let Some((op, prec)) = self.infix_op() {
            if prec < min_prec {
                break;
            }

            let assoc_adjust = u8::from(op.is_left_associative());

            self.advance();
            let right = self.parse_precedence(prec + assoc_adjust)?;

            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
            // a left-leaning chain deepens the tree without recursing here
            self.descend()?;
        }

        self.depth = entry_depth;
        Ok(left)
    }

    fn descend(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::new(
                ParseErrorKind::TooDeeplyNested(MAX_NESTING),
                self.current().span,
            )
            .with_hint("split the formula into several custom variables"));
        }
        Ok(())
    }

    /// Get current infix operator and its precedence
    fn infix_op(&self) -> Option<(BinOp, u8)> {
        let op = match self.current_kind() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::StarStar => BinOp::Pow,
            _ => return None,
        };
        Some((op, op.precedence()))
    }

    fn prefix_expr(&mut self) -> ParseResult<Expr> {
        let op = match self.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.postfix_expr(),
        };
        let op_token = self.advance();
        let expr = self.parse_precedence(UnaryOp::PRECEDENCE)?;
        let span = op_token.span.merge(expr.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                expr: Box::new(expr),
            },
            span,
        ))
    }

    /// Parse postfix expressions (calls, attribute access, index)
    fn postfix_expr(&mut self) -> ParseResult<Expr> {
        let entry_depth = self.depth;
        let mut expr = self.primary_expr()?;

        loop {
            let start = expr.span.start;
            let kind = self.current_kind();
            if matches!(kind, TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot) {
                self.descend()?;
            }
            match kind {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.arg_list()?;
                    self.expect(TokenKind::RParen)?;
                    let end = self.previous_end(start);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        Span::new(start, end),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.expression()?;
                    self.expect(TokenKind::RBracket)?;
                    let end = self.previous_end(start);
                    expr = Expr::new(
                        ExprKind::Index {
                            expr: Box::new(expr),
                            index: Box::new(index),
                        },
                        Span::new(start, end),
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect_ident()?;
                    let end = field.span.end;
                    expr = Expr::new(
                        ExprKind::Field {
                            expr: Box::new(expr),
                            field,
                        },
                        Span::new(start, end),
                    );
                }
                _ => break,
            }
        }

        self.depth = entry_depth;
        Ok(expr)
    }

    fn arg_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();

        while !self.check(TokenKind::RParen) && !self.is_eof() {
            args.push(self.expression()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        Ok(args)
    }

    fn primary_expr(&mut self) -> ParseResult<Expr> {
        match self.current_kind() {
            TokenKind::Int | TokenKind::Float => self.number_literal(),
            TokenKind::Ident => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Name(token.lexeme), token.span))
            }
            TokenKind::LParen => {
                let open = self.advance();
                let inner = self.expression()?;
                let close = self.expect(TokenKind::RParen)?;
                Ok(Expr::new(inner.kind, open.span.merge(close.span)))
            }
            TokenKind::Eof => Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                self.current().span,
            )
            .with_hint("the formula ends too early")),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                self.current().span,
            )),
        }
    }

    fn number_literal(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        let clean = token.lexeme.replace('_', "");
        let value: f64 = clean.parse().map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidNumber(token.lexeme.clone()),
                token.span,
            )
        })?;
        Ok(Expr::new(ExprKind::Number(value), token.span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Expr {
        Parser::parse_formula(source).unwrap()
    }

    #[test]
    fn parse_number_and_name() {
        assert_eq!(parse("42").kind, ExprKind::Number(42.0));
        assert_eq!(parse("1_000.5").kind, ExprKind::Number(1000.5));
        assert_eq!(parse("rgdpo").kind, ExprKind::Name("rgdpo".to_string()));
    }

    #[test]
    fn parse_precedence() {
        let expr = parse("1 + 2 * 3");
        if let ExprKind::Binary { op, right, .. } = expr.kind {
            assert_eq!(op, BinOp::Add);
            assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
        } else {
            panic!("expected binary expression");
        }
    }

    #[test]
    fn parse_left_associative_division() {
        // (a / b) / c
        let expr = parse("a / b / c");
        if let ExprKind::Binary { op, left, .. } = expr.kind {
            assert_eq!(op, BinOp::Div);
            assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Div, .. }));
        } else {
            panic!("expected binary expression");
        }
    }

    #[test]
    fn parse_power_binds_tighter_than_negation() {
        let expr = parse("-2 ** 2");
        if let ExprKind::Unary { op, expr } = expr.kind {
            assert_eq!(op, UnaryOp::Neg);
            assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
        } else {
            panic!("expected unary expression");
        }

        // Right associative: 2 ** (3 ** 2)
        let expr = parse("2 ** 3 ** 2");
        if let ExprKind::Binary { right, .. } = expr.kind {
            assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
        } else {
            panic!("expected binary expression");
        }
    }

    #[test]
    fn parse_negative_exponent() {
        let expr = parse("pop ** -1");
        if let ExprKind::Binary { op, right, .. } = expr.kind {
            assert_eq!(op, BinOp::Pow);
            assert!(matches!(right.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
        } else {
            panic!("expected binary expression");
        }
    }

    #[test]
    fn parse_method_chain() {
        let expr = parse("rgdpo.rolling(3).mean()");
        let ExprKind::Call { callee, args } = expr.kind else {
            panic!("expected call");
        };
        assert!(args.is_empty());
        let ExprKind::Field { expr: receiver, field } = callee.kind else {
            panic!("expected attribute access");
        };
        assert_eq!(field.name, "mean");
        assert!(matches!(receiver.kind, ExprKind::Call { ref args, .. } if args.len() == 1));
    }

    #[test]
    fn parse_iloc_index() {
        let expr = parse("rgdpo / rgdpo.iloc[0] * 100");
        let ExprKind::Binary { left, .. } = expr.kind else {
            panic!("expected binary expression");
        };
        let ExprKind::Binary { right, .. } = left.kind else {
            panic!("expected division");
        };
        assert!(matches!(right.kind, ExprKind::Index { .. }));
    }

    #[test]
    fn parse_function_call() {
        let expr = parse("log(rgdpo / pop)");
        assert!(matches!(expr.kind, ExprKind::Call { ref args, .. } if args.len() == 1));
    }

    #[test]
    fn parse_trailing_dot_float() {
        assert_eq!(parse("5.").kind, ExprKind::Number(5.0));
        let expr = parse("rgdpo * 5.");
        assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn parse_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(parse(&nested(150)).kind, ExprKind::Number(1.0));

        let err = Parser::parse_formula(&nested(1000)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeeplyNested(MAX_NESTING));
        assert!(err.hint.is_some());

        let err = Parser::parse_formula(&"-".repeat(1000)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeeplyNested(MAX_NESTING));

        let long_sum = vec!["pop"; 1000].join(" + ");
        let err = Parser::parse_formula(&long_sum).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeeplyNested(MAX_NESTING));

        assert!(Parser::parse_formula(&vec!["pop"; 50].join(" + ")).is_ok());

        let chain = format!("rgdpo{}", ".shift(1)".repeat(1000));
        let err = Parser::parse_formula(&chain).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeeplyNested(MAX_NESTING));
    }

    #[test]
    fn parse_spans() {
        let expr = parse("(emp / pop) * 100");
        assert_eq!(expr.span, Span::new(0, 17));
    }

    #[test]
    fn parse_errors() {
        let err = Parser::parse_formula("rgdpo /").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ExpectedExpression);
        assert!(err.hint.is_some());

        let err = Parser::parse_formula("(rgdpo / pop").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                found: TokenKind::Eof,
                ..
            }
        ));

        let err = Parser::parse_formula("rgdpo pop").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                found: TokenKind::Ident,
                ..
            }
        ));

        let err = Parser::parse_formula("rgdpo # 2").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedCharacter("#".to_string())
        );

        let err = Parser::parse_formula("rgdpo.1").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
    }
}
