//! Expression parsing functions.
//!
//! Member expressions are parsed by simple recursive descent:
//! primaries (literals, paths, lists) followed by any number of call
//! suffixes.

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::node::Ident;
use crate::ast::{ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind};
use bumpalo::collections::Vec as BVec;

impl<'ast> Parser<'ast> {
    /// Parse an expression.
    pub fn parse_expr(&mut self) -> Result<Expr<'ast>, ParseError> {
        let mut expr = self.parse_primary()?;

        while self.check(TokenKind::LeftParen) {
            let (args, end) = self.parse_arguments()?;
            expr = Expr::Call(self.arena.alloc(CallExpr {
                callee: self.arena.alloc(expr),
                args,
                span: expr.span().merge(end),
            }));
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr<'ast>, ParseError> {
        let token = *self.peek();

        match token.kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral => {
                self.advance();
                self.parse_literal(token, false)
            }
            TokenKind::Symbol
                if token.lexeme == "-"
                    && matches!(
                        self.peek_nth(1).kind,
                        TokenKind::IntLiteral | TokenKind::FloatLiteral
                    ) =>
            {
                self.advance();
                let number = self.advance();
                let mut expr = self.parse_literal(number, true)?;
                if let Expr::Literal(lit) = &mut expr {
                    lit.span = token.span.merge(number.span);
                }
                Ok(expr)
            }
            TokenKind::True | TokenKind::False | TokenKind::None => {
                self.advance();
                let kind = match token.kind {
                    TokenKind::True => LiteralKind::Bool(true),
                    TokenKind::False => LiteralKind::Bool(false),
                    _ => LiteralKind::None,
                };
                Ok(Expr::Literal(LiteralExpr {
                    kind,
                    span: token.span,
                }))
            }
            TokenKind::LeftBracket => self.parse_list(),
            TokenKind::Identifier
            | TokenKind::Field
            | TokenKind::Static
            | TokenKind::PostInit
            | TokenKind::Init
            | TokenKind::Deferred
            | TokenKind::Abstract => {
                let path = self.parse_dotted_name()?;
                Ok(Expr::Path(PathExpr {
                    path,
                    span: path.span,
                }))
            }
            _ => Err(ParseError::expected_expression(token.span, &token.describe())),
        }
    }

    /// Interpret a numeric or string literal token.
    fn parse_literal(&mut self, token: Token<'ast>, negate: bool) -> Result<Expr<'ast>, ParseError> {
        let invalid = |detail: String| ParseError::new(ParseErrorKind::InvalidLiteral, token.span, detail);

        let kind = match token.kind {
            TokenKind::IntLiteral => {
                let digits: String = token.lexeme.chars().filter(|c| *c != '_').collect();
                let digits = if negate { format!("-{digits}") } else { digits };
                let value = digits
                    .parse::<i64>()
                    .map_err(|e| invalid(format!("'{}': {e}", token.lexeme)))?;
                LiteralKind::Int(value)
            }
            TokenKind::FloatLiteral => {
                let digits: String = token.lexeme.chars().filter(|c| *c != '_').collect();
                let value = digits
                    .parse::<f64>()
                    .map_err(|e| invalid(format!("'{}': {e}", token.lexeme)))?;
                LiteralKind::Float(if negate { -value } else { value })
            }
            _ => LiteralKind::String(self.arena.alloc_str(&unescape(token.lexeme))),
        };

        Ok(Expr::Literal(LiteralExpr {
            kind,
            span: token.span,
        }))
    }

    /// Parse `'[' (EXPR (',' EXPR)* ','?)? ']'`.
    fn parse_list(&mut self) -> Result<Expr<'ast>, ParseError> {
        let start_span = self.expect(TokenKind::LeftBracket)?.span;
        let mut items = BVec::new_in(self.arena);

        while !self.check(TokenKind::RightBracket) {
            items.push(self.parse_expr()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end_span = self.expect(TokenKind::RightBracket)?.span;

        Ok(Expr::List(ListExpr {
            items: self.arena.alloc_slice_copy(&items),
            span: start_span.merge(end_span),
        }))
    }

    /// Parse a call argument list, returning the arguments and the span of
    /// the closing parenthesis.
    ///
    /// Grammar: `'(' (ARG (',' ARG)* ','?)? ')'` where `ARG = (IDENT '=')? EXPR`
    fn parse_arguments(&mut self) -> Result<(&'ast [Arg<'ast>], latebind_core::Span), ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut args: BVec<'_, Arg<'ast>> = BVec::new_in(self.arena);
        let mut seen_keyword = false;

        while !self.check(TokenKind::RightParen) {
            let start = *self.peek();
            let name = if self.peek_nth(1).kind == TokenKind::Equal {
                let name: Ident<'ast> = self.expect_ident()?;
                self.advance();
                seen_keyword = true;
                Some(name)
            } else {
                if seen_keyword {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        start.span,
                        "positional argument follows keyword argument",
                    ));
                }
                None
            };

            let value = self.parse_expr()?;
            args.push(Arg {
                name,
                value: self.arena.alloc(value),
                span: start.span.merge(value.span()),
            });

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.expect(TokenKind::RightParen)?.span;

        Ok((self.arena.alloc_slice_copy(&args), end))
    }
}

/// Strip the quotes from a string literal lexeme and resolve escapes.
///
/// Unknown escapes are kept verbatim.
fn unescape(lexeme: &str) -> String {
    let mut chars = lexeme.chars();
    let quote = chars.next();
    let body = chars.as_str();
    let body = match quote {
        Some(q) => body.strip_suffix(q).unwrap_or(body),
        None => body,
    };

    let mut out = String::with_capacity(body.len());
    let mut iter = body.chars();
    while let Some(c) = iter.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match iter.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::unescape;
    use crate::ast::*;
    use bumpalo::Bump;

    fn field_value<'a>(source: &str, arena: &'a Bump) -> Expr<'a> {
        let source = format!("class T:\n    field value = {source}\n");
        let module = Parser::parse(&source, arena).unwrap();
        let Stmt::Class(class) = module.body()[0] else {
            panic!("expected class");
        };
        let Stmt::Field(member) = class.body[0] else {
            panic!("expected field");
        };
        *member.value
    }

    #[test]
    fn literals() {
        let arena = Bump::new();
        let lit = |src: &str| match field_value(src, &arena) {
            Expr::Literal(l) => l.kind,
            other => panic!("not a literal: {other:?}"),
        };
        assert_eq!(lit("42"), LiteralKind::Int(42));
        assert_eq!(lit("-7"), LiteralKind::Int(-7));
        assert_eq!(lit("1_000"), LiteralKind::Int(1000));
        assert_eq!(lit("2.5"), LiteralKind::Float(2.5));
        assert_eq!(lit("'a\\nb'"), LiteralKind::String("a\nb"));
        assert_eq!(lit("true"), LiteralKind::Bool(true));
        assert_eq!(lit("none"), LiteralKind::None);
    }

    #[test]
    fn integer_overflow_is_invalid_literal() {
        let arena = Bump::new();
        let errors = Parser::parse("class T:\n    static n = 99999999999999999999\n", &arena).unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::InvalidLiteral)
        );
    }

    #[test]
    fn dotted_path() {
        let arena = Bump::new();
        let Expr::Path(path) = field_value("self.group.name", &arena) else {
            panic!("expected path");
        };
        assert!(path.is_self());
        assert_eq!(path.path.to_dotted(), "self.group.name");
    }

    #[test]
    fn call_with_keyword_arguments() {
        let arena = Bump::new();
        let Expr::Call(call) = field_value("types.instance.Instance(1, param=3)", &arena) else {
            panic!("expected call");
        };
        let Expr::Path(callee) = call.callee else {
            panic!("expected path callee");
        };
        assert_eq!(callee.path.to_dotted(), "types.instance.Instance");
        assert_eq!(call.args.len(), 2);
        assert!(call.args[0].name.is_none());
        assert_eq!(call.args[1].name.map(|n| n.name), Some("param"));
    }

    #[test]
    fn list_of_calls_across_lines() {
        let arena = Bump::new();
        let Expr::List(list) = field_value("[\n        A(param=1),\n        B(),\n    ]", &arena) else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 2);
        assert!(matches!(list.items[1], Expr::Call(_)));
    }

    #[test]
    fn positional_after_keyword_is_rejected() {
        let arena = Bump::new();
        assert!(Parser::parse("class T:\n    field v = f(a=1, 2)\n", &arena).is_err());
    }

    #[test]
    fn missing_expression_is_reported() {
        let arena = Bump::new();
        let errors = Parser::parse("class T:\n    field v = )\n", &arena).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.kind == ParseErrorKind::ExpectedExpression)
        );
    }

    #[test]
    fn unescape_rules() {
        assert_eq!(unescape("\"plain\""), "plain");
        assert_eq!(unescape("'it\\'s'"), "it's");
        assert_eq!(unescape("'\\q'"), "\\q");
    }
}
