//! Tokenizer and recursive-descent parser for field expressions
//!
//! The grammar is deliberately small:
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('-' | '+') unary | power
//! power  := atom (('^' | '**') unary)?
//! atom   := number | ident | ident '(' args ')' | '(' expr ')'
//! args   := expr (',' expr)*
//! ```
//! Identifiers are limited to the variables `x` and `y`, the constants `pi`
//! and `e`, and a fixed table of functions.  A `Math.` prefix is accepted and
//! ignored, so `Math.sqrt(x)` and `sqrt(x)` are equivalent.
//!
//! Nesting depth is capped at [`MAX_DEPTH`]; long flat chains like
//! `x + 1 + 1 + ...` are parsed in a loop and have no limit.
use super::tree::{BinaryOpcode, Tree, UnaryOpcode};
use crate::Error;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Ident(s) => write!(f, "{s}"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
        }
    }
}

/// Single token, with its byte range in the source text
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// Splits the input text into tokens
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, Error> {
    let bytes = text.as_bytes();
    let mut out = vec![];
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let kind = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                i += 1;
                TokenKind::Caret
            }
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'^' => TokenKind::Caret,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, i);
                let s = &text[start..i];
                let v = s
                    .parse::<f64>()
                    .map_err(|_| Error::BadNumber(start, s.to_owned()))?;
                out.push(Token {
                    kind: TokenKind::Number(v),
                    start,
                    end: i,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                i = scan_ident(bytes, i);
                let mut name = &text[start..i];
                // `Math.` prefix, as in `Math.sqrt(x)`
                if name == "Math"
                    && bytes.get(i) == Some(&b'.')
                    && bytes
                        .get(i + 1)
                        .is_some_and(|c| c.is_ascii_alphabetic())
                {
                    let inner = i + 1;
                    i = scan_ident(bytes, inner);
                    name = &text[inner..i];
                }
                out.push(Token {
                    kind: TokenKind::Ident(name.to_owned()),
                    start,
                    end: i,
                });
                continue;
            }
            _ => {
                // Report the full (possibly multi-byte) character
                let ch = text[i..].chars().next().unwrap_or('?');
                return Err(Error::UnexpectedChar(i, ch));
            }
        };
        i += 1;
        out.push(Token {
            kind,
            start,
            end: i,
        });
    }
    Ok(out)
}

fn scan_ident(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len()
        && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
    {
        i += 1;
    }
    i
}

fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    // Only treat `e` as an exponent if digits follow it
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

////////////////////////////////////////////////////////////////////////////////

/// Parses an expression into a [`Tree`]
pub(crate) fn parse(text: &str) -> Result<Tree, Error> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(Error::EmptyExpression);
    }
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let t = p.expr()?;
    match p.peek() {
        None => Ok(t),
        Some(tok) => {
            Err(Error::UnexpectedToken(tok.start, tok.kind.to_string()))
        }
    }
}

/// Maximum nesting of parentheses, unary operators, and exponents
pub(crate) const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, Error> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t.ok_or(Error::UnexpectedEnd)
    }

    /// Consumes the next token if it matches `kind`
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), Error> {
        let t = self.next()?;
        if t.kind == kind {
            Ok(())
        } else {
            Err(Error::UnexpectedToken(t.start, t.kind.to_string()))
        }
    }

    fn expr(&mut self) -> Result<Tree, Error> {
        let mut lhs = self.term()?;
        loop {
            if self.eat(&TokenKind::Plus) {
                lhs = lhs + self.term()?;
            } else if self.eat(&TokenKind::Minus) {
                lhs = lhs - self.term()?;
            } else {
                break Ok(lhs);
            }
        }
    }

    fn term(&mut self) -> Result<Tree, Error> {
        let mut lhs = self.unary()?;
        loop {
            if self.eat(&TokenKind::Star) {
                lhs = lhs * self.unary()?;
            } else if self.eat(&TokenKind::Slash) {
                lhs = lhs / self.unary()?;
            } else {
                break Ok(lhs);
            }
        }
    }

    /// Every nested construct passes through here, so this is where the
    /// recursion depth is bounded
    fn unary(&mut self) -> Result<Tree, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let out = self.unary_inner();
        self.depth -= 1;
        out
    }

    fn unary_inner(&mut self) -> Result<Tree, Error> {
        if self.eat(&TokenKind::Minus) {
            Ok(-self.unary()?)
        } else if self.eat(&TokenKind::Plus) {
            self.unary()
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> Result<Tree, Error> {
        let base = self.atom()?;
        if self.eat(&TokenKind::Caret) {
            // Right-associative, and binds tighter than unary minus on the
            // left: `-x^2` is `-(x^2)`, while `x^-2` is allowed
            let exp = self.unary()?;
            Ok(base.pow(exp))
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> Result<Tree, Error> {
        let tok = self.next()?;
        match tok.kind {
            TokenKind::Number(v) => Ok(Tree::constant(v)),
            TokenKind::LParen => {
                let t = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(t)
            }
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::LParen) {
                    let args = self.args()?;
                    call(tok.start, &name, args)
                } else {
                    ident(tok.start, &name)
                }
            }
            k => Err(Error::UnexpectedToken(tok.start, k.to_string())),
        }
    }

    /// Parses a comma-separated argument list, including the closing paren
    fn args(&mut self) -> Result<Vec<Tree>, Error> {
        let mut out = vec![];
        if self.eat(&TokenKind::RParen) {
            return Ok(out);
        }
        loop {
            out.push(self.expr()?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen)?;
            break Ok(out);
        }
    }
}

fn ident(offset: usize, name: &str) -> Result<Tree, Error> {
    match name {
        "x" | "X" => Ok(Tree::x()),
        "y" | "Y" => Ok(Tree::y()),
        "pi" | "PI" => Ok(Tree::constant(std::f64::consts::PI)),
        "e" | "E" => Ok(Tree::constant(std::f64::consts::E)),
        _ => Err(Error::UnknownIdent(offset, name.to_owned())),
    }
}

enum Func {
    Unary(UnaryOpcode),
    Binary(BinaryOpcode),
}

fn lookup(name: &str) -> Option<(&'static str, Func)> {
    use Func::*;
    let out = match name {
        "sqrt" => ("sqrt", Unary(UnaryOpcode::Sqrt)),
        "abs" => ("abs", Unary(UnaryOpcode::Abs)),
        "sin" => ("sin", Unary(UnaryOpcode::Sin)),
        "cos" => ("cos", Unary(UnaryOpcode::Cos)),
        "tan" => ("tan", Unary(UnaryOpcode::Tan)),
        "exp" => ("exp", Unary(UnaryOpcode::Exp)),
        "ln" => ("ln", Unary(UnaryOpcode::Ln)),
        "log" => ("log", Unary(UnaryOpcode::Ln)),
        "min" => ("min", Binary(BinaryOpcode::Min)),
        "max" => ("max", Binary(BinaryOpcode::Max)),
        "pow" => ("pow", Binary(BinaryOpcode::Pow)),
        "atan2" => ("atan2", Binary(BinaryOpcode::Atan2)),
        _ => return None,
    };
    Some(out)
}

fn call(offset: usize, name: &str, args: Vec<Tree>) -> Result<Tree, Error> {
    let Some((name, f)) = lookup(name) else {
        return Err(Error::UnknownIdent(offset, name.to_owned()));
    };
    let expected = match f {
        Func::Unary(..) => 1,
        Func::Binary(..) => 2,
    };
    if args.len() != expected {
        return Err(Error::BadArity {
            name,
            expected,
            got: args.len(),
        });
    }
    let mut args = args.into_iter();
    let mut arg = || args.next().ok_or(Error::UnexpectedEnd);
    Ok(match f {
        Func::Unary(op) => Tree::op_unary(arg()?, op),
        Func::Binary(op) => {
            let a = arg()?;
            let b = arg()?;
            Tree::op_binary(a, b, op)
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn eval(s: &str, x: f64, y: f64) -> f64 {
        parse(s).unwrap().eval(x, y)
    }

    #[test]
    fn test_tokenize() {
        let t = tokenize("x**2 + Math.sqrt(y)").unwrap();
        let kinds: Vec<_> = t.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("x".to_owned()),
                TokenKind::Caret,
                TokenKind::Number(2.0),
                TokenKind::Plus,
                TokenKind::Ident("sqrt".to_owned()),
                TokenKind::LParen,
                TokenKind::Ident("y".to_owned()),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        let t = tokenize("1.5e3 2e").unwrap();
        assert_eq!(t[0].kind, TokenKind::Number(1500.0));
        assert_eq!(t[1].kind, TokenKind::Number(2.0));
        assert_eq!(t[2].kind, TokenKind::Ident("e".to_owned()));
        assert!(matches!(tokenize("1..2"), Err(Error::BadNumber(0, _))));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0, 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0, 0.0), 9.0);
        assert_eq!(eval("8 / 2 / 2", 0.0, 0.0), 2.0);
        assert_eq!(eval("10 - 2 - 3", 0.0, 0.0), 5.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0, 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0, 0.0), -9.0);
        assert_eq!(eval("x^-1", 4.0, 0.0), 0.25);
        assert_eq!(eval("--x", 4.0, 0.0), 4.0);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("sqrt(x*x + y*y)", 3.0, 4.0), 5.0);
        assert_eq!(eval("Math.sqrt(x)", 9.0, 0.0), 3.0);
        assert_eq!(eval("max(x, y)", 3.0, 4.0), 4.0);
        assert_eq!(eval("pow(x, 2)", 3.0, 0.0), 9.0);
        assert_eq!(eval("abs(x) + abs(y)", -3.0, -4.0), 7.0);
        assert_eq!(eval("pi", 0.0, 0.0), std::f64::consts::PI);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("(x + y").err(), Some(Error::UnexpectedEnd));
        assert_eq!(
            parse("x + y)").err(),
            Some(Error::UnexpectedToken(5, ")".to_owned()))
        );
        assert_eq!(parse("   ").err(), Some(Error::EmptyExpression));
        assert_eq!(
            parse("z + 1").err(),
            Some(Error::UnknownIdent(0, "z".to_owned()))
        );
        assert_eq!(
            parse("foo(x)").err(),
            Some(Error::UnknownIdent(0, "foo".to_owned()))
        );
        assert_eq!(
            parse("sqrt(x, y)").err(),
            Some(Error::BadArity {
                name: "sqrt",
                expected: 1,
                got: 2
            })
        );
        assert_eq!(parse("x $ y").err(), Some(Error::UnexpectedChar(2, '$')));
        assert_eq!(
            parse("x y").err(),
            Some(Error::UnexpectedToken(2, "y".to_owned()))
        );
    }

    #[test]
    fn test_depth_limit() {
        let nested = |n: usize| {
            format!("{}x{}", "(".repeat(n - 1), ")".repeat(n - 1))
        };
        assert_eq!(eval(&nested(MAX_DEPTH), 2.0, 0.0), 2.0);
        assert_eq!(
            parse(&nested(MAX_DEPTH + 1)).err(),
            Some(Error::TooDeep(MAX_DEPTH))
        );
        assert_eq!(
            parse(&format!("{}x", "sqrt(".repeat(1000))).err(),
            Some(Error::TooDeep(MAX_DEPTH))
        );
        assert_eq!(
            parse(&"x^".repeat(1000)).err(),
            Some(Error::TooDeep(MAX_DEPTH))
        );

        // Long flat chains aren't nested, so they're fine
        assert_eq!(eval(&format!("x{}", "/x".repeat(1000)), 1.0, 0.0), 1.0);
    }
}
