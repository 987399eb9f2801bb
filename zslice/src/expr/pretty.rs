//! Human-friendly formatting of field expressions
use super::parse::{TokenKind, tokenize};

fn superscript(c: char) -> char {
    match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '-' => '⁻',
        c => c,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Formats an expression for display
///
/// - `x*x` and `y*y` become `x²` and `y²`
/// - `sqrt(` (with or without a `Math.` prefix) becomes `√(`
/// - remaining multiplications become ` · `
/// - integer powers (`^3`, `^-1`) become superscripts
///
/// Whitespace is collapsed.  Text that can't be tokenized is returned as-is,
/// modulo whitespace.
///
/// ```
/// # use zslice::expr::pretty;
/// assert_eq!(pretty("x*x + y*y"), "x² + y²");
/// assert_eq!(pretty("Math.sqrt(x*x+y*y)"), "√(x²+y²)");
/// assert_eq!(pretty("2*x^-1"), "2 · x⁻¹");
/// ```
pub fn pretty(text: &str) -> String {
    let Ok(tokens) = tokenize(text) else {
        return collapse_whitespace(text);
    };

    let kind = |i: usize| tokens.get(i).map(|t| &t.kind);
    let mut out = String::new();
    let mut prev_end: Option<usize> = None;
    let mut i = 0;
    while let Some(t) = tokens.get(i) {
        if prev_end.is_some_and(|e| {
            text[e..t.start].chars().any(char::is_whitespace)
        }) {
            out.push(' ');
        }
        let used = match &t.kind {
            TokenKind::Ident(n)
                if (n == "x" || n == "y")
                    && kind(i + 1) == Some(&TokenKind::Star)
                    && kind(i + 2) == Some(&t.kind) =>
            {
                out.push_str(n);
                out.push('²');
                3
            }
            TokenKind::Ident(n)
                if n == "sqrt" && kind(i + 1) == Some(&TokenKind::LParen) =>
            {
                out.push_str("√(");
                2
            }
            TokenKind::Ident(n) => {
                out.push_str(n);
                1
            }
            TokenKind::Star => {
                out.push_str(" · ");
                1
            }
            TokenKind::Caret => {
                let neg = kind(i + 1) == Some(&TokenKind::Minus);
                let j = if neg { i + 2 } else { i + 1 };
                match tokens.get(j) {
                    Some(n)
                        if matches!(n.kind, TokenKind::Number(..))
                            && text[n.start..n.end]
                                .chars()
                                .all(|c| c.is_ascii_digit()) =>
                    {
                        if neg {
                            out.push(superscript('-'));
                        }
                        let digits = &text[n.start..n.end];
                        out.extend(digits.chars().map(superscript));
                        j - i + 1
                    }
                    _ => {
                        out.push('^');
                        1
                    }
                }
            }
            TokenKind::Number(..) => {
                out.push_str(&text[t.start..t.end]);
                1
            }
            k => {
                out.push_str(&k.to_string());
                1
            }
        };
        i += used;
        prev_end = Some(tokens[i - 1].end);
    }
    collapse_whitespace(&out)
}
