//! Scalar fields compiled from text
//!
//! A field is parsed once into a [`Tree`], which is flattened into a
//! [`Tape`] that is evaluated for each sample.  Only a fixed set of operators
//! and functions is accepted, so arbitrary text can be compiled without any
//! risk of running foreign code.
use crate::Error;
use log::{info, warn};

mod parse;
mod pretty;
mod tree;

pub use pretty::pretty;
pub use tree::{Axis, BinaryOpcode, Tape, Tree, TreeOp, UnaryOpcode};

/// A function `(x, y) → f(x, y)`
///
/// Implementations may return non-finite values for some inputs; consumers
/// (e.g. the slice sampler) must treat those as "not on the slice".
pub trait ScalarField {
    /// Evaluates the field at a single position
    fn eval(&self, x: f64, y: f64) -> f64;
}

impl<F: Fn(f64, f64) -> f64> ScalarField for F {
    fn eval(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

impl ScalarField for Tree {
    fn eval(&self, x: f64, y: f64) -> f64 {
        Tree::eval(self, x, y)
    }
}

/// Compiled field, along with the text that produced it
#[derive(Clone)]
pub struct Field {
    text: String,
    tape: Tape,
}

impl std::fmt::Debug for Field {
    // Tapes can be huge, so only their length is shown
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("text", &self.text)
            .field("steps", &self.tape.len())
            .finish()
    }
}

impl Field {
    /// Parses a field from text, returning an error if it's malformed
    pub fn parse(text: &str) -> Result<Self, Error> {
        let tree = parse::parse(text)?;
        Ok(Self::new(text, tree))
    }

    /// Builds the constant-zero field
    pub fn zero() -> Self {
        Self::new("0", Tree::constant(0.0))
    }

    fn new(text: &str, tree: Tree) -> Self {
        Self {
            text: text.to_owned(),
            tape: Tape::new(&tree),
        }
    }

    /// Returns the source text of this field
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::zero()
    }
}

impl ScalarField for Field {
    fn eval(&self, x: f64, y: f64) -> f64 {
        self.tape.eval(x, y)
    }
}

/// Result of a soft-failing compilation
#[derive(Clone, Debug)]
pub struct Compiled {
    /// Compiled field (constant zero if compilation failed)
    pub field: Field,
    /// Compilation error, to be shown to the user once
    pub warning: Option<Error>,
}

/// Compiles a field from text, falling back to a constant-zero field
///
/// This function never fails: if the text is malformed, the returned field
/// evaluates to `0` everywhere and `warning` holds the parse error.
pub fn compile(text: &str) -> Compiled {
    match Field::parse(text) {
        Ok(field) => {
            info!("compiled f(x, y) = {text}");
            Compiled {
                field,
                warning: None,
            }
        }
        Err(e) => {
            warn!("bad f(x, y) expression {text:?}: {e}");
            Compiled {
                field: Field::zero(),
                warning: Some(e),
            }
        }
    }
}

/// Built-in equations
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, strum::Display, strum::EnumIter,
)]
#[allow(missing_docs)]
pub enum Preset {
    #[strum(to_string = "Paraboloid")]
    Paraboloid,
    #[strum(to_string = "Saddle")]
    Saddle,
    #[strum(to_string = "Cone")]
    Cone,
    #[strum(to_string = "Hyperbolic paraboloid")]
    Hyperbolic,
    #[strum(to_string = "Elliptic paraboloid")]
    Elliptic,
    #[strum(to_string = "Monkey saddle")]
    MonkeySaddle,
    #[strum(to_string = "Ripple")]
    Ripple,
}

impl Preset {
    /// Returns the equation text for this preset
    pub fn equation(&self) -> &'static str {
        match self {
            Preset::Paraboloid => "x*x + y*y",
            Preset::Saddle => "x*x - y*y",
            Preset::Cone => "sqrt(x*x + y*y)",
            Preset::Hyperbolic => "x*y",
            Preset::Elliptic => "x*x/4 + y*y",
            Preset::MonkeySaddle => "(x*x*x - 3*x*y*y) / 10",
            Preset::Ripple => "5 * sin(sqrt(x*x + y*y))",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn compile_good() {
        let c = compile("x*x + y*y");
        assert!(c.warning.is_none());
        assert_eq!(c.field.eval(1.0, 2.0), 5.0);
        assert_eq!(c.field.text(), "x*x + y*y");
    }

    #[test]
    fn compile_bad_falls_back_to_zero() {
        for text in ["(x + y", "x +", "sqr(x)", "", "x # y"] {
            let c = compile(text);
            assert!(c.warning.is_some(), "expected warning for {text:?}");
            for (x, y) in [(0.0, 0.0), (1.0, -2.0), (1e6, 3.5)] {
                assert_eq!(c.field.eval(x, y), 0.0);
            }
        }
    }

    #[test]
    fn deep_recursion_compile() {
        // A long flat sum parses in a loop, then builds a very deep tree
        let text = format!("x{}", " + 1".repeat(200_000));
        let c = compile(&text);
        assert!(c.warning.is_none());
        assert_eq!(c.field.eval(0.5, 0.0), 200_000.5);
        assert!(format!("{:?}", c.field).contains("steps"));
        drop(c);

        // Deep nesting is rejected instead of overflowing the parser
        let text = format!("{}x{}", "(".repeat(100_000), ")".repeat(100_000));
        let c = compile(&text);
        assert!(matches!(c.warning, Some(Error::TooDeep(..))));
        assert_eq!(c.field.eval(1.0, 2.0), 0.0);

        let c = compile(&format!("{}x", "-".repeat(100_000)));
        assert!(matches!(c.warning, Some(Error::TooDeep(..))));
    }

    #[test]
    fn closures_are_fields() {
        let f = |x: f64, y: f64| x - y;
        assert_eq!(ScalarField::eval(&f, 3.0, 1.0), 2.0);
    }

    #[test]
    fn presets_compile() {
        for p in Preset::iter() {
            let c = compile(p.equation());
            assert!(c.warning.is_none(), "preset {p} failed to compile");
        }
    }
}
