//! Context-free math trees, and flat tapes for evaluating them
use std::sync::Arc;

/// A one-argument math operation
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[allow(missing_docs)]
pub enum UnaryOpcode {
    Neg,
    Abs,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
}

impl UnaryOpcode {
    fn apply(self, a: f64) -> f64 {
        match self {
            UnaryOpcode::Neg => -a,
            UnaryOpcode::Abs => a.abs(),
            UnaryOpcode::Sqrt => a.sqrt(),
            UnaryOpcode::Sin => a.sin(),
            UnaryOpcode::Cos => a.cos(),
            UnaryOpcode::Tan => a.tan(),
            UnaryOpcode::Exp => a.exp(),
            UnaryOpcode::Ln => a.ln(),
        }
    }
}

/// A two-argument math operation
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[allow(missing_docs)]
pub enum BinaryOpcode {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Min,
    Max,
    Atan2,
}

impl BinaryOpcode {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOpcode::Add => a + b,
            BinaryOpcode::Sub => a - b,
            BinaryOpcode::Mul => a * b,
            BinaryOpcode::Div => a / b,
            BinaryOpcode::Pow => a.powf(b),
            BinaryOpcode::Min => a.min(b),
            BinaryOpcode::Max => a.max(b),
            BinaryOpcode::Atan2 => a.atan2(b),
        }
    }
}

/// Input axis
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Axis {
    X,
    Y,
}

/// Opcode type for trees
#[derive(Debug)]
#[allow(missing_docs)]
pub enum TreeOp {
    Input(Axis),
    Const(f64),
    Binary(BinaryOpcode, Tree, Tree),
    Unary(UnaryOpcode, Tree),
}

impl Drop for TreeOp {
    fn drop(&mut self) {
        // Leaf children can't recurse, so the default drop is fine
        if self.children().all(|c| c.is_leaf()) {
            return;
        }

        // Otherwise, unlink nodes onto a heap-allocated worklist so that
        // dropping a very deep tree doesn't overflow the stack.
        let leaf = Arc::new(TreeOp::Const(0.0));
        let mut todo = vec![std::mem::replace(self, TreeOp::Const(0.0))];
        while let Some(mut t) = todo.pop() {
            for c in t.children_mut() {
                let child = std::mem::replace(&mut c.0, leaf.clone());
                todo.extend(Arc::into_inner(child));
            }
        }
    }
}

impl TreeOp {
    fn is_leaf(&self) -> bool {
        matches!(self, TreeOp::Const(..) | TreeOp::Input(..))
    }

    fn children(&self) -> impl Iterator<Item = &Tree> {
        match self {
            TreeOp::Const(..) | TreeOp::Input(..) => [None, None],
            TreeOp::Unary(_, a) => [Some(a), None],
            TreeOp::Binary(_, a, b) => [Some(a), Some(b)],
        }
        .into_iter()
        .flatten()
    }

    fn children_mut(&mut self) -> impl Iterator<Item = &mut Tree> {
        match self {
            TreeOp::Const(..) | TreeOp::Input(..) => [None, None],
            TreeOp::Unary(_, a) => [Some(a), None],
            TreeOp::Binary(_, a, b) => [Some(a), Some(b)],
        }
        .into_iter()
        .flatten()
    }
}

/// Owned handle for a standalone math tree
///
/// Trees are cheap to clone; clones share the same underlying nodes.
#[derive(Clone, Debug)]
pub struct Tree(Arc<TreeOp>);

impl std::ops::Deref for Tree {
    type Target = TreeOp;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<f64> for Tree {
    fn from(v: f64) -> Tree {
        Tree::constant(v)
    }
}

#[allow(missing_docs)]
impl Tree {
    pub fn x() -> Self {
        Tree(Arc::new(TreeOp::Input(Axis::X)))
    }
    pub fn y() -> Self {
        Tree(Arc::new(TreeOp::Input(Axis::Y)))
    }
    pub fn constant(f: f64) -> Self {
        Tree(Arc::new(TreeOp::Const(f)))
    }
    pub(crate) fn op_unary(a: Tree, op: UnaryOpcode) -> Self {
        Tree(Arc::new(TreeOp::Unary(op, a)))
    }
    pub(crate) fn op_binary(a: Tree, b: Tree, op: BinaryOpcode) -> Self {
        Tree(Arc::new(TreeOp::Binary(op, a, b)))
    }
    pub fn pow<T: Into<Tree>>(&self, other: T) -> Self {
        Self::op_binary(self.clone(), other.into(), BinaryOpcode::Pow)
    }

    /// Evaluates the tree at the given position
    ///
    /// This flattens the tree on every call; use a [`Tape`] to evaluate the
    /// same tree many times.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        Tape::new(self).eval(x, y)
    }
}

macro_rules! impl_binary {
    ($op:ident, $base_fn:ident, $opcode:ident) => {
        impl<A: Into<Tree>> std::ops::$op<A> for Tree {
            type Output = Tree;

            fn $base_fn(self, other: A) -> Self {
                Tree::op_binary(self, other.into(), BinaryOpcode::$opcode)
            }
        }
        impl std::ops::$op<Tree> for f64 {
            type Output = Tree;
            fn $base_fn(self, other: Tree) -> Tree {
                Tree::from(self).$base_fn(other)
            }
        }
    };
}

impl_binary!(Add, add, Add);
impl_binary!(Sub, sub, Sub);
impl_binary!(Mul, mul, Mul);
impl_binary!(Div, div, Div);

impl std::ops::Neg for Tree {
    type Output = Tree;
    fn neg(self) -> Self::Output {
        Tree::op_unary(self, UnaryOpcode::Neg)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Copy, Clone, Debug, PartialEq)]
enum Step {
    Input(Axis),
    Const(f64),
    Unary(UnaryOpcode),
    Binary(BinaryOpcode),
}

/// Tree flattened into postfix order, for repeated evaluation
///
/// Evaluation runs on a value stack rather than the call stack, so trees of
/// any depth can be evaluated.  Invalid operations (e.g. `sqrt(-1)` or
/// `1 / 0`) follow IEEE-754 rules and produce `NaN` or an infinity; it's up
/// to the caller to decide what to do with non-finite results.
#[derive(Clone, Debug)]
pub struct Tape {
    steps: Vec<Step>,
    stack_size: usize,
}

impl Tape {
    /// Flattens the given tree
    pub fn new(tree: &Tree) -> Self {
        let mut steps = vec![];
        // Each node is visited twice: once to queue its children, then again
        // (with `ready` set) to emit its own step.
        let mut todo: Vec<(&TreeOp, bool)> = vec![(&**tree, false)];
        while let Some((t, ready)) = todo.pop() {
            match t {
                TreeOp::Input(a) => steps.push(Step::Input(*a)),
                TreeOp::Const(c) => steps.push(Step::Const(*c)),
                TreeOp::Unary(op, _) if ready => steps.push(Step::Unary(*op)),
                TreeOp::Binary(op, ..) if ready => {
                    steps.push(Step::Binary(*op))
                }
                TreeOp::Unary(_, a) => {
                    todo.push((t, true));
                    todo.push((&**a, false));
                }
                TreeOp::Binary(_, a, b) => {
                    // The left-hand argument goes on top, so it's emitted
                    // first
                    todo.push((t, true));
                    todo.push((&**b, false));
                    todo.push((&**a, false));
                }
            }
        }

        let mut depth = 0usize;
        let mut stack_size = 0;
        for s in &steps {
            match s {
                Step::Input(..) | Step::Const(..) => depth += 1,
                Step::Unary(..) => (),
                Step::Binary(..) => depth = depth.saturating_sub(1),
            }
            stack_size = stack_size.max(depth);
        }
        Self { steps, stack_size }
    }

    /// Returns the number of steps in the tape
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Checks whether the tape is empty (which is never true)
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Evaluates the tape at the given position
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let mut stack = Vec::with_capacity(self.stack_size);
        for s in &self.steps {
            let v = match *s {
                Step::Input(Axis::X) => x,
                Step::Input(Axis::Y) => y,
                Step::Const(c) => c,
                Step::Unary(op) => {
                    let a = stack.pop().unwrap_or(f64::NAN);
                    op.apply(a)
                }
                Step::Binary(op) => {
                    let b = stack.pop().unwrap_or(f64::NAN);
                    let a = stack.pop().unwrap_or(f64::NAN);
                    op.apply(a, b)
                }
            };
            stack.push(v);
        }
        stack.pop().unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tree_eval() {
        let (x, y) = (Tree::x(), Tree::y());
        let t = x.clone() * x + y.pow(2.0);
        assert_eq!(t.eval(3.0, 4.0), 25.0);

        let t = (Tree::x() - 1.0) / Tree::y();
        assert_eq!(t.eval(3.0, 4.0), 0.5);
        assert!(t.eval(1.0, 0.0).is_nan());

        let t = -Tree::x().pow(2.0);
        assert_eq!(t.eval(3.0, 0.0), -9.0);

        let t = 10.0 - Tree::x();
        assert_eq!(t.eval(3.0, 0.0), 7.0);
    }

    #[test]
    fn tree_non_finite() {
        let t = Tree::op_unary(Tree::x(), UnaryOpcode::Sqrt);
        assert!(t.eval(-1.0, 0.0).is_nan());
        let t = Tree::from(1.0) / Tree::x();
        assert!(t.eval(0.0, 0.0).is_infinite());
        let t = Tree::op_unary(Tree::x(), UnaryOpcode::Ln);
        assert!(t.eval(0.0, 0.0).is_infinite());
    }

    #[test]
    fn tree_binary_ops() {
        let (x, y) = (Tree::x(), Tree::y());
        let bin = |op| Tree::op_binary(x.clone(), y.clone(), op);
        assert_eq!(bin(BinaryOpcode::Min).eval(1.0, 2.0), 1.0);
        assert_eq!(bin(BinaryOpcode::Max).eval(1.0, 2.0), 2.0);
        assert_eq!(bin(BinaryOpcode::Atan2).eval(0.0, 1.0), 0.0);
        assert_eq!((x * 2.0).eval(1.5, 0.0), 3.0);
    }

    #[test]
    fn tape_order() {
        // Left and right arguments must not be swapped
        let t = (Tree::x() - Tree::y()) / (Tree::y() - 1.0);
        let tape = Tape::new(&t);
        assert_eq!(tape.len(), 7);
        assert_eq!(tape.stack_size, 3);
        assert_eq!(tape.eval(5.0, 3.0), 1.0);
    }

    #[test]
    fn deep_recursion_drop() {
        let mut x = Tree::x();
        for _ in 0..1_000_000 {
            x = x + 1.0;
        }
        drop(x);
        // we should not overflow the stack here!

        let mut x = Tree::x();
        for _ in 0..1_000_000 {
            x = 1.0 - x;
        }
        drop(x);
    }

    #[test]
    fn deep_recursion_eval() {
        let mut x = Tree::x();
        for _ in 0..1_000_000 {
            x = x + 1.0;
        }
        assert_eq!(x.eval(0.5, 0.0), 1_000_000.5);

        let mut y = Tree::y();
        for _ in 0..1_000_000 {
            y = -y;
        }
        let tape = Tape::new(&y);
        assert_eq!(tape.len(), 1_000_001);
        assert_eq!(tape.eval(0.0, 2.0), 2.0);
    }
}
