//! Minimal symbolic scalar expressions.
//!
//! An [`Expr`] is an immutable tree shared through `Rc`, so cloning is cheap
//! and sub-expressions can appear in several places (the dynamics reuse the
//! denominator term in two rows). Only the operations the cart-pendulum model
//! needs are provided: arithmetic, integer powers, `sin` and `cos`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Values assigned to symbol names for evaluation.
pub type Bindings<'a> = HashMap<&'a str, f64>;

#[derive(Debug, PartialEq)]
enum Node {
    Const(f64),
    Sym(String),
    Neg(Expr),
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Div(Expr, Expr),
    Powi(Expr, i32),
    Sin(Expr),
    Cos(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr(Rc<Node>);

impl Expr {
    fn node(node: Node) -> Self {
        Expr(Rc::new(node))
    }

    pub fn sym(name: &str) -> Self {
        Self::node(Node::Sym(name.to_owned()))
    }

    pub fn constant(value: f64) -> Self {
        Self::node(Node::Const(value))
    }

    pub fn sin(&self) -> Self {
        Self::node(Node::Sin(self.clone()))
    }

    pub fn cos(&self) -> Self {
        Self::node(Node::Cos(self.clone()))
    }

    pub fn powi(&self, n: i32) -> Self {
        Self::node(Node::Powi(self.clone(), n))
    }

    /// Name of the symbol if this expression is a bare symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match &*self.0 {
            Node::Sym(name) => Some(name),
            _ => None,
        }
    }

    pub fn eval(&self, bindings: &Bindings) -> Result<f64> {
        let v = match &*self.0 {
            Node::Const(c) => *c,
            Node::Sym(name) => *bindings
                .get(name.as_str())
                .ok_or_else(|| Error::UnboundSymbol(name.clone()))?,
            Node::Neg(a) => -a.eval(bindings)?,
            Node::Add(a, b) => a.eval(bindings)? + b.eval(bindings)?,
            Node::Sub(a, b) => a.eval(bindings)? - b.eval(bindings)?,
            Node::Mul(a, b) => a.eval(bindings)? * b.eval(bindings)?,
            Node::Div(a, b) => a.eval(bindings)? / b.eval(bindings)?,
            Node::Powi(a, n) => a.eval(bindings)?.powi(*n),
            Node::Sin(a) => a.eval(bindings)?.sin(),
            Node::Cos(a) => a.eval(bindings)?.cos(),
        };
        Ok(v)
    }

    /// Free symbols, sorted and de-duplicated.
    pub fn symbols(&self) -> Vec<String> {
        let mut set = BTreeSet::new();
        self.collect_symbols(&mut set);
        set.into_iter().collect()
    }

    fn collect_symbols(&self, set: &mut BTreeSet<String>) {
        match &*self.0 {
            Node::Const(_) => {}
            Node::Sym(name) => {
                set.insert(name.clone());
            }
            Node::Neg(a) | Node::Powi(a, _) | Node::Sin(a) | Node::Cos(a) => {
                a.collect_symbols(set)
            }
            Node::Add(a, b) | Node::Sub(a, b) | Node::Mul(a, b) | Node::Div(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match &*self.0 {
            Node::Add(..) | Node::Sub(..) => 1,
            Node::Mul(..) | Node::Div(..) => 2,
            Node::Neg(_) => 3,
            Node::Const(c) if *c < 0.0 => 3,
            Node::Powi(..) => 4,
            _ => 5,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        let prec = self.precedence();
        if prec < min {
            write!(f, "(")?;
        }
        match &*self.0 {
            Node::Const(c) => write!(f, "{c}")?,
            Node::Sym(name) => write!(f, "{name}")?,
            Node::Neg(a) => {
                write!(f, "-")?;
                a.fmt_prec(f, 4)?;
            }
            Node::Add(a, b) => {
                a.fmt_prec(f, 1)?;
                write!(f, " + ")?;
                b.fmt_prec(f, 1)?;
            }
            Node::Sub(a, b) => {
                a.fmt_prec(f, 1)?;
                write!(f, " - ")?;
                b.fmt_prec(f, 2)?;
            }
            Node::Mul(a, b) => {
                a.fmt_prec(f, 2)?;
                write!(f, "*")?;
                b.fmt_prec(f, 2)?;
            }
            Node::Div(a, b) => {
                a.fmt_prec(f, 2)?;
                write!(f, "/")?;
                b.fmt_prec(f, 3)?;
            }
            Node::Powi(a, n) => {
                a.fmt_prec(f, 5)?;
                write!(f, "^{n}")?;
            }
            Node::Sin(a) => {
                write!(f, "sin(")?;
                a.fmt_prec(f, 0)?;
                write!(f, ")")?;
            }
            Node::Cos(a) => {
                write!(f, "cos(")?;
                a.fmt_prec(f, 0)?;
                write!(f, ")")?;
            }
        }
        if prec < min {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

/// Evaluate every entry of an expression vector.
pub fn eval_all(exprs: &[Expr], bindings: &Bindings) -> Result<Vec<f64>> {
    exprs.iter().map(|e| e.eval(bindings)).collect()
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $node:ident) => {
        impl core::ops::$trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::node(Node::$node(self, rhs))
            }
        }

        impl core::ops::$trait<&Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                Expr::node(Node::$node(self.clone(), rhs.clone()))
            }
        }

        impl core::ops::$trait<f64> for Expr {
            type Output = Expr;

            fn $method(self, rhs: f64) -> Expr {
                Expr::node(Node::$node(self, Expr::constant(rhs)))
            }
        }

        impl core::ops::$trait<Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::node(Node::$node(Expr::constant(self), rhs))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);
impl_binary_op!(Div, div, Div);

impl core::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::node(Node::Neg(self))
    }
}

impl core::ops::Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::node(Node::Neg(self.clone()))
    }
}
