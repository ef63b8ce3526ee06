//! Type-safe wrappers for BDD variables and literals.
//!
//! Variables are 1-indexed: index 0 is reserved for the terminal node.
//! The variable order is the numeric order of the indices, so a variable
//! allocated earlier always sits closer to the root.
use std::fmt;
use std::ops::Neg;

/// A variable identifier (1-indexed).
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved for terminals)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit::new(self, false)
    }

    /// Negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit::new(self, true)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A literal: a variable together with a polarity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit {
    var: Var,
    negated: bool,
}

impl Lit {
    pub fn new(var: Var, negated: bool) -> Self {
        Lit { var, negated }
    }

    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_positive(self) -> bool {
        !self.negated
    }

    pub fn is_negative(self) -> bool {
        self.negated
    }

    /// Signed DIMACS-style integer (`-3` for `¬x3`).
    pub fn to_dimacs(self) -> i32 {
        let v = self.var.id() as i32;
        if self.negated {
            -v
        } else {
            v
        }
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Lit::new(self.var, !self.negated)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "~{}", self.var)
        } else {
            write!(f, "{}", self.var)
        }
    }
}
