// SPDX-License-Identifier: Apache-2.0

//! A small CNF algebra and DIMACS writer.
//!
//! Variables are dense indices starting at 0; a literal is a signed index
//! where the negation of variable v is the bitwise complement `!v`. The
//! non-clausal operations (negation, disjunction, biconditional) distribute
//! clauses directly, which stays cheap only because the encoder applies them
//! to single-clause operands; no Tseitin auxiliaries are introduced.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::ops::Not;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

/// A literal: variable index `v` when non-negative, `!v` for its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Lit(pub i32);

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(!self.0)
    }
}

impl Lit {
    pub fn variable(self) -> i32 {
        if self.0 >= 0 {
            self.0
        } else {
            !self.0
        }
    }

    pub fn mentions(self, var: i32) -> bool {
        self.0 == var || self.0 == !var
    }

    pub fn render(self, vars: &VarTable) -> String {
        if self.0 >= 0 {
            vars.names[self.0 as usize].clone()
        } else {
            format!("~{}", vars.names[(!self.0) as usize])
        }
    }
}

/// Disjunction of literals. An empty clause is false.
#[derive(Debug, Clone, Default, Eq)]
pub struct Clause {
    pub literals: Vec<Lit>,
}

impl Clause {
    /// The empty clause: false.
    pub fn empty() -> Clause {
        Clause::default()
    }

    pub fn unit(literal: Lit) -> Clause {
        Clause {
            literals: vec![literal],
        }
    }

    pub fn or(literals: &[Lit]) -> Clause {
        Clause {
            literals: literals.to_vec(),
        }
    }

    /// a ⇒ b as the clause (¬a ∨ b).
    pub fn implies(a: Lit, b: Lit) -> Clause {
        Clause::or(&[!a, b])
    }

    pub fn mentions(&self, var: i32) -> bool {
        self.literals.iter().any(|lit| lit.mentions(var))
    }

    pub fn render(&self, vars: &VarTable) -> String {
        if self.literals.is_empty() {
            return "false".to_string();
        }
        self.literals
            .iter()
            .map(|lit| lit.render(vars))
            .collect::<Vec<_>>()
            .join(" || ")
    }
}

impl PartialEq for Clause {
    /// Literal order does not matter.
    fn eq(&self, other: &Clause) -> bool {
        let mut a = self.literals.clone();
        let mut b = other.literals.clone();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

/// Conjunction of clauses. No clauses = true; one empty clause = false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formula {
    clauses: Vec<Clause>,
}

impl From<Clause> for Formula {
    fn from(clause: Clause) -> Formula {
        Formula {
            clauses: vec![clause],
        }
    }
}

impl Formula {
    pub fn truth() -> Formula {
        Formula::default()
    }

    pub fn falsity() -> Formula {
        Formula::from(Clause::empty())
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_true(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn is_false(&self) -> bool {
        self.clauses.len() == 1 && self.clauses[0].literals.is_empty()
    }

    pub fn and_assign(&mut self, other: Formula) {
        self.clauses.extend(other.clauses);
    }

    pub fn and_assign_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Negation. A single clause distributes into unit clauses; multiple
    /// clauses recurse through De Morgan. Only used on tiny formulas.
    pub fn negate(&self) -> Formula {
        if self.clauses.is_empty() {
            return Formula::falsity();
        }
        if self.clauses.len() == 1 {
            let clauses = self.clauses[0]
                .literals
                .iter()
                .map(|&lit| Clause::unit(!lit))
                .collect();
            return Formula { clauses };
        }
        let mut result = Formula::falsity();
        for clause in &self.clauses {
            result = result.or(&Formula::from(clause.clone()).negate());
        }
        result
    }

    /// Disjunction by clause distribution: single clauses merge literal
    /// lists, anything larger takes the Cartesian product.
    pub fn or(&self, other: &Formula) -> Formula {
        if self.clauses.is_empty() || other.clauses.is_empty() {
            return Formula::truth();
        }
        if self.clauses.len() == 1 && other.clauses.len() == 1 {
            let mut clause = self.clauses[0].clone();
            clause.literals.extend(&other.clauses[0].literals);
            return Formula::from(clause);
        }
        let mut result = Formula::truth();
        for a in &self.clauses {
            for b in &other.clauses {
                result.and_assign(Formula::from(a.clone()).or(&Formula::from(b.clone())));
            }
        }
        result
    }

    /// Biconditional: (A ∨ ¬B) ∧ (¬A ∨ B).
    pub fn iff(&self, other: &Formula) -> Formula {
        let mut result = self.or(&other.negate());
        result.and_assign(self.negate().or(other));
        result
    }

    pub fn mentions(&self, var: i32) -> bool {
        self.clauses.iter().any(|clause| clause.mentions(var))
    }

    pub fn render(&self, vars: &VarTable) -> String {
        if self.clauses.is_empty() {
            return "true".to_string();
        }
        self.clauses
            .iter()
            .map(|clause| format!("({})", clause.render(vars)))
            .collect::<Vec<_>>()
            .join(" && ")
    }

    fn write_dimacs_to(&self, vars: &VarTable, out: &mut dyn Write) -> io::Result<()> {
        for (k, name) in vars.names.iter().enumerate() {
            writeln!(out, "c var {} : {}", k + 1, name)?;
        }
        writeln!(out, "p cnf {} {}", vars.names.len(), self.clauses.len())?;
        let mut line = String::with_capacity(1024);
        for clause in &self.clauses {
            line.clear();
            for lit in &clause.literals {
                // DIMACS is 1-based; `!v == -v - 1`, so a negated literal's
                // raw value is already the right signed index.
                if lit.0 >= 0 {
                    line.push_str(&(lit.0 + 1).to_string());
                } else {
                    line.push_str(&lit.0.to_string());
                }
                line.push(' ');
            }
            line.push_str("0\n");
            out.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    /// Writes DIMACS with one `c var k : name` comment per variable.
    /// A `.gz` suffix selects gzip compression.
    pub fn write_dimacs(&self, path: &Path, vars: &VarTable) -> Result<()> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let result = if path.extension().map(|e| e == "gz").unwrap_or(false) {
            let mut out = GzEncoder::new(BufWriter::new(file), Compression::default());
            self.write_dimacs_to(vars, &mut out)
                .and_then(|_| out.finish())
                .and_then(|mut inner| inner.flush())
        } else {
            let mut out = BufWriter::new(file);
            self.write_dimacs_to(vars, &mut out).and_then(|_| out.flush())
        };
        result.with_context(|| format!("writing {}", path.display()))
    }
}

/// Declaration-ordered variable names; index k becomes DIMACS variable k+1.
#[derive(Debug, Default)]
pub struct VarTable {
    names: Vec<String>,
}

impl VarTable {
    pub fn new() -> VarTable {
        VarTable::default()
    }

    pub fn add(&mut self, name: impl Into<String>) -> Lit {
        let literal = Lit(self.names.len() as i32);
        self.names.push(name.into());
        literal
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truth_table_constants() {
        assert!(Formula::truth().is_true());
        assert!(!Formula::truth().is_false());
        assert!(Formula::falsity().is_false());
        assert!(Formula::truth().negate().is_false());
        assert!(Formula::falsity().negate().is_true());
    }

    #[test]
    fn literal_negation_is_bitwise_complement() {
        let a = Lit(0);
        assert_eq!((!a).0, -1);
        assert_eq!((!!a), a);
        assert_eq!((!a).variable(), 0);
        assert_eq!(Lit(5).variable(), 5);
        assert_eq!((!Lit(5)).variable(), 5);
    }

    #[test]
    fn or_merges_single_clauses() {
        let mut vars = VarTable::new();
        let a = Formula::from(Clause::unit(vars.add("a")));
        let b = Formula::from(Clause::unit(vars.add("b")));
        let or = a.or(&b);
        assert_eq!(or.clauses().len(), 1);
        assert_eq!(or.render(&vars), "(a || b)");
        assert!(Formula::truth().or(&a).is_true());
    }

    #[test]
    fn iff_expands_to_two_implications() {
        let mut vars = VarTable::new();
        let a = Formula::from(Clause::unit(vars.add("a")));
        let b = Formula::from(Clause::unit(vars.add("b")));
        let iff = a.iff(&b);
        assert_eq!(iff.render(&vars), "(a || ~b) && (~a || b)");
        assert!(Formula::truth().iff(&Formula::truth()).is_true());
        assert!(Formula::falsity().iff(&Formula::falsity()).is_true());
        assert!(Formula::truth().iff(&Formula::falsity()).is_false());
    }

    #[test]
    fn iff_with_wide_clause_matches_biconditional_shape() {
        // used ↔ (g1 ∨ g2) distributes into
        // (used ∨ ¬g1) ∧ (used ∨ ¬g2) ∧ (¬used ∨ g1 ∨ g2).
        let mut vars = VarTable::new();
        let used = vars.add("used");
        let g1 = vars.add("g1");
        let g2 = vars.add("g2");
        let lhs = Formula::from(Clause::unit(used));
        let rhs = Formula::from(Clause::or(&[g1, g2]));
        let iff = lhs.iff(&rhs);
        assert_eq!(
            iff.render(&vars),
            "(used || ~g1) && (used || ~g2) && (~used || g1 || g2)"
        );
    }

    #[test]
    fn clause_equality_ignores_order() {
        let a = Lit(0);
        let b = Lit(1);
        assert_eq!(Clause::or(&[a, b]), Clause::or(&[b, a]));
        assert_ne!(Clause::or(&[a, b]), Clause::or(&[a, !b]));
    }

    #[test]
    fn dimacs_output_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.cnf");
        let mut vars = VarTable::new();
        let a = vars.add("a");
        let b = vars.add("b");
        let mut formula = Formula::truth();
        formula.and_assign_clause(Clause::unit(a));
        formula.and_assign_clause(Clause::or(&[!a, b]));
        formula.write_dimacs(&path, &vars).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "c var 1 : a\nc var 2 : b\np cnf 2 2\n1 0\n-1 2 0\n");
    }

    #[test]
    fn dimacs_gzip_roundtrip() {
        use flate2::read::MultiGzDecoder;
        use std::io::Read;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.cnf.gz");
        let mut vars = VarTable::new();
        let a = vars.add("a");
        let formula = Formula::from(Clause::unit(!a));
        formula.write_dimacs(&path, &vars).unwrap();
        let mut text = String::new();
        MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "c var 1 : a\np cnf 1 1\n-1 0\n");
    }
}
