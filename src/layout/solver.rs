//! Constraint optimization for layout computation
//!
//! Layout stages describe their problem as an [`OptimizationModel`]: variables,
//! hard linear constraints and prioritised soft goals. An [`OptimizationEngine`]
//! turns the model into a [`Solution`]. [`CassowaryEngine`] is the default
//! engine, a wrapper around the kasuari Cassowary solver.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use kasuari::{
    Expression, Solver as KasuariSolver, Strength, Term, Variable as KasuariVariable,
    WeightedRelation::*,
};
use thiserror::Error;

// ============================================================================
// Model
// ============================================================================

/// Index of a variable within its model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// A declared model variable
#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    /// Solutions are rounded to the nearest integer
    pub integer: bool,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// `sum(coefficient * variable) + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(var: VarId) -> Self {
        Self::new().plus(var, 1.0)
    }

    /// `a - b`
    pub fn difference(a: VarId, b: VarId) -> Self {
        Self::new().plus(a, 1.0).plus(b, -1.0)
    }

    pub fn plus(mut self, var: VarId, coefficient: f64) -> Self {
        self.terms.push((var, coefficient));
        self
    }

    pub fn offset(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    /// Value of the expression under a solution
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ge,
    Le,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Eq => write!(f, "="),
            Relation::Ge => write!(f, ">="),
            Relation::Le => write!(f, "<="),
        }
    }
}

/// Hard constraint: `expr relation rhs`
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
    /// Human-readable origin, used in error messages
    pub source: String,
}

/// Relative weight of a soft goal
///
/// Weights are additive: a High goal counts 1000 times a Medium one, which
/// counts 1000 times a Low one. Enough lower goals pulling together can still
/// outweigh a single higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    fn strength(self) -> Strength {
        match self {
            Priority::High => Strength::STRONG,
            Priority::Medium => Strength::MEDIUM,
            Priority::Low => Strength::WEAK,
        }
    }
}

/// Soft goal: keep `|expr - target|` small
#[derive(Debug, Clone)]
pub struct SoftGoal {
    pub expr: LinearExpr,
    pub target: f64,
    pub priority: Priority,
}

/// A complete optimization problem
#[derive(Debug, Clone, Default)]
pub struct OptimizationModel {
    pub variables: Vec<VariableDecl>,
    pub constraints: Vec<LinearConstraint>,
    pub goals: Vec<SoftGoal>,
}

impl OptimizationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a continuous variable
    pub fn continuous(&mut self, name: impl Into<String>) -> VarId {
        self.declare(name, false, None, None)
    }

    /// Declare an integer variable within `[lower, upper]`
    pub fn integer(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.declare(name, true, Some(lower), Some(upper))
    }

    fn declare(
        &mut self,
        name: impl Into<String>,
        integer: bool,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> VarId {
        self.variables.push(VariableDecl {
            name: name.into(),
            integer,
            lower,
            upper,
        });
        VarId(self.variables.len() - 1)
    }

    pub fn require(
        &mut self,
        expr: LinearExpr,
        relation: Relation,
        rhs: f64,
        source: impl Into<String>,
    ) {
        self.constraints.push(LinearConstraint {
            expr,
            relation,
            rhs,
            source: source.into(),
        });
    }

    pub fn prefer(&mut self, expr: LinearExpr, target: f64, priority: Priority) {
        self.goals.push(SoftGoal {
            expr,
            target,
            priority,
        });
    }

    pub fn var_name(&self, var: VarId) -> &str {
        self.variables
            .get(var.0)
            .map(|d| d.name.as_str())
            .unwrap_or("?")
    }
}

// ============================================================================
// Errors and solutions
// ============================================================================

/// Errors from the constraint solver
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("unsatisfiable constraint {origin}: {reason}")]
    Unsatisfiable { origin: String, reason: String },

    #[error("no solution within {budget:?}")]
    Timeout { budget: Duration },

    #[error("internal solver error: {0}")]
    Internal(String),
}

/// Solved variable values, indexed by [`VarId`]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub values: Vec<f64>,
}

impl Solution {
    pub fn get(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }

    /// Rounded value of an integer variable
    pub fn get_int(&self, var: VarId) -> i64 {
        self.get(var).round() as i64
    }
}

/// Anything that can solve an [`OptimizationModel`] within a time budget
pub trait OptimizationEngine {
    fn solve(&self, model: &OptimizationModel, budget: Duration)
        -> Result<Solution, SolverError>;
}

impl<E: OptimizationEngine + ?Sized> OptimizationEngine for &E {
    fn solve(
        &self,
        model: &OptimizationModel,
        budget: Duration,
    ) -> Result<Solution, SolverError> {
        (**self).solve(model, budget)
    }
}

// ============================================================================
// Cassowary backend
// ============================================================================

/// Engine backed by the kasuari Cassowary solver
///
/// Soft goals become non-required constraints with strength STRONG, MEDIUM or
/// WEAK (1e6, 1e3, 1) by priority, and the solver minimises the sum of their
/// weighted absolute errors. The time budget is checked between constraint
/// additions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CassowaryEngine;

impl CassowaryEngine {
    pub fn new() -> Self {
        Self
    }
}

fn to_expression(expr: &LinearExpr, vars: &[KasuariVariable]) -> Expression {
    let terms = expr
        .terms
        .iter()
        .map(|(v, c)| Term::new(vars[v.0], *c))
        .collect();
    Expression::new(terms, expr.constant)
}

fn convert_kasuari_error(e: kasuari::AddConstraintError, origin: &str) -> SolverError {
    match e {
        kasuari::AddConstraintError::UnsatisfiableConstraint => SolverError::Unsatisfiable {
            origin: origin.to_string(),
            reason: "conflicts with existing constraints".to_string(),
        },
        kasuari::AddConstraintError::DuplicateConstraint => {
            SolverError::Internal(format!("duplicate constraint: {}", origin))
        }
        kasuari::AddConstraintError::InternalSolverError(msg) => {
            SolverError::Internal(format!("{}: {}", origin, msg))
        }
    }
}

struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    fn check(&self) -> Result<(), SolverError> {
        if self.start.elapsed() >= self.budget {
            Err(SolverError::Timeout {
                budget: self.budget,
            })
        } else {
            Ok(())
        }
    }
}

impl OptimizationEngine for CassowaryEngine {
    fn solve(
        &self,
        model: &OptimizationModel,
        budget: Duration,
    ) -> Result<Solution, SolverError> {
        let deadline = Deadline {
            start: Instant::now(),
            budget,
        };
        let mut solver = KasuariSolver::new();
        let vars: Vec<KasuariVariable> = model
            .variables
            .iter()
            .map(|_| KasuariVariable::new())
            .collect();

        for (i, decl) in model.variables.iter().enumerate() {
            if let Some(lower) = decl.lower {
                solver
                    .add_constraint(vars[i] | GE(Strength::REQUIRED) | lower)
                    .map_err(|e| convert_kasuari_error(e, &format!("{} >= {}", decl.name, lower)))?;
            }
            if let Some(upper) = decl.upper {
                solver
                    .add_constraint(vars[i] | LE(Strength::REQUIRED) | upper)
                    .map_err(|e| convert_kasuari_error(e, &format!("{} <= {}", decl.name, upper)))?;
            }
        }

        for constraint in &model.constraints {
            deadline.check()?;
            let expr = to_expression(&constraint.expr, &vars);
            let relation = match constraint.relation {
                Relation::Eq => EQ(Strength::REQUIRED),
                Relation::Ge => GE(Strength::REQUIRED),
                Relation::Le => LE(Strength::REQUIRED),
            };
            solver
                .add_constraint(expr | relation | constraint.rhs)
                .map_err(|e| convert_kasuari_error(e, &constraint.source))?;
        }

        for goal in &model.goals {
            deadline.check()?;
            let expr = to_expression(&goal.expr, &vars);
            solver
                .add_constraint(expr | EQ(goal.priority.strength()) | goal.target)
                .map_err(|e| convert_kasuari_error(e, "soft goal"))?;
        }

        // kasuari only reports variables whose value moved away from zero
        let index: HashMap<KasuariVariable, usize> =
            vars.iter().enumerate().map(|(i, v)| (*v, i)).collect();
        let mut values = vec![0.0; vars.len()];
        for (kvar, value) in solver.fetch_changes() {
            if let Some(&i) = index.get(kvar) {
                values[i] = *value;
            }
        }
        deadline.check()?;

        for (i, decl) in model.variables.iter().enumerate() {
            if decl.integer {
                values[i] = values[i].round();
            }
        }

        Ok(Solution { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_required_difference() {
        let mut model = OptimizationModel::new();
        let a = model.continuous("a");
        let b = model.continuous("b");
        model.require(LinearExpr::var(a), Relation::Eq, 50.0, "a fixed");
        model.require(LinearExpr::difference(b, a), Relation::Eq, 20.0, "b = a + 20");

        let solution = CassowaryEngine.solve(&model, Duration::from_secs(5)).unwrap();
        assert!((solution.get(a) - 50.0).abs() < EPS);
        assert!((solution.get(b) - 70.0).abs() < EPS);
    }

    #[test]
    fn test_soft_goal_respects_hard_bound() {
        let mut model = OptimizationModel::new();
        let w = model.continuous("w");
        model.require(LinearExpr::var(w), Relation::Ge, 50.0, "w >= 50");
        model.prefer(LinearExpr::var(w), 30.0, Priority::High);

        let solution = CassowaryEngine.solve(&model, Duration::from_secs(5)).unwrap();
        assert!((solution.get(w) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_higher_priority_wins() {
        let mut model = OptimizationModel::new();
        let x = model.continuous("x");
        model.prefer(LinearExpr::var(x), 10.0, Priority::Low);
        model.prefer(LinearExpr::var(x), 40.0, Priority::High);
        model.prefer(LinearExpr::var(x), 25.0, Priority::Medium);

        let solution = CassowaryEngine.solve(&model, Duration::from_secs(5)).unwrap();
        assert!((solution.get(x) - 40.0).abs() < EPS);
    }

    #[test]
    fn test_priority_weights_add_up() {
        let mut model = OptimizationModel::new();
        let x = model.continuous("x");
        model.prefer(LinearExpr::var(x), 10.0, Priority::Medium);
        for _ in 0..100 {
            model.prefer(LinearExpr::var(x), 0.0, Priority::Low);
        }
        let solution = CassowaryEngine.solve(&model, Duration::from_secs(5)).unwrap();
        assert!((solution.get(x) - 10.0).abs() < EPS);

        for _ in 0..1900 {
            model.prefer(LinearExpr::var(x), 0.0, Priority::Low);
        }
        let solution = CassowaryEngine.solve(&model, Duration::from_secs(5)).unwrap();
        assert!(solution.get(x).abs() < EPS);
    }

    #[test]
    fn test_midpoint_goal() {
        let mut model = OptimizationModel::new();
        let a = model.continuous("a");
        let b = model.continuous("b");
        let mid = model.continuous("mid");
        model.require(LinearExpr::var(a), Relation::Eq, 0.0, "a");
        model.require(LinearExpr::var(b), Relation::Eq, 100.0, "b");
        model.prefer(
            LinearExpr::new().plus(mid, 2.0).plus(a, -1.0).plus(b, -1.0),
            0.0,
            Priority::High,
        );

        let solution = CassowaryEngine.solve(&model, Duration::from_secs(5)).unwrap();
        assert!((solution.get(mid) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_integer_variables_are_rounded() {
        let mut model = OptimizationModel::new();
        let r = model.integer("r", 0.0, 10.0);
        model.require(LinearExpr::var(r), Relation::Ge, 2.0, "r >= 2");
        model.prefer(LinearExpr::var(r), 0.0, Priority::Low);

        let solution = CassowaryEngine.solve(&model, Duration::from_secs(5)).unwrap();
        assert_eq!(solution.get_int(r), 2);
        assert_eq!(solution.get(r).fract(), 0.0);
    }

    #[test]
    fn test_conflicting_constraints_error() {
        let mut model = OptimizationModel::new();
        let x = model.continuous("x");
        model.require(LinearExpr::var(x), Relation::Ge, 200.0, "x >= 200");
        model.require(LinearExpr::var(x), Relation::Le, 100.0, "x <= 100");

        match CassowaryEngine.solve(&model, Duration::from_secs(5)) {
            Err(SolverError::Unsatisfiable { origin, .. }) => assert_eq!(origin, "x <= 100"),
            other => panic!("expected Unsatisfiable error, got: {:?}", other),
        }
    }

    #[test]
    fn test_zero_budget_times_out() {
        let mut model = OptimizationModel::new();
        let x = model.continuous("x");
        model.require(LinearExpr::var(x), Relation::Ge, 1.0, "x >= 1");

        let result = CassowaryEngine.solve(&model, Duration::ZERO);
        assert!(matches!(result, Err(SolverError::Timeout { .. })));
    }

    #[test]
    fn test_evaluate_expression() {
        let expr = LinearExpr::difference(VarId(0), VarId(1)).offset(3.0);
        assert_eq!(expr.evaluate(&[10.0, 4.0]), 9.0);
    }
}
