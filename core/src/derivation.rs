//! Min/max derivation.
//!
//! Every present variable can be pushed up or down by its uncertainty. The
//! engine builds all sign assignments as candidate expressions, scores each
//! one at the registry's test point and keeps the lowest and highest.
//!
//! The chosen sign pattern is only guaranteed extremal at that test point.
//! Inputs whose partial derivatives change sign across the evaluated range
//! (a variable crossing zero, a non-monotonic function) can invert the pair.

use crate::error::{MinMaxError, MinMaxResult};
use crate::expr::{evaluate, Bindings, Expr};
use crate::registry::{Constant, Variable};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Derived bound expressions, always produced together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxPair {
    pub min: Expr,
    pub max: Expr,
}

/// A fully perturbed candidate and its value at the test point
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub expr: Expr,
    /// `None` when the candidate has no finite real value at the test point
    pub score: Option<f64>,
}

fn is_perturbed(expr: &Expr, var: &Variable) -> bool {
    expr.contains(&var.plus_term()) || expr.contains(&var.minus_term())
}

/// Expand `equation` over every perturbation of `variables`.
///
/// Worklist over the binary tree of sign choices. The seen-set keeps
/// generation order and makes each distinct candidate expand exactly once,
/// so the loop ends at the fixed point. Intermediate (partially perturbed)
/// candidates are included.
pub fn expand_candidates(equation: &Expr, variables: &[&Variable]) -> IndexSet<Expr> {
    let mut seen = IndexSet::new();
    let mut queue = VecDeque::new();
    seen.insert(equation.clone());
    queue.push_back(equation.clone());

    while let Some(expr) = queue.pop_front() {
        for var in variables {
            if is_perturbed(&expr, var) {
                continue;
            }
            for term in [var.plus_term(), var.minus_term()] {
                let child = expr.subs(&var.name, &term);
                if seen.insert(child.clone()) {
                    queue.push_back(child);
                }
            }
        }
    }

    seen
}

/// Candidates in which every variable is perturbed and every constant remains
pub fn complete_candidates(
    equation: &Expr,
    variables: &[&Variable],
    constants: &[&Constant],
) -> Vec<Expr> {
    let expected = 2 * variables.len() + constants.len();
    let candidates = expand_candidates(equation, variables);
    let total = candidates.len();

    let complete: Vec<Expr> = candidates
        .into_iter()
        .filter(|expr| expr.free_symbols().len() == expected)
        .collect();
    debug!(
        "Expanded {} candidates, {} fully perturbed",
        total,
        complete.len()
    );
    complete
}

/// Bindings for the test point: test values, test uncertainties, constant values
pub fn test_point(variables: &[&Variable], constants: &[&Constant]) -> Bindings {
    let mut bindings = Bindings::new();
    for var in variables {
        bindings.insert(var.name.clone(), var.test_value);
        bindings.insert(var.uncertainty_name.clone(), var.test_uncertainty);
    }
    for constant in constants {
        bindings.insert(constant.name.clone(), constant.value);
    }
    bindings
}

pub fn score_candidates(candidates: Vec<Expr>, bindings: &Bindings) -> Vec<ScoredCandidate> {
    candidates
        .into_iter()
        .map(|expr| {
            let score = match evaluate(&expr, bindings) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Skipping candidate {}: {}", expr, e);
                    None
                }
            };
            ScoredCandidate { expr, score }
        })
        .collect()
}

/// Lowest and highest scored candidates; the first one wins on ties
fn select_extremes(scored: &[ScoredCandidate]) -> Option<(usize, usize)> {
    let mut lowest: Option<(usize, f64)> = None;
    let mut highest: Option<(usize, f64)> = None;

    for (index, candidate) in scored.iter().enumerate() {
        let Some(score) = candidate.score else {
            continue;
        };
        if lowest.map_or(true, |(_, best)| score < best) {
            lowest = Some((index, score));
        }
        if highest.map_or(true, |(_, best)| score > best) {
            highest = Some((index, score));
        }
    }

    Some((lowest?.0, highest?.0))
}

/// Derive the min and max expressions for `equation`
pub fn derive_min_max(
    equation: &Expr,
    variables: &[&Variable],
    constants: &[&Constant],
) -> MinMaxResult<MinMaxPair> {
    if variables.is_empty() {
        return Err(MinMaxError::Derivation("no variables".to_string()));
    }

    let candidates = complete_candidates(equation, variables, constants);
    if candidates.is_empty() {
        return Err(MinMaxError::Derivation(
            "no fully perturbed candidate expressions".to_string(),
        ));
    }

    let bindings = test_point(variables, constants);
    let scored = score_candidates(candidates, &bindings);
    let (imin, imax) = select_extremes(&scored).ok_or_else(|| {
        MinMaxError::Derivation("no candidate evaluates to a real number at the test point".to_string())
    })?;

    let pair = MinMaxPair {
        min: scored[imin].expr.clone(),
        max: scored[imax].expr.clone(),
    };
    info!(
        "Derived bounds from {} candidates: min = {}, max = {}",
        scored.len(),
        pair.min,
        pair.max
    );
    Ok(pair)
}

#[cfg(test)]
mod derivation_tests {
    use super::*;
    use crate::expr::parse_expression;

    fn var(name: &str, test_value: f64, test_uncertainty: f64) -> Variable {
        Variable {
            name: name.to_string(),
            uncertainty_name: format!("d{}", name),
            value: None,
            uncertainty_value: None,
            test_value,
            test_uncertainty,
            angle_like: false,
        }
    }

    fn perturbed(equation: &Expr, signs: &[(&Variable, bool)]) -> Expr {
        signs.iter().fold(equation.clone(), |expr, (v, up)| {
            let term = if *up { v.plus_term() } else { v.minus_term() };
            expr.subs(&v.name, &term)
        })
    }

    #[test]
    fn test_expansion_reaches_every_sign_pattern() {
        let x = var("X", 2.0, 0.1);
        let y = var("Y", 3.0, 0.1);
        let z = var("Z", 4.0, 0.1);
        let equation = parse_expression("X * Y + Z").unwrap();

        let all = expand_candidates(&equation, &[&x, &y, &z]);
        // 3^n distinct nodes: each variable untouched, plus or minus
        assert_eq!(all.len(), 27);

        let complete = complete_candidates(&equation, &[&x, &y, &z], &[]);
        assert_eq!(complete.len(), 8);
        assert!(complete.iter().all(|e| e.free_symbols().len() == 6));
    }

    #[test]
    fn test_symmetric_equation_has_no_duplicates() {
        let a = var("A", 5.0, 0.5);
        let b = var("B", 5.0, 0.5);
        let equation = parse_expression("A + B").unwrap();

        let complete = complete_candidates(&equation, &[&a, &b], &[]);
        let unique: std::collections::HashSet<_> = complete.iter().cloned().collect();
        assert_eq!(complete.len(), 4);
        assert_eq!(unique.len(), complete.len());
    }

    #[test]
    fn test_count_bound() {
        let names = ["A", "B", "C", "D", "E"];
        let vars: Vec<Variable> = names.iter().map(|n| var(n, 10.0, 0.2)).collect();
        let refs: Vec<&Variable> = vars.iter().collect();
        let equation = parse_expression("A * B / (C - D) + sqrt(E)").unwrap();

        let complete = complete_candidates(&equation, &refs, &[]);
        assert!(complete.len() <= 1 << names.len());
    }

    #[test]
    fn test_constants_must_remain() {
        let x = var("X", 2.0, 0.1);
        let g = Constant {
            name: "G".to_string(),
            value: 9.81,
        };
        let equation = parse_expression("G * X").unwrap();

        let complete = complete_candidates(&equation, &[&x], &[&g]);
        assert_eq!(complete.len(), 2);
        assert!(complete.iter().all(|e| e.has_symbol("G")));
    }

    #[test]
    fn test_pendulum_signs() {
        let m = var("M", 40.0, 0.5);
        let t = var("T", 20.0, 0.5);
        let equation = parse_expression("4*pi^2*M/T^2").unwrap();

        let pair = derive_min_max(&equation, &[&m, &t], &[]).unwrap();
        assert_eq!(pair.min, perturbed(&equation, &[(&m, false), (&t, true)]));
        assert_eq!(pair.max, perturbed(&equation, &[(&m, true), (&t, false)]));
    }

    #[test]
    fn test_decreasing_term_flips_sign() {
        let x = var("X", 10.0, 1.0);
        let y = var("Y", 3.0, 1.0);
        let equation = parse_expression("X - Y").unwrap();

        let pair = derive_min_max(&equation, &[&x, &y], &[]).unwrap();
        assert_eq!(pair.min, parse_expression("(X - dX) - (Y + dY)").unwrap());
        assert_eq!(pair.max, parse_expression("(X + dX) - (Y - dY)").unwrap());
    }

    #[test]
    fn test_unscorable_candidates_are_skipped() {
        // at the test point sqrt(X - dX) is out of domain
        let x = var("X", 0.5, 1.0);
        let equation = parse_expression("sqrt(X)").unwrap();

        let pair = derive_min_max(&equation, &[&x], &[]).unwrap();
        assert_eq!(pair.min, pair.max);
        assert_eq!(pair.max, parse_expression("sqrt(X + dX)").unwrap());
    }

    #[test]
    fn test_no_variables_error() {
        let equation = parse_expression("2 * pi").unwrap();
        let result = derive_min_max(&equation, &[], &[]);
        assert_eq!(result, Err(MinMaxError::Derivation("no variables".to_string())));
    }

    #[test]
    fn test_nothing_scorable_error() {
        let x = var("X", -5.0, 1.0);
        let equation = parse_expression("ln(X)").unwrap();
        assert!(matches!(
            derive_min_max(&equation, &[&x], &[]),
            Err(MinMaxError::Derivation(_))
        ));
    }

    #[test]
    fn test_ties_pick_first_candidate() {
        let scored = vec![
            ScoredCandidate { expr: Expr::symbol("a"), score: Some(1.0) },
            ScoredCandidate { expr: Expr::symbol("b"), score: None },
            ScoredCandidate { expr: Expr::symbol("c"), score: Some(1.0) },
        ];
        assert_eq!(select_extremes(&scored), Some((0, 0)));
    }
}
