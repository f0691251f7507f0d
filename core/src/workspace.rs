//! The workspace: registry, equation store and the host-driver surface.

use crate::config::WorkspaceConfig;
use crate::derivation::{derive_min_max, MinMaxPair};
use crate::error::{MinMaxError, MinMaxResult};
use crate::expr::{parse_expression_with, simplify, Expr};
use crate::registry::{Constant, Registry, TestValueSource, Variable};
use crate::uncertainty::{evaluate_rows, DataColumns, UncertaintyRow};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Base equation and its derived bounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquationStore {
    equation: Option<Expr>,
    bounds: Option<MinMaxPair>,
}

impl EquationStore {
    pub fn equation(&self) -> Option<&Expr> {
        self.equation.as_ref()
    }

    pub fn bounds(&self) -> Option<&MinMaxPair> {
        self.bounds.as_ref()
    }

    pub fn min_equation(&self) -> Option<&Expr> {
        self.bounds.as_ref().map(|b| &b.min)
    }

    pub fn max_equation(&self) -> Option<&Expr> {
        self.bounds.as_ref().map(|b| &b.max)
    }

    pub fn has_complete_equations(&self) -> bool {
        self.equation.is_some() && self.bounds.is_some()
    }
}

/// A single min/max uncertainty computation.
///
/// Not meant for shared use; every mutating call takes `&mut self`.
#[derive(Debug)]
pub struct MinMaxWorkspace {
    config: WorkspaceConfig,
    registry: Registry,
    store: EquationStore,
}

impl Default for MinMaxWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxWorkspace {
    pub fn new() -> Self {
        Self::with_config(WorkspaceConfig::default())
    }

    /// Workspace sampling test values from a generator seeded with `config.seed`
    pub fn with_config(config: WorkspaceConfig) -> Self {
        let registry = Registry::seeded(config.sampling, config.seed);
        Self {
            config,
            registry,
            store: EquationStore::default(),
        }
    }

    /// Workspace drawing test values from `sampler`
    pub fn with_sampler(config: WorkspaceConfig, sampler: impl TestValueSource + 'static) -> Self {
        let registry = Registry::new(config.sampling, Box::new(sampler));
        Self {
            config,
            registry,
            store: EquationStore::default(),
        }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &EquationStore {
        &self.store
    }

    pub fn add_var(&mut self, name: &str) -> MinMaxResult<Expr> {
        self.registry.declare_variable(name, false)
    }

    /// Declare a variable; angle-like variables sample from the narrow range
    pub fn declare_variable(&mut self, name: &str, angle_like: bool) -> MinMaxResult<Expr> {
        self.registry.declare_variable(name, angle_like)
    }

    pub fn declare_variable_with_test_values(
        &mut self,
        name: &str,
        test_value: f64,
        test_uncertainty: f64,
    ) -> MinMaxResult<Expr> {
        self.registry
            .declare_variable_with_test_values(name, test_value, test_uncertainty)
    }

    pub fn declare_constant(&mut self, name: &str, value: f64) -> MinMaxResult<Expr> {
        self.registry.declare_constant(name, value)
    }

    pub fn assign_measurement(
        &mut self,
        name: &str,
        value: Option<f64>,
        uncertainty: Option<f64>,
    ) -> MinMaxResult<()> {
        self.registry.assign_measurement(name, value, uncertainty)
    }

    /// Parse equation text, resolving identifiers against the registry.
    /// Declared names win over the built-in `pi` and `e`.
    pub fn parse_equation(&self, text: &str) -> MinMaxResult<Expr> {
        let parsed = parse_expression_with(text, &|name| self.registry.get(name).is_some())?;

        let mut unknown = None;
        let resolved = parsed.map_symbols(&mut |name: &str| {
            match self.registry.get(name) {
                Some(entry) => Some(Expr::symbol(entry.name())),
                None => {
                    unknown.get_or_insert_with(|| name.to_string());
                    None
                }
            }
        });

        match unknown {
            Some(name) => Err(MinMaxError::UnknownSymbol(name)),
            None => Ok(resolved),
        }
    }

    pub fn equation(&self) -> Option<&Expr> {
        self.store.equation()
    }

    pub fn min_equation(&self) -> Option<&Expr> {
        self.store.min_equation()
    }

    pub fn max_equation(&self) -> Option<&Expr> {
        self.store.max_equation()
    }

    pub fn has_complete_equations(&self) -> bool {
        self.store.has_complete_equations()
    }

    /// Variables occurring in the saved equation
    pub fn present_variables(&self) -> Vec<&Variable> {
        match &self.store.equation {
            Some(eq) => self.registry.present_variables(eq),
            None => Vec::new(),
        }
    }

    /// Constants occurring in the saved equation
    pub fn present_constants(&self) -> Vec<&Constant> {
        match &self.store.equation {
            Some(eq) => self.registry.present_constants(eq),
            None => Vec::new(),
        }
    }

    /// Save the equation using the configured simplify setting
    pub fn save_equation(&mut self, expr: Expr) -> MinMaxResult<()> {
        let simplify = self.config.simplify;
        self.set_equation(expr, simplify)
    }

    /// Store `expr` as the base equation and derive its min/max pair.
    ///
    /// On failure the equation stays stored and the bounds are cleared.
    pub fn set_equation(&mut self, expr: Expr, simplify_equation: bool) -> MinMaxResult<()> {
        let equation = if simplify_equation { simplify(&expr) } else { expr };

        let derived = derive_min_max(
            &equation,
            &self.registry.present_variables(&equation),
            &self.registry.present_constants(&equation),
        );

        self.store.equation = Some(equation);
        match derived {
            Ok(pair) => {
                self.store.bounds = Some(pair);
                Ok(())
            }
            Err(e) => {
                warn!("Could not derive min/max equations: {}", e);
                self.store.bounds = None;
                Err(e)
            }
        }
    }

    /// Evaluate the bounds for every data row.
    ///
    /// Present variables missing from `data` fall back to their assigned
    /// measurement and uncertainty, when set.
    pub fn calc_uncertainties(
        &self,
        data: &DataColumns,
        decimal_places: u32,
    ) -> MinMaxResult<Vec<UncertaintyRow>> {
        let bounds = self.store.bounds().ok_or(MinMaxError::IncompleteEquations)?;

        let mut columns = data.clone();
        for var in self.present_variables() {
            for (name, assigned) in [
                (&var.name, var.value),
                (&var.uncertainty_name, var.uncertainty_value),
            ] {
                match assigned {
                    Some(value) if !columns.contains(name) => columns.insert(name.clone(), value),
                    _ => {}
                }
            }
        }

        evaluate_rows(bounds, &self.present_constants(), &columns, decimal_places)
    }
}
