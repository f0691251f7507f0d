//! Symbol registry: declared variables and constants.

use crate::config::{SampleRange, SamplingConfig};
use crate::error::{MinMaxError, MinMaxResult};
use crate::expr::Expr;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of derivation test values.
///
/// Any `FnMut(SampleRange) -> f64` closure is a source, which lets tests
/// pin the test point.
pub trait TestValueSource {
    fn sample(&mut self, range: SampleRange) -> f64;
}

impl<F> TestValueSource for F
where
    F: FnMut(SampleRange) -> f64,
{
    fn sample(&mut self, range: SampleRange) -> f64 {
        self(range)
    }
}

/// Uniform sampler over a seeded `StdRng`
#[derive(Debug, Clone)]
pub struct SeededSampler {
    rng: StdRng,
}

impl SeededSampler {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl TestValueSource for SeededSampler {
    fn sample(&mut self, range: SampleRange) -> f64 {
        if range.high <= range.low {
            return range.low;
        }
        self.rng.gen_range(range.low..=range.high)
    }
}

/// A measured quantity with a paired uncertainty symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Normalized (upper-case) name, also the symbol name
    pub name: String,
    /// Name of the uncertainty symbol (`d` + name)
    pub uncertainty_name: String,
    /// Measured value, if assigned
    pub value: Option<f64>,
    /// Measured uncertainty, if assigned
    pub uncertainty_value: Option<f64>,
    /// Stand-in value used to rank candidates during derivation
    pub test_value: f64,
    /// Stand-in uncertainty used to rank candidates during derivation
    pub test_uncertainty: f64,
    pub angle_like: bool,
}

impl Variable {
    pub fn symbol(&self) -> Expr {
        Expr::symbol(self.name.clone())
    }

    pub fn uncertainty_symbol(&self) -> Expr {
        Expr::symbol(self.uncertainty_name.clone())
    }

    /// `symbol + uncertainty`
    pub fn plus_term(&self) -> Expr {
        self.symbol() + self.uncertainty_symbol()
    }

    /// `symbol - uncertainty`
    pub fn minus_term(&self) -> Expr {
        self.symbol() - self.uncertainty_symbol()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: f64,
}

impl Constant {
    pub fn symbol(&self) -> Expr {
        Expr::symbol(self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Variable(Variable),
    Constant(Constant),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Self::Variable(v) => &v.name,
            Self::Constant(c) => &c.name,
        }
    }

    /// Every symbol name this entry occupies
    fn symbol_names(&self) -> Vec<&str> {
        match self {
            Self::Variable(v) => vec![v.name.as_str(), v.uncertainty_name.as_str()],
            Self::Constant(c) => vec![c.name.as_str()],
        }
    }
}

/// Canonical registry name: upper case, identifier characters only
pub fn normalize_name(name: &str) -> MinMaxResult<String> {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(MinMaxError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_uppercase())
}

/// Declared variables and constants, in declaration order
pub struct Registry {
    entries: IndexMap<String, Entry>,
    sampling: SamplingConfig,
    sampler: Box<dyn TestValueSource>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries)
            .field("sampling", &self.sampling)
            .finish_non_exhaustive()
    }
}

impl Registry {
    pub fn new(sampling: SamplingConfig, sampler: Box<dyn TestValueSource>) -> Self {
        Self {
            entries: IndexMap::new(),
            sampling,
            sampler,
        }
    }

    /// Registry backed by a [`SeededSampler`]
    pub fn seeded(sampling: SamplingConfig, seed: u64) -> Self {
        Self::new(sampling, Box::new(SeededSampler::from_seed(seed)))
    }

    fn is_taken(&self, symbol: &str) -> bool {
        self.entries
            .values()
            .any(|entry| entry.symbol_names().contains(&symbol))
    }

    fn ensure_free(&self, names: &[&str]) -> MinMaxResult<()> {
        match names.iter().find(|name| self.is_taken(name)) {
            Some(name) => Err(MinMaxError::DuplicateName(name.to_string())),
            None => Ok(()),
        }
    }

    /// Declare a variable, sampling its test point from the configured ranges.
    /// Returns the primary symbol.
    pub fn declare_variable(&mut self, name: &str, angle_like: bool) -> MinMaxResult<Expr> {
        let name = normalize_name(name)?;
        let uncertainty_name = format!("d{}", name);
        self.ensure_free(&[name.as_str(), uncertainty_name.as_str()])?;

        let (value_range, uncertainty_range) = self.sampling.ranges(angle_like);
        let test_value = self.sampler.sample(value_range);
        let test_uncertainty = self.sampler.sample(uncertainty_range);
        debug!(
            "Sampled test point for {}: {} ± {}",
            name, test_value, test_uncertainty
        );

        self.insert_variable(Variable {
            name,
            uncertainty_name,
            value: None,
            uncertainty_value: None,
            test_value,
            test_uncertainty,
            angle_like,
        })
    }

    /// Declare a variable with an explicit test point
    pub fn declare_variable_with_test_values(
        &mut self,
        name: &str,
        test_value: f64,
        test_uncertainty: f64,
    ) -> MinMaxResult<Expr> {
        let name = normalize_name(name)?;
        let uncertainty_name = format!("d{}", name);
        self.ensure_free(&[name.as_str(), uncertainty_name.as_str()])?;

        self.insert_variable(Variable {
            name,
            uncertainty_name,
            value: None,
            uncertainty_value: None,
            test_value,
            test_uncertainty,
            angle_like: false,
        })
    }

    fn insert_variable(&mut self, variable: Variable) -> MinMaxResult<Expr> {
        let symbol = variable.symbol();
        self.entries
            .insert(variable.name.clone(), Entry::Variable(variable));
        Ok(symbol)
    }

    pub fn declare_constant(&mut self, name: &str, value: f64) -> MinMaxResult<Expr> {
        let name = normalize_name(name)?;
        self.ensure_free(&[name.as_str()])?;

        let constant = Constant { name, value };
        let symbol = constant.symbol();
        self.entries
            .insert(constant.name.clone(), Entry::Constant(constant));
        Ok(symbol)
    }

    /// Record a measured value and uncertainty for a declared variable
    pub fn assign_measurement(
        &mut self,
        name: &str,
        value: Option<f64>,
        uncertainty: Option<f64>,
    ) -> MinMaxResult<()> {
        let key = normalize_name(name)?;
        match self.entries.get_mut(&key) {
            Some(Entry::Variable(var)) => {
                var.value = value;
                var.uncertainty_value = uncertainty;
                Ok(())
            }
            _ => Err(MinMaxError::UnknownSymbol(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        let key = normalize_name(name).ok()?;
        self.entries.get(&key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.entries.values().filter_map(|entry| match entry {
            Entry::Variable(v) => Some(v),
            Entry::Constant(_) => None,
        })
    }

    pub fn constants(&self) -> impl Iterator<Item = &Constant> {
        self.entries.values().filter_map(|entry| match entry {
            Entry::Constant(c) => Some(c),
            Entry::Variable(_) => None,
        })
    }

    /// Variables whose primary symbol occurs in `equation`
    pub fn present_variables(&self, equation: &Expr) -> Vec<&Variable> {
        self.variables()
            .filter(|v| equation.has_symbol(&v.name))
            .collect()
    }

    /// Constants whose symbol occurs in `equation`
    pub fn present_constants(&self, equation: &Expr) -> Vec<&Constant> {
        self.constants()
            .filter(|c| equation.has_symbol(&c.name))
            .collect()
    }
}
