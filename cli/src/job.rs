//! Job files: declarations, an equation and measurement data in one JSON document.

use minmax_core::{DataColumns, MinMaxError, MinMaxWorkspace, UncertaintyRow, WorkspaceConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid job file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Variable '{0}' needs both test_value and test_uncertainty")]
    PartialTestPoint(String),
    #[error(transparent)]
    MinMax(#[from] MinMaxError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default)]
    pub angle_like: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_uncertainty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantSpec {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub config: WorkspaceConfig,
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub constants: Vec<ConstantSpec>,
    pub equation: String,
    #[serde(default)]
    pub data: DataColumns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
}

/// Derived equations and, when evaluated, the data rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub equation: String,
    pub min: String,
    pub max: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<UncertaintyRow>>,
}

impl Job {
    pub fn load(path: &Path) -> Result<Self, JobError> {
        let text = std::fs::read_to_string(path).map_err(|source| JobError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Declare everything, parse the equation and derive its bounds
    pub fn build_workspace(&self) -> Result<MinMaxWorkspace, JobError> {
        let mut space = MinMaxWorkspace::with_config(self.config.clone());

        for var in &self.variables {
            match (var.test_value, var.test_uncertainty) {
                (Some(value), Some(uncertainty)) => {
                    space.declare_variable_with_test_values(&var.name, value, uncertainty)?;
                }
                (None, None) => {
                    space.declare_variable(&var.name, var.angle_like)?;
                }
                _ => return Err(JobError::PartialTestPoint(var.name.clone())),
            }
            if var.value.is_some() || var.uncertainty.is_some() {
                space.assign_measurement(&var.name, var.value, var.uncertainty)?;
            }
        }
        for constant in &self.constants {
            space.declare_constant(&constant.name, constant.value)?;
        }

        let equation = space.parse_equation(&self.equation)?;
        space.save_equation(equation)?;
        info!(
            "Job ready: {} variables, {} constants",
            space.present_variables().len(),
            space.present_constants().len()
        );
        Ok(space)
    }

    pub fn derive(&self) -> Result<JobReport, JobError> {
        let space = self.build_workspace()?;
        report(&space, None)
    }

    /// Derive, then evaluate every data row. `places` wins over the job's own setting.
    pub fn evaluate(&self, places: Option<u32>) -> Result<JobReport, JobError> {
        let space = self.build_workspace()?;
        let places = places
            .or(self.decimal_places)
            .unwrap_or(self.config.decimal_places);
        let rows = space.calc_uncertainties(&self.data, places)?;
        report(&space, Some(rows))
    }
}

fn report(space: &MinMaxWorkspace, rows: Option<Vec<UncertaintyRow>>) -> Result<JobReport, JobError> {
    let (Some(equation), Some(min), Some(max)) =
        (space.equation(), space.min_equation(), space.max_equation())
    else {
        return Err(MinMaxError::IncompleteEquations.into());
    };
    Ok(JobReport {
        equation: equation.to_string(),
        min: min.to_string(),
        max: max.to_string(),
        rows,
    })
}
