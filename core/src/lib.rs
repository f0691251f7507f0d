pub mod config;
pub mod derivation;
pub mod error;
pub mod expr;
pub mod registry;
pub mod uncertainty;
pub mod workspace;

pub use config::{SampleRange, SamplingConfig, WorkspaceConfig};
pub use derivation::{derive_min_max, MinMaxPair};
pub use error::{MinMaxError, MinMaxResult};
pub use expr::{parse_expression, Expr};
pub use registry::{Constant, Entry, Registry, SeededSampler, TestValueSource, Variable};
pub use uncertainty::{Column, DataColumns, UncertaintyRow};
pub use workspace::{EquationStore, MinMaxWorkspace};

pub fn version() -> &'static str {
    "0.1.0"
}
