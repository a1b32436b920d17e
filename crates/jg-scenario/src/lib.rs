//! JOI Lang scenario handling.
//!
//! Generator output is reduced to its last fenced code block, split into
//! scenarios, and each scenario body is checked against the device
//! vocabulary and the site's tag inventory. Near-miss identifiers are
//! corrected; scenarios that still reference something impossible are
//! dropped.

pub mod error;
pub mod extract;
pub mod lexer;
pub mod parser;
pub mod validate;

pub use error::{ScenarioError, ScenarioResult};
pub use extract::extract_last_fenced_block;
pub use parser::{GrammarVariant, parse_scenarios, render_scenarios};
pub use validate::{
    Correction, CorrectionKind, JaroWinklerScorer, Rejection, SimilarityScorer, Validated, Validator,
    ValidatorConfig,
};
