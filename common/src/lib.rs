//! FRI verdict engine
//!
//! Validates an extracted Final Random Inspection report against the
//! SIPLEC business rules and compares the outcome with the laboratory's
//! own decision.

pub mod analysis;
pub mod aql;
pub mod decision;
pub mod engine;
pub mod error;
pub mod parser;
pub mod remarks;
pub mod rules;
pub mod sheet;
pub mod steps;
pub mod types;
pub mod verdict;

#[cfg(any(test, feature = "fixtures"))]
pub mod testing;

pub use analysis::{AnalysisResult, Severity, StepId, StepResult, ValidationIssue};
pub use aql::{AqlLookup, AqlPlan, AqlTable, LookupError};
pub use engine::{evaluate, Evaluation};
pub use error::{Error, Result};
pub use parser::{extract_json, parse_extraction_response, parse_extractions};
pub use remarks::{RemarkCatalog, RemarkOverride, RemarkRule};
pub use sheet::Sheet;
pub use types::{AqlLevel, FriExtraction, InspectionResult};
pub use verdict::{Verdict, VerdictType};
