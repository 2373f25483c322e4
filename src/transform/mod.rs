//! Report transformation.
//!
//! - `common`: steps shared by both report variants
//! - `camp` / `afterschool`: variant-specific steps and their configuration
//! - `runner`: the [`Transform`] step enum and ordered application
//! - `pipeline`: the end-to-end CSV-to-report entry points

pub mod afterschool;
pub mod camp;
pub mod common;
pub mod pipeline;
pub mod runner;

pub use afterschool::AfterschoolOptions;
pub use camp::{AgeSpec, CampSeason, CohortDescriptor, CohortGender};
pub use pipeline::{
    transform_bytes, transform_csv, transform_parsed, CsvInfo, PipelineOptions, PipelineRun,
    ReportVariant,
};
pub use runner::{afterschool_pipeline, apply_transforms, camp_pipeline, Transform};
