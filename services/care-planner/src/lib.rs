//! # Care Planner Service
//!
//! Reads digitally generated diagnostic reports and produces a treatment,
//! cost and appointment plan.
//!
//! ## Pipeline
//!
//! 1. [`pdf_processor`] pulls the embedded text layer out of the upload
//! 2. [`fields`] and [`hospital`] pattern-match patient, clinical and hospital fields
//! 3. the shared knowledge store keeps each report and returns those with overlapping terms
//! 4. [`planner`] combines [`rules`] tables with optional text generation
//! 5. [`pdf_builder`] renders the plan for download

pub mod app;
pub mod fields;
pub mod handlers;
pub mod hospital;
pub mod llm_client;
pub mod metrics;
pub mod middleware;
pub mod pdf_builder;
pub mod pdf_processor;
pub mod pipeline;
pub mod planner;
pub mod prompts;
pub mod routes;
pub mod rules;

pub use app::{build_router, create_app, AppState};
pub use fields::{FieldExtractor, ReportField};
pub use hospital::{HospitalDetector, HospitalRegistry};
pub use llm_client::{ChatCompletionClient, DisabledGenerator, GenerationOutcome, TextGenerator};
pub use metrics::Metrics;
pub use pdf_builder::{layout_plan, render_plan_pdf};
pub use pdf_processor::{PdfContent, PdfProcessor};
pub use pipeline::{AnalysisOutcome, PipelineSettings, ReportPipeline};
pub use planner::{CarePlanner, PlanRequest};
pub use prompts::PromptTemplates;
pub use rules::{ClinicalRules, RuleTable};
