//! FIXO: household repair diagnosis.
//!
//! Given a photo or a description of a household defect, produce a
//! diagnosis with repair steps and safety warnings. The [`analyzer`] picks
//! one provider at startup (OpenAI vision, Google Vision, or a catalog-driven
//! simulation) and always answers in the same [`analyzer::AnalysisResult`]
//! shape.

pub mod analyzer;
pub mod catalog;
pub mod cli;
pub mod config;
