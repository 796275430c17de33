//! Per-query metric evaluators

pub mod citation;
pub mod hallucination;
pub mod retrieval;
pub mod synthesis;
pub mod text;

pub use citation::citation_accuracy;
pub use hallucination::{detect_hallucinations, HallucinationCheck};
pub use retrieval::{evaluate_retrieval, GradedRelevance, RetrievalEvalConfig};
pub use synthesis::evaluate_synthesis;
