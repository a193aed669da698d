pub mod engine;
pub mod extraction;
pub mod knowledge;
pub mod lexicon;
pub mod messages;
pub mod normalize;
pub mod remote; // External classifier speaking the same contract
pub mod scoring;
pub mod types;
pub mod urgency;


pub use engine::{FallbackDiagnoser, RuleBasedDiagnoser};
pub use knowledge::{AliasTable, KnowledgeBase, KnowledgeFile};
pub use lexicon::Lexicon;
pub use normalize::normalize;
pub use remote::RemoteDiagnoser;
pub use scoring::{ConfidenceFormula, ScoringPolicy};
pub use types::{
    Condition, DiagnosisError, DiagnosisResult, Diagnoser, KnowledgeError, ScoredCondition,
    Severity, Urgency,
};
pub use urgency::{UrgencyAssessment, UrgencyClassifier, UrgencyPolicy};
