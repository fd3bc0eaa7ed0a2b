//! Sub-answer ingestion
//!
//! Collects the documents cited by previously answered sub-questions into a
//! single deduplicated list for the next step of an answer pipeline.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A retrieved document section backing an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSection {
    /// Identity of the source document
    pub document_id: String,
    /// Section text
    #[serde(default)]
    pub content: String,
    /// Source link, if any
    #[serde(default)]
    pub link: Option<String>,
}

/// Result of answering one sub-question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAnswerResult {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub documents: Vec<InferenceSection>,
}

/// Output of the sub-question answering step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerQuestionOutput {
    #[serde(default)]
    pub answer_results: Vec<SubAnswerResult>,
}

/// State update produced by ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecompAnswersUpdate {
    /// Union of all cited documents, first occurrence wins
    pub documents: Vec<InferenceSection>,
    /// The sub-answer results, unchanged
    pub decomp_answer_results: Vec<SubAnswerResult>,
}

/// Merge the documents of every sub-answer, dropping repeated document ids
pub fn ingest_sub_answers(state: &AnswerQuestionOutput) -> DecompAnswersUpdate {
    let started = Utc::now();
    debug!(%started, "Ingesting sub-question answers");

    let mut seen = HashSet::new();
    let documents: Vec<InferenceSection> = state
        .answer_results
        .iter()
        .flat_map(|result| result.documents.iter())
        .filter(|section| seen.insert(section.document_id.as_str()))
        .cloned()
        .collect();

    let finished = Utc::now();
    debug!(
        %finished,
        elapsed_ms = (finished - started).num_milliseconds(),
        documents = documents.len(),
        "Ingested sub-question answers"
    );

    DecompAnswersUpdate {
        documents,
        decomp_answer_results: state.answer_results.clone(),
    }
}
