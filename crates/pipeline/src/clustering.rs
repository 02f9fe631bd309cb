//! Narrative clustering: ask a model to group anomalies into named
//! narratives, then normalize its output into typed records.

use serde_json::Value;
use tracing::{debug, info};

use narradar_llm::{parse_llm_json, ModelCallResult, ModelChain};
use narradar_narrative::types::{
    slugify, Momentum, Narrative, RelatedEntities, SignalRefs, Stage,
};

use crate::error::PipelineError;
use crate::scoring::AnomalySummary;

/// System prompt for the clustering call. The user prompt carries the
/// condensed anomaly summary.
const CLUSTERING_SYSTEM_PROMPT: &str = "\
You are an ecosystem intelligence analyst. You receive a JSON summary of \
statistically anomalous entities across four signal layers: developer \
activity (dev), capital flows (defi), market data (market), and social \
chatter (social). Cluster correlated anomalies into named narratives.

Respond with ONLY a JSON object of this shape, no other text:
{
  \"narratives\": [
    {
      \"name\": \"short narrative name\",
      \"description\": \"one or two sentences\",
      \"stage\": \"EARLY|EMERGING|GROWING|MAINSTREAM\",
      \"momentum\": \"accelerating|stable|decelerating\",
      \"confidence\": 0-100,
      \"signalRefs\": {\"leading\": [], \"coincident\": [], \"confirming\": []},
      \"relatedEntities\": {\"repos\": [], \"tokens\": [], \"protocols\": []}
    }
  ]
}

Stage reflects how many independent layers corroborate the narrative: \
EARLY one layer, EMERGING two, GROWING three, MAINSTREAM all four. \
Confidence is the probability (0-100) the narrative persists into the \
next snapshot.";

/// Call the model chain over the anomaly summary and normalize the
/// answer into narrative records.
pub async fn cluster_narratives(
    chain: &ModelChain,
    summary: &AnomalySummary,
    model_override: Option<&str>,
) -> Result<(Vec<Narrative>, ModelCallResult), PipelineError> {
    let user_prompt = format!(
        "Anomaly summary for this run:\n{}\n\nCluster these into narratives.",
        summary.condense()
    );

    let result = chain
        .complete(CLUSTERING_SYSTEM_PROMPT, &user_prompt, model_override, true)
        .await?;
    info!(
        "clustering call served by {} ({} tokens, ${:.4})",
        result.model_used, result.tokens_total, result.cost_usd
    );

    let value = parse_llm_json(&result.content)
        .map_err(|e| PipelineError::MalformedResponse(e.to_string()))?;
    let narratives = normalize_narratives(&value)?;
    debug!("normalized {} narratives", narratives.len());

    Ok((narratives, result))
}

/// Validate and normalize the parsed clustering object: run-local ids,
/// deterministic slugs, clamped confidence, tolerant stage/momentum
/// labels. A missing `narratives` array or a nameless entry is
/// malformed output, not an empty result.
pub fn normalize_narratives(value: &Value) -> Result<Vec<Narrative>, PipelineError> {
    let entries = value
        .get("narratives")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            PipelineError::MalformedResponse("missing 'narratives' array".to_string())
        })?;

    let mut narratives = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                PipelineError::MalformedResponse(format!("narrative {i} has no name"))
            })?;

        let stage = entry
            .get("stage")
            .and_then(Value::as_str)
            .and_then(Stage::parse_loose)
            .unwrap_or(Stage::Early);
        let momentum = entry
            .get("momentum")
            .and_then(Value::as_str)
            .and_then(Momentum::parse_loose)
            .unwrap_or(Momentum::Stable);
        let confidence = entry
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(50.0)
            .clamp(0.0, 100.0);

        narratives.push(Narrative {
            id: format!("n-{}", i + 1),
            name: name.to_string(),
            slug: slugify(name),
            description: entry
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            stage,
            momentum,
            confidence,
            signal_refs: entry
                .get("signalRefs")
                .cloned()
                .and_then(|v| serde_json::from_value::<SignalRefs>(v).ok())
                .unwrap_or_default(),
            related_entities: entry
                .get("relatedEntities")
                .cloned()
                .and_then(|v| serde_json::from_value::<RelatedEntities>(v).ok())
                .unwrap_or_default(),
            previous_stage: None,
            stage_changed_at: None,
            is_new: None,
        });
    }

    Ok(narratives)
}
