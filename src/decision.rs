//! Decision engine.
//!
//! Two-stage decision procedure over untrusted LLM output. Stage A asks
//! whether the task needs skill capabilities at all; stage B selects the
//! skill(s) and execution mode. Both stages parse structured JSON out of
//! free-text responses (tolerating markdown code fences) and recover from
//! every parse failure locally: stage A fails open toward using skills, and
//! stage B falls back to the deterministic relevance scorer. No failure in
//! this module ever reaches the caller as an error.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::OrchestrationError;
use crate::llm::CompletionClient;
use crate::prompts;
use crate::scorer;
use crate::skill::{summarize_all, Skill};

// ---------------------------------------------------------------------------
// Decision types
// ---------------------------------------------------------------------------

/// How the selected skills should be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Steps run strictly in order, each building on the previous outputs.
    Sequential,
    /// Steps run independently; a synthesis step merges their outputs.
    Parallel,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Sequential
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// Validated output of the selection stage.
///
/// Every index in `selected` is guaranteed to be a valid index into the
/// skill snapshot the decision was made against, and `selected` is never
/// empty.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationDecision {
    /// Selected skill indices, in execution order, deduplicated.
    pub selected: Vec<usize>,
    /// Execution mode for multi-skill selections.
    pub mode: ExecutionMode,
    /// Which step depends on which (diagnostic only; not used for control
    /// flow).
    pub dependencies: HashMap<usize, Vec<usize>>,
    /// Execution order as reported by the model (diagnostic only).
    pub execution_order: Vec<usize>,
    /// Free-text selection rationale (diagnostic only).
    pub reasoning: String,
    /// Free-text flow description (diagnostic only).
    pub execution_flow: String,
}

/// Outcome of the full decision procedure.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The task is answerable from general knowledge; no skill runs.
    NoSkillsNeeded {
        /// Why no skills are needed (diagnostic).
        reasoning: String,
    },
    /// One or more skills should execute.
    UseSkills(OrchestrationDecision),
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NecessityRaw {
    needs_skills: bool,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct SelectionRaw {
    #[serde(default)]
    selected_skill_indices: Vec<i64>,
    #[serde(default)]
    execution_order: Vec<i64>,
    #[serde(default)]
    execution_mode: String,
    #[serde(default)]
    dependencies: HashMap<String, Vec<i64>>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    execution_flow: String,
}

// ---------------------------------------------------------------------------
// JSON extraction
// ---------------------------------------------------------------------------

/// Extract the JSON payload from a free-text LLM response.
///
/// Strips ```` ```json ```` / ``` ``` ``` fences and tolerates stray prose
/// around the object by slicing from the first `{` to the last `}`.
pub fn extract_json_payload(text: &str) -> &str {
    let trimmed = text.trim();

    let inner = if let Some(idx) = trimmed.find("```json") {
        let rest = &trimmed[idx + 7..];
        match rest.find("```") {
            Some(end) => &rest[..end],
            None => rest,
        }
    } else if let Some(idx) = trimmed.find("```") {
        let rest = &trimmed[idx + 3..];
        match rest.find("```") {
            Some(end) => &rest[..end],
            None => rest,
        }
    } else {
        trimmed
    };

    let inner = inner.trim();
    match (inner.find('{'), inner.rfind('}')) {
        (Some(start), Some(end)) if end > start => &inner[start..=end],
        _ => inner,
    }
}

fn decode<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, OrchestrationError> {
    serde_json::from_str(extract_json_payload(text))
        .map_err(|e| OrchestrationError::DecisionParse(e.to_string()))
}

// ---------------------------------------------------------------------------
// DecisionEngine
// ---------------------------------------------------------------------------

/// Issues the necessity and selection calls and validates their results.
pub struct DecisionEngine {
    client: Option<Arc<dyn CompletionClient>>,
}

impl DecisionEngine {
    /// Engine backed by a completion client.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Engine with no completion client: decisions come entirely from the
    /// deterministic relevance scorer.
    pub fn offline() -> Self {
        Self { client: None }
    }

    /// Decide whether and how to use skills for a task.
    ///
    /// `skills` is the registry snapshot the returned indices refer to.
    /// Never fails: every parse or transport problem resolves into a
    /// usable decision.
    pub async fn decide(&self, task: &str, skills: &[Skill]) -> Decision {
        if skills.is_empty() {
            return Decision::NoSkillsNeeded {
                reasoning: "No skills are available to select from".to_string(),
            };
        }

        let Some(client) = self.client.as_ref() else {
            return self.decide_offline(task, skills);
        };

        // Stage A: necessity check. Fail open toward using skills.
        if let Some(reasoning) = self.check_necessity(client.as_ref(), task, skills).await {
            return Decision::NoSkillsNeeded { reasoning };
        }

        // Stage B: selection.
        self.select(client.as_ref(), task, skills).await
    }

    /// Run the necessity check. Returns `Some(reasoning)` when the task
    /// does not need skills, `None` when it does (or when the check could
    /// not be completed and the engine defaults to using skills).
    async fn check_necessity(
        &self,
        client: &dyn CompletionClient,
        task: &str,
        skills: &[Skill],
    ) -> Option<String> {
        let prompt = prompts::necessity_prompt(task, &summarize_all(skills));

        let decoded: Result<NecessityRaw, OrchestrationError> = match client.complete(&prompt).await
        {
            Ok(response) => decode(&response),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(raw) if !raw.needs_skills => {
                log::info!("Necessity check: task answerable directly ({})", raw.reasoning);
                Some(raw.reasoning)
            }
            Ok(raw) => {
                log::debug!("Necessity check: skills needed ({})", raw.reasoning);
                None
            }
            Err(e) => {
                log::warn!("Necessity check failed ({e}), defaulting to using skills");
                None
            }
        }
    }

    /// Run the selection stage, falling back to the scorer on an
    /// undecodable response.
    async fn select(
        &self,
        client: &dyn CompletionClient,
        task: &str,
        skills: &[Skill],
    ) -> Decision {
        let prompt = prompts::selection_prompt(task, &summarize_all(skills));

        let decoded: Result<SelectionRaw, OrchestrationError> = match client.complete(&prompt).await
        {
            Ok(response) => decode(&response),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(raw) => {
                let decision = validate_selection(raw, skills.len());
                log::info!(
                    "Selected {} skill(s), mode={}",
                    decision.selected.len(),
                    decision.mode,
                );
                Decision::UseSkills(decision)
            }
            Err(e) => {
                log::warn!("Skill selection failed ({e}), falling back to relevance scoring");
                Decision::UseSkills(self.fallback_selection(task, skills))
            }
        }
    }

    /// Offline decision: relevance-scored selection, chaining at most two
    /// skills when the conservative gate allows it.
    fn decide_offline(&self, task: &str, skills: &[Skill]) -> Decision {
        let mut selected = scorer::select_multiple(skills, task);
        if selected.is_empty() {
            // Nothing scored above zero; still route to the first skill
            // rather than silently dropping capability use.
            selected = vec![0];
        }
        log::info!(
            "Offline selection: {} skill(s) via relevance scoring",
            selected.len(),
        );

        Decision::UseSkills(OrchestrationDecision {
            execution_order: selected.clone(),
            selected,
            mode: ExecutionMode::Sequential,
            dependencies: HashMap::new(),
            reasoning: "Offline selection via deterministic relevance scoring".to_string(),
            execution_flow: String::new(),
        })
    }

    /// Degraded-mode selection after an undecodable selection response:
    /// single best-scoring skill, or the first skill when nothing scores
    /// above zero.
    fn fallback_selection(&self, task: &str, skills: &[Skill]) -> OrchestrationDecision {
        let selected = vec![scorer::select_best(skills, task).unwrap_or(0)];

        OrchestrationDecision {
            execution_order: selected.clone(),
            selected,
            mode: ExecutionMode::Sequential,
            dependencies: HashMap::new(),
            reasoning: "Fallback: relevance-scored selection after undecodable orchestration response"
                .to_string(),
            execution_flow: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Coerce a raw selection into a valid [`OrchestrationDecision`]:
/// out-of-range indices are discarded, duplicates removed, an empty result
/// becomes `[0]`, and an unknown mode becomes sequential.
fn validate_selection(raw: SelectionRaw, skill_count: usize) -> OrchestrationDecision {
    let mut selected = sanitize_indices(&raw.selected_skill_indices, skill_count);
    if selected.is_empty() {
        log::warn!("Selection produced no valid indices; defaulting to the first skill");
        selected = vec![0];
    }

    let mode = match raw.execution_mode.to_lowercase().as_str() {
        "parallel" => ExecutionMode::Parallel,
        "sequential" => ExecutionMode::Sequential,
        other => {
            if !other.is_empty() {
                log::warn!("Unknown execution_mode {other:?}; coercing to sequential");
            }
            ExecutionMode::Sequential
        }
    };

    let execution_order = sanitize_indices(&raw.execution_order, skill_count);

    let dependencies = raw
        .dependencies
        .into_iter()
        .filter_map(|(key, values)| {
            let step: usize = key.parse().ok()?;
            Some((step, sanitize_indices(&values, skill_count)))
        })
        .collect();

    OrchestrationDecision {
        selected,
        mode,
        dependencies,
        execution_order,
        reasoning: raw.reasoning,
        execution_flow: raw.execution_flow,
    }
}

/// Keep in-range indices, preserving order, dropping duplicates.
fn sanitize_indices(raw: &[i64], skill_count: usize) -> Vec<usize> {
    let mut seen = std::collections::HashSet::new();
    raw.iter()
        .filter_map(|&i| usize::try_from(i).ok())
        .filter(|&i| i < skill_count)
        .filter(|&i| seen.insert(i))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
