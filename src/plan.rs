//! Execution plan builder.
//!
//! Turns a validated skill selection into an ordered list of per-step
//! instructions. Pure and idempotent: no LLM calls, no clocks, no
//! randomness, so the same selection always yields a structurally identical
//! plan. Step instructions follow position templates: the first step
//! gathers, interior steps build on prior findings, the last step produces
//! the final synthesis, regardless of execution mode.

use serde::{Deserialize, Serialize};

use crate::decision::ExecutionMode;
use crate::skill::Skill;

/// Shape of an execution plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    /// One skill, one step.
    Single,
    /// Multiple steps chained (sequentially or in parallel).
    Chain,
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanKind::Single => write!(f, "single"),
            PlanKind::Chain => write!(f, "chain"),
        }
    }
}

/// One planned step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// 1-based position in the plan.
    pub position: usize,
    /// Identifier of the skill executing this step.
    pub skill_name: String,
    /// Human instructions synthesized from the position templates.
    pub instructions: String,
    /// Whether the skill ships scripts (informational, for prompts).
    pub has_scripts: bool,
    /// Whether the skill ships reference files (informational).
    pub has_references: bool,
}

/// Derived, read-only execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Plan shape.
    pub kind: PlanKind,
    /// Ordered steps, one per selected skill.
    pub flow: Vec<PlanStep>,
}

/// Build the execution plan for a selection, in selection order.
pub fn build_plan(selection: &[Skill]) -> ExecutionPlan {
    let kind = if selection.len() <= 1 {
        PlanKind::Single
    } else {
        PlanKind::Chain
    };

    let flow = selection
        .iter()
        .enumerate()
        .map(|(i, skill)| PlanStep {
            position: i + 1,
            skill_name: skill.name.clone(),
            instructions: step_instructions(skill, i, selection.len()),
            has_scripts: !skill.scripts.is_empty(),
            has_references: !skill.references.is_empty(),
        })
        .collect();

    ExecutionPlan { kind, flow }
}

/// Synthesize instructions for one step from its position in the chain.
fn step_instructions(skill: &Skill, index: usize, total: usize) -> String {
    let mut parts: Vec<String> = Vec::new();

    if index == 0 {
        parts.push("Start by gathering the data and information the task needs".to_string());
    } else {
        parts.push("Build on the previous step's findings".to_string());
    }

    if !skill.scripts.is_empty() {
        let shown: Vec<&str> = skill.scripts.iter().take(3).map(String::as_str).collect();
        parts.push(format!("Use the available scripts: {}", shown.join(", ")));
    }

    if !skill.references.is_empty() {
        parts.push(format!(
            "Consult the {} available reference file(s) when needed",
            skill.references.len()
        ));
    }

    if index == total - 1 {
        parts.push("Provide the final comprehensive analysis and recommendations".to_string());
    }

    format!("{}.", parts.join(". "))
}

/// Render the plan as an ASCII flow diagram for the log.
pub fn render_flow_diagram(plan: &ExecutionPlan, mode: ExecutionMode) -> String {
    let mut lines: Vec<String> = Vec::new();

    match mode {
        ExecutionMode::Parallel => {
            lines.push("Mode: PARALLEL (independent steps)".to_string());
            lines.push(String::new());
            for step in &plan.flow {
                lines.push(format!("  ┌─ Step {}: {}", step.position, step.skill_name));
                lines.push("  │    working independently".to_string());
                lines.push("  └─ output".to_string());
            }
            lines.push("         │".to_string());
            lines.push("         │ (all outputs collected)".to_string());
            lines.push("         ▼".to_string());
            lines.push("  ┌──────────────────────┐".to_string());
            lines.push("  │  SYNTHESIS STEP      │".to_string());
            lines.push("  └──────────────────────┘".to_string());
            lines.push("         │".to_string());
            lines.push("         ▼".to_string());
            lines.push("    FINAL OUTPUT".to_string());
        }
        ExecutionMode::Sequential => {
            lines.push("Mode: SEQUENTIAL (dependent steps)".to_string());
            lines.push(String::new());
            for step in &plan.flow {
                lines.push(format!("  ┌─ Step {}: {}", step.position, step.skill_name));
                if step.position < plan.flow.len() {
                    lines.push("  └──── output".to_string());
                    lines.push("         │".to_string());
                    lines.push("         ▼".to_string());
                } else {
                    lines.push("  └──── FINAL OUTPUT".to_string());
                }
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str) -> Skill {
        Skill::new(name, format!("{name} description"))
    }

    #[test]
    fn test_single_skill_plan() {
        let plan = build_plan(&[skill("solo")]);
        assert_eq!(plan.kind, PlanKind::Single);
        assert_eq!(plan.flow.len(), 1);
        assert_eq!(plan.flow[0].position, 1);
        // A lone step both gathers and finalizes.
        assert!(plan.flow[0].instructions.contains("Start by gathering"));
        assert!(plan.flow[0].instructions.contains("final comprehensive"));
    }

    #[test]
    fn test_chain_plan_positions_and_templates() {
        let plan = build_plan(&[skill("a"), skill("b"), skill("c")]);
        assert_eq!(plan.kind, PlanKind::Chain);
        assert_eq!(plan.flow.len(), 3);
        assert_eq!(
            plan.flow.iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        assert!(plan.flow[0].instructions.contains("Start by gathering"));
        assert!(!plan.flow[0].instructions.contains("final comprehensive"));

        assert!(plan.flow[1].instructions.contains("Build on the previous step"));
        assert!(!plan.flow[1].instructions.contains("final comprehensive"));

        assert!(plan.flow[2].instructions.contains("Build on the previous step"));
        assert!(plan.flow[2].instructions.contains("final comprehensive"));
    }

    #[test]
    fn test_plan_mentions_resources() {
        let with_resources = Skill::new("loaded", "Has stuff")
            .with_scripts(vec![
                "a.py".to_string(),
                "b.py".to_string(),
                "c.py".to_string(),
                "d.py".to_string(),
            ])
            .with_references(vec!["ref.md".to_string()]);
        let plan = build_plan(&[with_resources]);

        let step = &plan.flow[0];
        assert!(step.has_scripts);
        assert!(step.has_references);
        // Only the first three scripts are named.
        assert!(step.instructions.contains("a.py, b.py, c.py"));
        assert!(!step.instructions.contains("d.py"));
        assert!(step.instructions.contains("1 available reference file(s)"));
    }

    #[test]
    fn test_build_plan_is_idempotent() {
        let selection = vec![skill("a"), skill("b")];
        let first = build_plan(&selection);
        let second = build_plan(&selection);
        assert_eq!(first, second);
    }

    #[test]
    fn test_flow_diagram_mentions_every_step() {
        let plan = build_plan(&[skill("one"), skill("two")]);

        let sequential = render_flow_diagram(&plan, ExecutionMode::Sequential);
        assert!(sequential.contains("SEQUENTIAL"));
        assert!(sequential.contains("Step 1: one"));
        assert!(sequential.contains("Step 2: two"));

        let parallel = render_flow_diagram(&plan, ExecutionMode::Parallel);
        assert!(parallel.contains("PARALLEL"));
        assert!(parallel.contains("SYNTHESIS STEP"));
    }
}
