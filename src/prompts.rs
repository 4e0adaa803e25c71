//! Prompt construction.
//!
//! All outbound prompt text is assembled here so the decision contracts
//! (the JSON shapes the engine parses back) sit next to the wording that
//! requests them. The decision engine and the agent runtime only ever see
//! finished strings.

use crate::context::TaskContext;
use crate::skill::{Skill, SkillSummary};

/// Prompt for the necessity check: does this task require skills at all?
///
/// The response contract is a JSON object
/// `{"needs_skills": bool, "reasoning": string}`.
pub fn necessity_prompt(task: &str, summaries: &[SkillSummary]) -> String {
    let skills_json =
        serde_json::to_string_pretty(summaries).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are an intelligent skill orchestrator. Your first job is to determine \
whether a task requires specialized skills or can be answered directly.\n\n\
AVAILABLE SKILLS:\n{skills_json}\n\n\
TASK: {task}\n\n\
A task NEEDS skills if it requires executing scripts to gather or process data, \
specialized frameworks or methodologies, or domain knowledge from reference files.\n\
A task does NOT need skills if it is a general knowledge question, a simple \
explanation or definition, or a conversational query.\n\n\
Respond with a JSON object in exactly this format:\n\
{{\n    \"needs_skills\": true,\n    \"reasoning\": \"Brief explanation\"\n}}"
    )
}

/// Prompt for the selection step: which skill(s), in what order and mode.
///
/// The response contract is a JSON object with `selected_skill_indices`,
/// `execution_order`, `execution_mode` ("sequential" | "parallel"),
/// optional `dependencies`, `reasoning`, and `execution_flow`.
pub fn selection_prompt(task: &str, summaries: &[SkillSummary]) -> String {
    let skills_json =
        serde_json::to_string_pretty(summaries).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are an intelligent skill orchestrator. Select the most relevant \
skill(s) for the task and decide how they should execute.\n\n\
AVAILABLE SKILLS:\n{skills_json}\n\n\
TASK: {task}\n\n\
Prefer fewer, highly relevant skills over many marginally relevant ones. If one \
skill can handle the task alone, select only that skill.\n\n\
Use \"sequential\" when one skill's output feeds the next (data gathering then \
analysis). Use \"parallel\" when the skills work on independent aspects of the \
task and their results can be merged afterwards.\n\n\
Respond with a JSON object in exactly this format:\n\
{{\n\
    \"selected_skill_indices\": [0, 1],\n\
    \"execution_order\": [0, 1],\n\
    \"execution_mode\": \"sequential\",\n\
    \"dependencies\": {{\"1\": [0]}},\n\
    \"reasoning\": \"Why these skills were selected\",\n\
    \"execution_flow\": \"How the skills work together\"\n\
}}"
    )
}

/// Full prompt for one agent-runtime step: persona, resource inventory,
/// accumulated context, then the step instructions.
pub fn agent_prompt(skill: &Skill, instructions: &str, context: &TaskContext) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!(
        "You are {role}.\nGoal: {goal}\nBackground: {backstory}",
        role = skill.role,
        goal = skill.goal,
        backstory = skill.backstory,
    ));

    if !skill.scripts.is_empty() {
        sections.push(format!("Available scripts: {}", skill.scripts.join(", ")));
    }
    if !skill.references.is_empty() {
        sections.push(format!(
            "Available reference files ({}): {}",
            skill.references.len(),
            skill.references.join(", "),
        ));
    }

    if !context.is_empty() {
        let mut block = String::from("Previous step outputs:\n");
        for (i, entry) in context.entries().iter().enumerate() {
            block.push_str(&format!(
                "--- Step {} ({}) ---\n{}\n",
                i + 1,
                entry.skill_name,
                entry.output,
            ));
        }
        sections.push(block.trim_end().to_string());
    }

    sections.push(format!("YOUR TASK:\n{instructions}"));

    sections.join("\n\n")
}

/// Instructions for the parallel-mode synthesis step.
pub fn synthesis_instructions(task: &str, step_count: usize) -> String {
    format!(
        "{step_count} independent analyses of the following task have completed; \
their outputs are provided above as previous step outputs.\n\n\
ORIGINAL TASK: {task}\n\n\
Combine all of them into one final answer: reconcile overlaps, note \
disagreements, and produce a single coherent synthesis with conclusions and \
recommendations. If an output reports an error, work with the remaining ones."
    )
}

/// Prompt for answering a task directly, without any skill.
pub fn direct_answer_prompt(task: &str) -> String {
    format!(
        "Answer the following question or task directly using your knowledge. \
Provide a comprehensive, helpful response.\n\n\
Task: {task}\n\n\
Provide a clear, detailed answer."
    )
}
