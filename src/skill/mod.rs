//! Skill descriptors.
//!
//! A [`Skill`] is an immutable-after-discovery capability bundle: an
//! identifying name, a human description, the agent persona fields
//! (role/goal/backstory) used by the runtime, and the inventory of scripts
//! and reference files the bundle ships with. The filesystem root is carried
//! only for the agent runtime; the orchestration core never touches it.

pub mod discovery;
pub mod parser;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Reserved name for the synthesis pseudo-skill that merges parallel
/// outputs.
pub const SYNTHESIS_SKILL_NAME: &str = "synthesis";

/// An immutable capability bundle that can be delegated a task.
///
/// Names are unique within one registry snapshot; the decision engine's
/// selected indices are only meaningful against the snapshot they were
/// decided for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique identifier within a registry snapshot (kebab-case by
    /// convention, e.g. "market-analysis").
    pub name: String,
    /// Human description of what the skill does.
    pub description: String,
    /// Persona role the runtime adopts when executing this skill.
    pub role: String,
    /// Goal statement for the runtime persona.
    pub goal: String,
    /// Backstory/context text for the runtime persona.
    pub backstory: String,
    /// Ordered script identifiers available under the skill root.
    #[serde(default)]
    pub scripts: Vec<String>,
    /// Ordered reference-file identifiers available under the skill root.
    #[serde(default)]
    pub references: Vec<String>,
    /// Filesystem root of the bundle. Used only by the agent runtime.
    #[serde(default)]
    pub root: PathBuf,
}

impl Skill {
    /// Create a skill with the required identity fields. The role defaults
    /// to the title-cased name and the goal to the description; discovery
    /// overrides both from the parsed SKILL.md.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let description = description.into();
        Self {
            role: parser::role_from_name(&name),
            goal: description.clone(),
            backstory: description.clone(),
            name,
            description,
            scripts: Vec::new(),
            references: Vec::new(),
            root: PathBuf::new(),
        }
    }

    /// Builder: set the persona fields.
    pub fn with_persona(
        mut self,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        self.role = role.into();
        self.goal = goal.into();
        self.backstory = backstory.into();
        self
    }

    /// Builder: set the script inventory.
    pub fn with_scripts(mut self, scripts: Vec<String>) -> Self {
        self.scripts = scripts;
        self
    }

    /// Builder: set the reference inventory.
    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    /// Builder: set the filesystem root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// The pseudo-skill under which the parallel-mode synthesis step runs,
    /// so synthesis output is attributed like any other step output.
    pub fn synthesis() -> Self {
        Skill::new(
            SYNTHESIS_SKILL_NAME,
            "Merges the outputs of independently executed steps into one final result",
        )
        .with_persona(
            "Synthesis Coordinator",
            "Combine all independent step outputs into a single coherent answer",
            "An integrator that reconciles findings from several independent \
             analyses, resolves overlaps, and produces the final combined result.",
        )
    }

    /// Derive a short capability phrase for prompt construction.
    pub fn capability_phrase(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !self.scripts.is_empty() {
            parts.push(format!(
                "Can execute {} script(s) for data processing",
                self.scripts.len()
            ));
        }
        if !self.references.is_empty() {
            parts.push(format!(
                "Has {} reference file(s) with frameworks/knowledge",
                self.references.len()
            ));
        }

        let description = self.description.to_lowercase();
        if description.contains("analysis") {
            parts.push("Provides analysis capabilities".to_string());
        }
        if description.contains("framework") || description.contains("methodology") {
            parts.push("Provides frameworks/methodologies".to_string());
        }
        if description.contains("problem") || description.contains("solve") {
            parts.push("Provides problem-solving capabilities".to_string());
        }

        if parts.is_empty() {
            "General purpose skill".to_string()
        } else {
            parts.join("; ")
        }
    }

    /// Compact summary used when presenting this skill to the decision LLM.
    pub fn summarize(&self, index: usize) -> SkillSummary {
        SkillSummary {
            index,
            name: self.name.clone(),
            description: self.description.clone(),
            has_scripts: !self.scripts.is_empty(),
            script_count: self.scripts.len(),
            has_references: !self.references.is_empty(),
            reference_count: self.references.len(),
            capabilities: self.capability_phrase(),
        }
    }
}

/// Compact, serializable view of a skill for decision prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSummary {
    /// Position of the skill in the registry snapshot.
    pub index: usize,
    /// Skill identifier.
    pub name: String,
    /// Human description.
    pub description: String,
    /// Whether any scripts ship with the bundle.
    pub has_scripts: bool,
    /// Number of scripts.
    pub script_count: usize,
    /// Whether any reference files ship with the bundle.
    pub has_references: bool,
    /// Number of reference files.
    pub reference_count: usize,
    /// Derived capability phrase.
    pub capabilities: String,
}

/// Summarize a whole registry snapshot in index order.
pub fn summarize_all(skills: &[Skill]) -> Vec<SkillSummary> {
    skills
        .iter()
        .enumerate()
        .map(|(i, s)| s.summarize(i))
        .collect()
}
