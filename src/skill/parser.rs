//! SKILL.md front-matter parsing.
//!
//! A skill bundle is described by a `SKILL.md` file whose YAML front matter
//! carries the identity fields and whose markdown body documents workflows.
//! The parser extracts the front matter, decodes it, and derives the agent
//! persona (role/goal/backstory) the runtime uses.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::OrchestrationError;

/// Matches a leading `--- ... ---` YAML front-matter block.
static FRONT_MATTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\s*\n(.*?)\n---\s*\n?(.*)\z").expect("front-matter regex"));

/// Decoded YAML front matter of a SKILL.md file.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillFrontMatter {
    /// Skill identifier.
    pub name: String,
    /// Human description.
    #[serde(default)]
    pub description: String,
}

/// A parsed SKILL.md: decoded front matter plus the markdown body.
#[derive(Debug, Clone)]
pub struct ParsedSkillFile {
    /// The decoded front matter.
    pub meta: SkillFrontMatter,
    /// The markdown body following the front matter.
    pub body: String,
}

/// Parse the `SKILL.md` inside a skill directory.
pub fn parse_skill_md(skill_dir: &Path) -> Result<ParsedSkillFile, OrchestrationError> {
    let skill_file = skill_dir.join("SKILL.md");
    if !skill_file.exists() {
        return Err(OrchestrationError::SkillParse(format!(
            "SKILL.md not found in {}",
            skill_dir.display()
        )));
    }

    let content = std::fs::read_to_string(&skill_file)?;
    parse_skill_content(&content)
}

/// Parse raw SKILL.md content.
pub fn parse_skill_content(content: &str) -> Result<ParsedSkillFile, OrchestrationError> {
    let captures = FRONT_MATTER_RE.captures(content).ok_or_else(|| {
        OrchestrationError::SkillParse("SKILL.md must start with YAML front matter".to_string())
    })?;

    let meta: SkillFrontMatter = serde_yaml::from_str(&captures[1])?;
    if meta.name.trim().is_empty() {
        return Err(OrchestrationError::SkillParse(
            "front matter `name` must be non-empty".to_string(),
        ));
    }

    Ok(ParsedSkillFile {
        meta,
        body: captures[2].to_string(),
    })
}

/// Derive a persona role from a kebab-case skill name
/// ("market-analysis" → "Market Analysis").
pub fn role_from_name(name: &str) -> String {
    name.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the persona backstory: the description, plus a bounded excerpt of
/// the body's "Quick Start" section when one exists.
pub fn backstory_from(meta: &SkillFrontMatter, body: &str) -> String {
    let mut parts = vec![meta.description.clone()];

    if let Some(excerpt) = quick_start_excerpt(body) {
        parts.push(format!("Quick Start: {}", excerpt));
    }

    parts.retain(|p| !p.trim().is_empty());
    parts.join("\n\n")
}

/// Extract up to 200 characters of the `## Quick Start` section body.
fn quick_start_excerpt(body: &str) -> Option<String> {
    let start = body.find("## Quick Start")?;
    let section = &body[start + "## Quick Start".len()..];
    let end = section.find("\n## ").unwrap_or(section.len());
    let excerpt: String = section[..end].trim().chars().take(200).collect();
    if excerpt.is_empty() {
        None
    } else {
        Some(excerpt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\nname: market-analysis\ndescription: Analyzes market trends and indicators\n---\n# Market Analysis\n\n## Quick Start\n\nRun fetch_data.py first, then analyze.py.\n\n## Details\n\nLong explanation here.\n";

    #[test]
    fn test_parse_valid_skill_md() {
        let parsed = parse_skill_content(SAMPLE).unwrap();
        assert_eq!(parsed.meta.name, "market-analysis");
        assert_eq!(
            parsed.meta.description,
            "Analyzes market trends and indicators"
        );
        assert!(parsed.body.contains("## Quick Start"));
    }

    #[test]
    fn test_missing_front_matter_is_rejected() {
        let result = parse_skill_content("# Just markdown\n\nNo front matter here.");
        assert!(matches!(result, Err(OrchestrationError::SkillParse(_))));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let result = parse_skill_content("---\nname: \"\"\ndescription: x\n---\nbody\n");
        assert!(matches!(result, Err(OrchestrationError::SkillParse(_))));
    }

    #[test]
    fn test_role_from_name() {
        assert_eq!(role_from_name("market-analysis"), "Market Analysis");
        assert_eq!(role_from_name("solver"), "Solver");
        assert_eq!(role_from_name("a--b"), "A B");
    }

    #[test]
    fn test_backstory_includes_quick_start_excerpt() {
        let parsed = parse_skill_content(SAMPLE).unwrap();
        let backstory = backstory_from(&parsed.meta, &parsed.body);
        assert!(backstory.starts_with("Analyzes market trends"));
        assert!(backstory.contains("Quick Start: Run fetch_data.py"));
        assert!(!backstory.contains("Long explanation"));
    }

    #[test]
    fn test_backstory_without_quick_start() {
        let parsed =
            parse_skill_content("---\nname: plain\ndescription: A plain skill\n---\nBody only.\n")
                .unwrap();
        let backstory = backstory_from(&parsed.meta, &parsed.body);
        assert_eq!(backstory, "A plain skill");
    }
}
