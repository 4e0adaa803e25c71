//! Skill discovery.
//!
//! Walks a skills directory and builds one [`Skill`] per subdirectory that
//! carries a parseable `SKILL.md`. A bundle that fails to parse is skipped
//! with a warning so one broken skill never hides the rest. Results are
//! ordered by directory name so a snapshot is deterministic across runs.

use std::path::Path;

use crate::error::OrchestrationError;
use crate::skill::{parser, Skill};

/// Discover all skills under `skills_dir`.
///
/// A missing directory yields an empty snapshot rather than an error; the
/// caller decides whether an empty registry is fatal.
pub fn discover_skills(skills_dir: &Path) -> Result<Vec<Skill>, OrchestrationError> {
    let mut skills = Vec::new();

    if !skills_dir.exists() {
        log::warn!("Skills directory not found: {}", skills_dir.display());
        return Ok(skills);
    }

    let mut dirs: Vec<_> = std::fs::read_dir(skills_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        if !dir.join("SKILL.md").exists() {
            continue;
        }
        match load_skill(&dir) {
            Ok(skill) => {
                log::debug!(
                    "Discovered skill '{}' ({} script(s), {} reference(s))",
                    skill.name,
                    skill.scripts.len(),
                    skill.references.len(),
                );
                skills.push(skill);
            }
            Err(e) => {
                log::warn!("Could not parse skill {}: {}", dir.display(), e);
            }
        }
    }

    Ok(skills)
}

/// Load a single skill bundle from its directory.
pub fn load_skill(skill_dir: &Path) -> Result<Skill, OrchestrationError> {
    let parsed = parser::parse_skill_md(skill_dir)?;

    let role = parser::role_from_name(&parsed.meta.name);
    let goal = parsed.meta.description.clone();
    let backstory = parser::backstory_from(&parsed.meta, &parsed.body);

    let scripts = list_files(&skill_dir.join("scripts"), Some("py"))?;
    let references = list_files(&skill_dir.join("references"), None)?;

    Ok(Skill::new(parsed.meta.name, parsed.meta.description)
        .with_persona(role, goal, backstory)
        .with_scripts(scripts)
        .with_references(references)
        .with_root(skill_dir))
}

/// List file names in a directory, optionally filtered by extension,
/// sorted for determinism. A missing directory yields an empty list.
fn list_files(dir: &Path, extension: Option<&str>) -> Result<Vec<String>, OrchestrationError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| match extension {
            Some(ext) => path.extension().and_then(|e| e.to_str()) == Some(ext),
            None => true,
        })
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect();
    names.sort();

    Ok(names)
}
