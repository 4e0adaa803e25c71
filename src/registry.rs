//! Skill registry.
//!
//! The orchestration core consumes skills through the [`SkillRegistry`]
//! trait: an ordered, read-only snapshot per call. The directory-backed
//! implementation caches its snapshot; the cache is invalidated only by an
//! explicit [`DirectorySkillRegistry::rediscover`], never by the
//! orchestration core.

use std::path::PathBuf;

use parking_lot::RwLock;

use crate::error::OrchestrationError;
use crate::skill::{discovery, Skill};

/// Supplies the ordered list of discoverable skills.
pub trait SkillRegistry: Send + Sync {
    /// Return the current skill snapshot, in stable order.
    fn list_skills(&self) -> Result<Vec<Skill>, OrchestrationError>;
}

/// Directory-backed registry with a cached snapshot.
pub struct DirectorySkillRegistry {
    root: PathBuf,
    cache: RwLock<Option<Vec<Skill>>>,
}

impl DirectorySkillRegistry {
    /// Create a registry rooted at a skills directory. Discovery is lazy;
    /// the first [`SkillRegistry::list_skills`] call walks the directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached snapshot and walk the directory again.
    pub fn rediscover(&self) -> Result<Vec<Skill>, OrchestrationError> {
        let skills = discovery::discover_skills(&self.root)?;
        log::info!(
            "Discovered {} skill(s) under {}",
            skills.len(),
            self.root.display(),
        );
        *self.cache.write() = Some(skills.clone());
        Ok(skills)
    }
}

impl SkillRegistry for DirectorySkillRegistry {
    fn list_skills(&self) -> Result<Vec<Skill>, OrchestrationError> {
        if let Some(ref cached) = *self.cache.read() {
            return Ok(cached.clone());
        }
        self.rediscover()
    }
}

/// Fixed in-memory registry, mainly for embedding and tests.
pub struct InMemoryRegistry {
    skills: Vec<Skill>,
}

impl InMemoryRegistry {
    /// Create a registry over a fixed skill list.
    pub fn new(skills: Vec<Skill>) -> Self {
        Self { skills }
    }
}

impl SkillRegistry for InMemoryRegistry {
    fn list_skills(&self) -> Result<Vec<Skill>, OrchestrationError> {
        Ok(self.skills.clone())
    }
}
