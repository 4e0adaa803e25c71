//! Deterministic relevance scoring.
//!
//! Degraded-mode substitute for the LLM decision path: keyword-overlap
//! scoring of a skill against a task, with a conservative gate deciding
//! whether a second skill is worth chaining. No network dependency, and
//! identical (skill-set, task) inputs always produce identical results,
//! which makes this the one fully testable piece of the selection logic.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::skill::Skill;

/// Score weight for description-word overlap.
const DESCRIPTION_WEIGHT: f64 = 2.0;
/// Score weight for goal-word overlap.
const GOAL_WEIGHT: f64 = 1.5;
/// Score weight for generic 4+-letter keyword overlap.
const KEYWORD_WEIGHT: f64 = 1.0;
/// Flat bonus when a task word appears inside the skill name.
const NAME_BONUS: f64 = 5.0;

/// Minimum top score before chaining is even considered.
const CHAIN_MIN_BEST: f64 = 3.0;
/// Minimum runner-up score before chaining is considered.
const CHAIN_MIN_SECOND: f64 = 2.0;
/// Runner-up must reach this fraction of the top score.
const CHAIN_MIN_RATIO: f64 = 0.5;
/// High-score pair thresholds that allow chaining without a multi-domain cue.
const CHAIN_HIGH_BEST: f64 = 5.0;
const CHAIN_HIGH_SECOND: f64 = 4.0;
const CHAIN_HIGH_RATIO: f64 = 0.7;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("word regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
        "did", "will", "would", "should", "could", "may", "might", "must", "can", "this", "that",
        "these", "those", "i", "you", "he", "she", "it", "we", "they", "what", "which", "who",
        "when", "where", "why", "how",
    ]
    .into_iter()
    .collect()
});

/// Linguistic cues that a task spans multiple domains and would benefit
/// from chaining two skills (e.g. "gather ... then apply").
static MULTI_DOMAIN_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(analyze|gather|collect|fetch)\b.*?\b(apply|use|framework|solve|analyze)\b",
        r"\b(and then|and apply|then use|then apply)\b",
        r"\b(data|information|results)\b.*?\b(framework|methodology|strategy|analyze)\b",
        r"\b(problem|solve|solution)\b.*?\b(analyze|data|framework)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("multi-domain regex"))
    .collect()
});

fn words(text: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|w| !STOP_WORDS.contains(w.as_str()))
        .collect()
}

fn long_words(text: &str) -> HashSet<String> {
    words(text).into_iter().filter(|w| w.len() >= 4).collect()
}

/// Score how relevant a skill is to a task. Pure, deterministic,
/// non-negative.
pub fn score_relevance(skill: &Skill, task: &str) -> f64 {
    let task_lower = task.to_lowercase();
    let task_words = words(&task_lower);

    let name = skill.name.to_lowercase();
    let description = skill.description.to_lowercase();
    let goal = skill.goal.to_lowercase();

    let mut score = 0.0;

    // Description overlap.
    if !description.is_empty() {
        let overlap = task_words.intersection(&words(&description)).count();
        score += overlap as f64 * DESCRIPTION_WEIGHT;
    }

    // Name bonus: any long-enough task word appearing inside the name.
    if task_lower
        .split_whitespace()
        .any(|w| w.len() > 3 && name.contains(w))
    {
        score += NAME_BONUS;
    }

    // Goal overlap.
    if !goal.is_empty() {
        let overlap = task_words.intersection(&words(&goal)).count();
        score += overlap as f64 * GOAL_WEIGHT;
    }

    // Generic keyword overlap across the skill's whole text.
    let skill_text = format!("{} {} {}", name, description, goal);
    let overlap = long_words(&task_lower)
        .intersection(&long_words(&skill_text))
        .count();
    score += overlap as f64 * KEYWORD_WEIGHT;

    score
}

/// Score every skill, returning `(index, score)` pairs sorted by score
/// descending. Ties keep registry order, so ranking is deterministic.
pub fn rank(skills: &[Skill], task: &str) -> Vec<(usize, f64)> {
    let mut scored: Vec<(usize, f64)> = skills
        .iter()
        .enumerate()
        .map(|(i, skill)| (i, score_relevance(skill, task)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Index of the best-matching skill, or `None` when every score is ≤ 0.
pub fn select_best(skills: &[Skill], task: &str) -> Option<usize> {
    let ranked = rank(skills, task);
    match ranked.first() {
        Some(&(index, score)) if score > 0.0 => Some(index),
        _ => None,
    }
}

/// Whether the top two scored skills should be chained for this task.
///
/// Conservative by design: chaining needs both skills to score well, the
/// runner-up to be within reach of the top, and either an explicit
/// multi-domain cue in the task or a high close-scoring pair.
pub fn should_chain(ranked: &[(usize, f64)], task: &str) -> bool {
    if ranked.len() < 2 {
        return false;
    }
    let (_, best) = ranked[0];
    let (_, second) = ranked[1];

    if best < CHAIN_MIN_BEST || second < CHAIN_MIN_SECOND || second < best * CHAIN_MIN_RATIO {
        return false;
    }

    let task_lower = task.to_lowercase();
    if MULTI_DOMAIN_RES.iter().any(|re| re.is_match(&task_lower)) {
        return true;
    }

    best >= CHAIN_HIGH_BEST && second >= CHAIN_HIGH_SECOND && second / best >= CHAIN_HIGH_RATIO
}

/// Select up to two relevant skills: the best match, plus the runner-up
/// when the chain gate allows it. Empty when every score is ≤ 0.
pub fn select_multiple(skills: &[Skill], task: &str) -> Vec<usize> {
    let ranked = rank(skills, task);
    let Some(&(best_index, best_score)) = ranked.first() else {
        return Vec::new();
    };
    if best_score <= 0.0 {
        return Vec::new();
    }

    if should_chain(&ranked, task) {
        return vec![best_index, ranked[1].0];
    }

    vec![best_index]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_skill() -> Skill {
        Skill::new(
            "market-analysis",
            "Analyzes market trends, stock indicators and earnings data",
        )
        .with_persona(
            "Market Analysis",
            "Provide data-driven market analysis",
            "Experienced market analyst",
        )
    }

    fn problem_skill() -> Skill {
        Skill::new(
            "problem-solving",
            "Applies structured frameworks and methodologies to solve problems",
        )
        .with_persona(
            "Problem Solving",
            "Apply problem-solving frameworks",
            "Consultant",
        )
    }

    #[test]
    fn test_score_is_deterministic_and_non_negative() {
        let skill = market_skill();
        let task = "analyze market trends for the semiconductor sector";
        let first = score_relevance(&skill, task);
        let second = score_relevance(&skill, task);
        assert_eq!(first, second);
        assert!(first >= 0.0);
    }

    #[test]
    fn test_relevant_skill_outscores_unrelated() {
        let relevant = market_skill();
        let unrelated = Skill::new("gardening", "Tips for growing vegetables");
        let task = "analyze market trends and stock indicators";
        assert!(score_relevance(&relevant, task) > score_relevance(&unrelated, task));
    }

    #[test]
    fn test_name_substring_bonus() {
        let skill = Skill::new("market-analysis", "");
        // "market" (len > 3) appears inside the skill name.
        assert!(score_relevance(&skill, "market outlook") >= 5.0);
    }

    #[test]
    fn test_stop_words_do_not_score() {
        let skill = Skill::new("x", "the and with for that");
        assert_eq!(score_relevance(&skill, "the and with for that"), 0.0);
    }

    #[test]
    fn test_select_best_none_when_all_zero() {
        let skills = vec![Skill::new("alpha", "completely unrelated topic")];
        assert_eq!(select_best(&skills, "zzz qqq"), None);
    }

    #[test]
    fn test_select_best_picks_highest() {
        let skills = vec![problem_skill(), market_skill()];
        let best = select_best(&skills, "analyze market trends and earnings");
        assert_eq!(best, Some(1));
    }

    #[test]
    fn test_should_chain_false_for_single_skill() {
        assert!(!should_chain(&[(0, 10.0)], "gather data and then apply frameworks"));
        assert!(!should_chain(&[], "anything"));
    }

    #[test]
    fn test_should_chain_false_below_thresholds() {
        // Top score below 3.0.
        assert!(!should_chain(&[(0, 2.9), (1, 2.5)], "gather data and then apply frameworks"));
        // Second score below 2.0.
        assert!(!should_chain(&[(0, 6.0), (1, 1.9)], "gather data and then apply frameworks"));
        // Second below half of top.
        assert!(!should_chain(&[(0, 10.0), (1, 4.0)], "gather data and then apply frameworks"));
    }

    #[test]
    fn test_should_chain_multi_domain_cue() {
        assert!(should_chain(
            &[(0, 4.0), (1, 3.0)],
            "gather earnings data and then apply consulting frameworks"
        ));
        // Same scores without any multi-domain cue: not high enough to chain.
        assert!(!should_chain(&[(0, 4.0), (1, 3.0)], "market outlook"));
    }

    #[test]
    fn test_should_chain_high_close_pair() {
        assert!(should_chain(&[(0, 6.0), (1, 5.0)], "market outlook"));
        // High but too far apart.
        assert!(!should_chain(&[(0, 9.0), (1, 4.6)], "market outlook"));
    }

    #[test]
    fn test_select_multiple_chains_on_cue() {
        let skills = vec![market_skill(), problem_skill()];
        let task = "gather market data and then apply problem-solving frameworks to solve it";
        let selected = select_multiple(&skills, task);
        assert_eq!(selected.len(), 2);
        assert!(selected.contains(&0));
        assert!(selected.contains(&1));
    }

    #[test]
    fn test_select_multiple_single_without_cue() {
        let skills = vec![market_skill(), problem_skill()];
        let selected = select_multiple(&skills, "market trends overview");
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_select_multiple_empty_when_nothing_matches() {
        let skills = vec![Skill::new("alpha", "unrelated"), Skill::new("beta", "also unrelated")];
        assert!(select_multiple(&skills, "zzz qqq").is_empty());
    }
}
