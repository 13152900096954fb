//! Keyword retrieval over registered tool descriptions.
//!
//! A query word scores one point when it occurs as a substring of the
//! description (case-sensitive). Every registered tool is
//! ranked, including those scoring zero, so a query with no overlap still
//! returns the first `top_k` tools in registration order.

use std::collections::BTreeSet;

use crate::definition::SkillDefinition;
use crate::registry::SkillRegistry;

/// Retrieval view of one registered tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub description: String,
    /// Whitespace tokens of the description.
    pub keywords: BTreeSet<String>,
}

impl IndexEntry {
    pub fn new(definition: &SkillDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            description: definition.description.clone(),
            keywords: definition
                .description
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredSkill<'a> {
    pub name: &'a str,
    pub score: usize,
}

/// Distinct whitespace-separated words of `query`, in first-seen order.
pub fn query_words(query: &str) -> Vec<&str> {
    let mut words: Vec<&str> = Vec::new();
    for word in query.split_whitespace() {
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Score every entry against `query`, highest first. Ties keep index order.
pub fn rank<'a>(index: &'a [IndexEntry], query: &str) -> Vec<ScoredSkill<'a>> {
    let words = query_words(query);
    let mut scored: Vec<ScoredSkill<'a>> = index
        .iter()
        .map(|entry| ScoredSkill {
            name: &entry.name,
            score: words
                .iter()
                .filter(|w| entry.description.contains(**w))
                .count(),
        })
        .collect();
    // `sort_by` is stable
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

impl SkillRegistry {
    /// Rank registered tools against `query` without truncating.
    pub fn rank(&self, query: &str) -> Vec<ScoredSkill<'_>> {
        rank(self.index(), query)
    }

    /// The `top_k` most relevant tool definitions for `query`, best first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<&SkillDefinition> {
        let ranked = self.rank(query);
        log::debug!(
            "Retrieval for {:?}: {:?}",
            query,
            ranked
                .iter()
                .take(top_k)
                .map(|s| (s.name, s.score))
                .collect::<Vec<_>>()
        );
        ranked
            .into_iter()
            .take(top_k)
            .filter_map(|s| self.definition(s.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{GreeterFactory, catalog};
    use crate::skill::SkillFactory;

    fn registry(tools: &[(&str, &str)]) -> SkillRegistry {
        let mut registry = SkillRegistry::new(catalog());
        let factory = GreeterFactory {
            name: "GreeterSkill",
            operations: &[],
        };
        for (name, description) in tools {
            registry.register(
                SkillDefinition {
                    name: name.to_string(),
                    description: description.to_string(),
                    parameters: None,
                },
                factory.create(None).unwrap(),
                "GreeterSkill",
            );
        }
        registry
    }

    fn names(defs: Vec<&SkillDefinition>) -> Vec<&str> {
        defs.into_iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_keywords_from_description() {
        let entry = IndexEntry::new(&SkillDefinition {
            name: "t".into(),
            description: "spawn a  house a".into(),
            parameters: None,
        });
        let expected: BTreeSet<String> = ["spawn", "a", "house"].iter().map(|s| s.to_string()).collect();
        assert_eq!(entry.keywords, expected);
    }

    #[test]
    fn test_matching_entry_ranks_first() {
        let reg = registry(&[
            ("spawn_tree", "Plant a tree in the level"),
            ("delete_actor", "Remove an actor from the level"),
            ("build_house", "Build a house at a location"),
        ]);
        let top = names(reg.retrieve("place a house", 3));
        assert_eq!(top[0], "build_house");
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn test_zero_scores_still_returned_in_registration_order() {
        let reg = registry(&[("a", "alpha"), ("b", "beta"), ("c", "gamma"), ("d", "delta")]);
        assert_eq!(names(reg.retrieve("建一个房子", 3)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_substring_match_and_duplicate_words_collapse() {
        let reg = registry(&[("a", "alpha"), ("b", "spawning buildings")]);
        let ranked = reg.rank("spawn spawn build");
        assert_eq!(ranked[0], ScoredSkill { name: "b", score: 2 });
        assert_eq!(ranked[1], ScoredSkill { name: "a", score: 0 });
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let reg = registry(&[("x", "house one"), ("y", "house two"), ("z", "barn")]);
        assert_eq!(names(reg.retrieve("house", 2)), vec!["x", "y"]);
    }

    #[test]
    fn test_retrieval_is_deterministic() {
        let reg = registry(&[("x", "house one"), ("y", "tree"), ("z", "house barn")]);
        let first = names(reg.retrieve("house barn", 3));
        let second = names(reg.retrieve("house barn", 3));
        assert_eq!(first, second);
        assert_eq!(first, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_top_k_bounds() {
        let reg = registry(&[("x", "one"), ("y", "two")]);
        assert!(reg.retrieve("one", 0).is_empty());
        assert_eq!(reg.retrieve("one", 10).len(), 2);
        assert!(registry(&[]).retrieve("one", 3).is_empty());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let reg = registry(&[("x", "House"), ("y", "house")]);
        assert_eq!(names(reg.retrieve("house", 1)), vec!["y"]);
    }
}
