//! The cache-group rule engine.
//!
//! Rules are data, not code: each [`CacheGroupRule`] pairs a [`ModuleTest`]
//! predicate with a chunk scope, a priority, and the `enforce` flag. A
//! [`RuleSet`] keeps the rules sorted by descending priority, stable on
//! declaration order, so the first match is also the tie-break winner.
//!
//! Every test runs against a module's canonical `/`-separated resource path,
//! so the same configuration matches identically on every platform.

use regex::Regex;
use shard_config::{CacheGroupConfig, ChunkScope, TestConfig};

use crate::error::ChunkError;

/// A predicate over canonical resource paths.
#[derive(Debug, Clone)]
pub enum ModuleTest {
    /// Any of the listed packages under a `node_modules` directory.
    Packages(Vec<String>),
    /// Any of the listed substrings.
    Contains(Vec<String>),
    /// A run of whole path segments, e.g. `js/components`.
    Directory(String),
    /// A regular expression.
    Regex(Regex),
}

impl ModuleTest {
    fn compile(group: &str, test: &TestConfig) -> Result<Self, ChunkError> {
        let separators = |s: &str| s.replace('\\', "/");
        Ok(match test {
            TestConfig::Packages(packages) => ModuleTest::Packages(
                packages
                    .iter()
                    .map(|p| format!("/node_modules/{}/", separators(p).trim_matches('/')))
                    .collect(),
            ),
            TestConfig::Contains(needles) => {
                ModuleTest::Contains(needles.iter().map(|n| separators(n)).collect())
            }
            TestConfig::Directory(dir) => {
                ModuleTest::Directory(format!("/{}/", separators(dir).trim_matches('/')))
            }
            TestConfig::Regex(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| ChunkError::InvalidPattern {
                    group: group.to_string(),
                    message: e.to_string(),
                })?;
                ModuleTest::Regex(regex)
            }
        })
    }

    /// Returns `true` if the canonical `resource` path matches.
    pub fn matches(&self, resource: &str) -> bool {
        match self {
            ModuleTest::Packages(needles) | ModuleTest::Contains(needles) => {
                needles.iter().any(|n| resource.contains(n.as_str()))
            }
            ModuleTest::Directory(needle) => resource.contains(needle.as_str()),
            ModuleTest::Regex(regex) => regex.is_match(resource),
        }
    }
}

/// One compiled cache group.
#[derive(Debug, Clone)]
pub struct CacheGroupRule {
    /// Group name; becomes the shared chunk's name.
    pub name: String,
    /// Module predicate.
    pub test: ModuleTest,
    /// Which chunk kinds the rule applies to.
    pub scope: ChunkScope,
    /// Higher wins.
    pub priority: i32,
    /// Skip the size and request-count heuristics.
    pub enforce: bool,
    /// Position in the configured list; breaks priority ties.
    pub index: usize,
}

impl CacheGroupRule {
    /// Returns `true` if the rule's scope admits a chunk that is loaded up
    /// front (`initial`) or on demand.
    pub fn admits(&self, initial: bool) -> bool {
        match self.scope {
            ChunkScope::All => true,
            ChunkScope::Initial => initial,
            ChunkScope::Async => !initial,
        }
    }

    /// Returns `true` if `self` beats `other` when both claim a module.
    pub fn outranks(&self, other: &CacheGroupRule) -> bool {
        (self.priority, std::cmp::Reverse(self.index))
            > (other.priority, std::cmp::Reverse(other.index))
    }
}

/// An immutable, priority-ordered set of cache groups.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CacheGroupRule>,
}

impl RuleSet {
    /// Compiles configured cache groups.
    pub fn compile(groups: &[CacheGroupConfig]) -> Result<Self, ChunkError> {
        let mut rules = groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                Ok(CacheGroupRule {
                    name: group.name.clone(),
                    test: ModuleTest::compile(&group.name, &group.test)?,
                    scope: group.chunks,
                    priority: group.priority,
                    enforce: group.enforce,
                    index,
                })
            })
            .collect::<Result<Vec<_>, ChunkError>>()?;
        // Stable sort keeps declaration order among equal priorities.
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(Self { rules })
    }

    /// Returns the first rule, in priority order, whose test matches
    /// `resource` and whose scope admits the chunk.
    pub fn classify(&self, resource: &str, initial: bool) -> Option<&CacheGroupRule> {
        self.rules
            .iter()
            .find(|rule| rule.admits(initial) && rule.test.matches(resource))
    }

    /// Iterates rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheGroupRule> {
        self.rules.iter()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, test: TestConfig, priority: i32) -> CacheGroupConfig {
        CacheGroupConfig {
            name: name.to_string(),
            test,
            chunks: ChunkScope::All,
            priority,
            enforce: true,
        }
    }

    #[test]
    fn higher_priority_wins() {
        let rules = RuleSet::compile(&[
            group("low", TestConfig::Contains(vec!["/src/".into()]), 5),
            group("high", TestConfig::Contains(vec!["/src/".into()]), 10),
        ])
        .unwrap();
        let rule = rules.classify("/app/src/a.js", true).unwrap();
        assert_eq!(rule.name, "high");
    }

    #[test]
    fn equal_priority_declaration_order_wins() {
        let rules = RuleSet::compile(&[
            group("first", TestConfig::Contains(vec!["a.js".into()]), 1),
            group("second", TestConfig::Contains(vec!["a.js".into()]), 1),
        ])
        .unwrap();
        assert_eq!(rules.classify("/app/a.js", true).unwrap().name, "first");
        let names: Vec<_> = rules.iter().map(|r| r.index).collect();
        assert_eq!(names, vec![0, 1]);
    }

    #[test]
    fn packages_match_whole_package_names() {
        let rules = RuleSet::compile(&[group(
            "react",
            TestConfig::Packages(vec!["react".into(), "react-dom".into()]),
            0,
        )])
        .unwrap();
        assert!(rules
            .classify("/app/node_modules/react/index.js", true)
            .is_some());
        assert!(rules
            .classify("/app/node_modules/react-dom/client.js", true)
            .is_some());
        assert!(rules
            .classify("/app/node_modules/react-router/index.js", true)
            .is_none());
    }

    #[test]
    fn directory_matches_segments_only() {
        let rules = RuleSet::compile(&[group(
            "components",
            TestConfig::Directory("js/components/".into()),
            0,
        )])
        .unwrap();
        assert!(rules
            .classify("/app/src/js/components/Nav.jsx", true)
            .is_some());
        assert!(rules
            .classify("/app/src/js/components-old/Nav.jsx", true)
            .is_none());
    }

    #[test]
    fn backslash_needles_match_canonical_paths() {
        let rules = RuleSet::compile(&[group(
            "components",
            TestConfig::Contains(vec!["js\\components\\".into()]),
            0,
        )])
        .unwrap();
        assert!(rules
            .classify("C:/work/app/src/js/components/Nav.jsx", true)
            .is_some());
    }

    #[test]
    fn regex_test() {
        let rules =
            RuleSet::compile(&[group("styles", TestConfig::Regex(r"\.s?css$".into()), 0)]).unwrap();
        assert!(rules.classify("/app/src/main.scss", false).is_some());
        assert!(rules.classify("/app/src/main.js", false).is_none());
    }

    #[test]
    fn invalid_regex_is_reported() {
        let err = RuleSet::compile(&[group("bad", TestConfig::Regex("(".into()), 0)]).unwrap_err();
        assert!(matches!(err, ChunkError::InvalidPattern { ref group, .. } if group == "bad"));
    }

    #[test]
    fn scope_filters_chunk_kind() {
        let mut config = group("async-only", TestConfig::Contains(vec!["lib".into()]), 0);
        config.chunks = ChunkScope::Async;
        let rules = RuleSet::compile(&[config]).unwrap();
        assert!(rules.classify("/app/lib/x.js", true).is_none());
        assert!(rules.classify("/app/lib/x.js", false).is_some());
    }

    #[test]
    fn outranks_orders_by_priority_then_index() {
        let rules = RuleSet::compile(&[
            group("a", TestConfig::Contains(vec![]), 1),
            group("b", TestConfig::Contains(vec![]), 1),
            group("c", TestConfig::Contains(vec![]), 7),
        ])
        .unwrap();
        let all: Vec<_> = rules.iter().collect();
        assert_eq!(all[0].name, "c");
        assert!(all[0].outranks(all[1]));
        assert!(all[1].outranks(all[2]));
        assert!(!all[2].outranks(all[1]));
    }

    #[test]
    fn classification_is_pure() {
        let rules = RuleSet::compile(&[group(
            "vendors",
            TestConfig::Packages(vec!["lodash".into()]),
            0,
        )])
        .unwrap();
        let path = "/app/node_modules/lodash/lodash.js";
        let first = rules.classify(path, true).map(|r| r.name.clone());
        let second = rules.classify(path, true).map(|r| r.name.clone());
        assert_eq!(first, second);
    }
}
