// tests/property_rules.rs

use std::collections::BTreeSet;

use phpguard::config::WatchSpec;
use phpguard::watch::WatchRule;
use proptest::prelude::*;

fn tag_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["unit", "functional", "fast", "slow", "db", "api"])
        .prop_map(|s| s.to_string())
}

fn rule_with_tags(tags: &[String]) -> WatchRule {
    let mut spec = WatchSpec::new(".*");
    spec.tags = tags.to_vec();
    WatchRule::from_spec(&spec, std::env::temp_dir()).expect("valid pattern")
}

proptest! {
    #[test]
    fn has_tags_is_any_intersection(
        tags in proptest::collection::vec(tag_strategy(), 0..4),
        query in proptest::collection::vec(tag_strategy(), 0..4),
    ) {
        let rule = rule_with_tags(&tags);
        let own: BTreeSet<&String> = tags.iter().collect();
        let expected = query.is_empty() || query.iter().any(|q| own.contains(q));
        prop_assert_eq!(rule.has_tags(&query), expected);
    }

    #[test]
    fn add_tags_keeps_distinct_tags(
        added in proptest::collection::vec(tag_strategy(), 0..12),
    ) {
        let mut rule = rule_with_tags(&[]);
        rule.add_tags(added.iter().cloned());
        rule.add_tags(added.iter().cloned());
        let distinct: BTreeSet<&String> = added.iter().collect();
        prop_assert_eq!(rule.tags().len(), distinct.len());
    }

    #[test]
    fn missing_files_never_match(name in "[a-z]{1,12}\\.php") {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec = WatchSpec::new(".*");
        let rule = WatchRule::from_spec(&spec, dir.path()).expect("valid pattern");
        prop_assert!(rule.match_file(dir.path().join(&name)).is_none());
    }
}
