use std::collections::BTreeSet;

use basalt_build_model::TargetInfo;

use crate::model::Tag;

/// Classify a target by its rule kind's suffix convention, overlaid with
/// the target's own `no-ide` / `manual` markers.
///
/// `no-ide` takes precedence: a target carrying both markers is tagged
/// NoIde only, since it never reaches the IDE anyway.
pub fn resolve_tags(target: &TargetInfo) -> BTreeSet<Tag> {
    let base = if target.kind.ends_with("_test") {
        Tag::Test
    } else if target.kind.ends_with("_binary") {
        Tag::Application
    } else {
        Tag::Library
    };

    let mut tags = BTreeSet::from([base]);
    if target.has_tag("no-ide") {
        tags.insert(Tag::NoIde);
    } else if target.has_tag("manual") {
        tags.insert(Tag::Manual);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_core::Label;

    fn target(kind: &str, tags: &[&str]) -> TargetInfo {
        TargetInfo {
            id: Label::new("//a:a"),
            kind: kind.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            ..TargetInfo::default()
        }
    }

    #[test]
    fn kind_suffix_determines_the_base_tag() {
        assert!(resolve_tags(&target("java_library", &[])).contains(&Tag::Library));
        assert!(resolve_tags(&target("java_binary", &[])).contains(&Tag::Application));
        assert!(resolve_tags(&target("java_test", &[])).contains(&Tag::Test));
        assert!(resolve_tags(&target("genrule", &[])).contains(&Tag::Library));
    }

    #[test]
    fn no_ide_wins_over_manual() {
        let tags = resolve_tags(&target("java_library", &["manual", "no-ide"]));
        assert!(tags.contains(&Tag::NoIde));
        assert!(!tags.contains(&Tag::Manual));

        let tags = resolve_tags(&target("java_library", &["manual"]));
        assert!(tags.contains(&Tag::Manual));
    }
}
