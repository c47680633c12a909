//! Member classification.
//!
//! The scanner walks a type's members once, in declaration order, and sorts
//! every forwardable member into one of four buckets. Everything else is
//! recorded as skipped so callers can explain what was left out.

use serde::{Deserialize, Serialize};

use crate::model::{Function, Member, Modifier, Position, Property, UnsupportedKind};

pub const DEFAULT_QUALIFYING_MODIFIERS: &[&str] = &["private", "fileprivate"];
pub const DEFAULT_STATIC_MODIFIERS: &[&str] = &["static", "class"];

/// How modifier names are compared against the configured sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierMatching {
    /// Name equals one of the set. Detailed modifiers such as
    /// `private(set)` restrict only the setter and never match.
    #[default]
    Exact,
    /// Name contains one of the set as a substring.
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRules {
    pub matching: ModifierMatching,
    pub qualifying: Vec<String>,
    pub statics: Vec<String>,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            matching: ModifierMatching::Exact,
            qualifying: to_strings(DEFAULT_QUALIFYING_MODIFIERS),
            statics: to_strings(DEFAULT_STATIC_MODIFIERS),
        }
    }
}

impl ScanRules {
    /// Substring matching on `private` and `static`.
    pub fn substring() -> Self {
        Self {
            matching: ModifierMatching::Substring,
            qualifying: vec!["private".to_owned()],
            statics: vec!["static".to_owned()],
        }
    }

    pub fn qualifies(&self, modifiers: &[Modifier]) -> bool {
        self.any_match(modifiers, &self.qualifying)
    }

    pub fn is_static(&self, modifiers: &[Modifier]) -> bool {
        self.any_match(modifiers, &self.statics)
    }

    fn any_match(&self, modifiers: &[Modifier], set: &[String]) -> bool {
        modifiers.iter().any(|modifier| {
            set.iter().any(|wanted| match self.matching {
                ModifierMatching::Exact => modifier.detail.is_none() && modifier.name == *wanted,
                ModifierMatching::Substring => modifier.name.contains(wanted.as_str()),
            })
        })
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

/// Qualifying members sorted into buckets, each in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification<'a> {
    pub instance_properties: Vec<&'a Property>,
    pub instance_functions: Vec<&'a Function>,
    pub static_properties: Vec<&'a Property>,
    pub static_functions: Vec<&'a Function>,
}

impl Classification<'_> {
    pub fn len(&self) -> usize {
        self.instance_properties.len()
            + self.instance_functions.len()
            + self.static_properties.len()
            + self.static_functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    NotQualifying,
    Unsupported(UnsupportedKind),
}

/// A member left out of the classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub name: Option<String>,
    pub description: String,
    pub reason: SkipReason,
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome<'a> {
    pub classification: Classification<'a>,
    pub skipped: Vec<Skipped>,
}

/// Classify `members` under `rules`.
pub fn scan<'a>(members: &'a [Member], rules: &ScanRules) -> ScanOutcome<'a> {
    let mut outcome = ScanOutcome::default();

    for member in members {
        let qualifies = rules.qualifies(member.modifiers());
        let is_static = rules.is_static(member.modifiers());
        let buckets = &mut outcome.classification;

        match member {
            Member::Property(property) if qualifies => {
                if is_static {
                    buckets.static_properties.push(property);
                } else {
                    buckets.instance_properties.push(property);
                }
            }
            Member::Function(function) if qualifies => {
                if is_static {
                    buckets.static_functions.push(function);
                } else {
                    buckets.instance_functions.push(function);
                }
            }
            // Members inside `#if` blocks cannot be inspected, so the block
            // is reported whatever its modifiers.
            Member::Unsupported(unsupported)
                if qualifies || unsupported.kind == UnsupportedKind::ConditionalBlock =>
            {
                outcome.skipped.push(skipped(member, SkipReason::Unsupported(unsupported.kind)));
            }
            _ => outcome.skipped.push(skipped(member, SkipReason::NotQualifying)),
        }
    }

    outcome
}

/// Classification only, for callers that do not report skipped members.
pub fn classify<'a>(members: &'a [Member], rules: &ScanRules) -> Classification<'a> {
    scan(members, rules).classification
}

fn skipped(member: &Member, reason: SkipReason) -> Skipped {
    Skipped {
        name: member.name().map(str::to_owned),
        description: member.describe(),
        reason,
        position: member.position(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnsupportedMember;

    fn members() -> Vec<Member> {
        vec![
            Property::new("a", "Int").with_modifiers(["private"]).into(),
            Function::new("f").with_modifiers(["private", "static"]).into(),
            Property::new("b", "Int").with_modifiers(["public"]).into(),
            Function::new("g").with_modifiers(["fileprivate"]).into(),
            Property::new("c", "String").with_modifiers(["private", "static"]).into(),
            Property::new("d", "Int").with_modifiers(["private"]).into(),
            UnsupportedMember::new(
                UnsupportedKind::Subscript,
                None,
                vec![Modifier::new("private")],
                Position::new(9, 5),
            )
            .into(),
            UnsupportedMember::new(UnsupportedKind::Initializer, None, Vec::new(), Position::default()).into(),
        ]
    }

    fn names<T>(items: &[&T], name: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|item| name(item).to_owned()).collect()
    }

    #[test]
    fn test_buckets_preserve_order() {
        let members = members();
        let outcome = scan(&members, &ScanRules::default());
        let buckets = &outcome.classification;

        assert_eq!(names(&buckets.instance_properties, |p| p.name.as_str()), ["a", "d"]);
        assert_eq!(names(&buckets.instance_functions, |f| f.name.as_str()), ["g"]);
        assert_eq!(names(&buckets.static_properties, |p| p.name.as_str()), ["c"]);
        assert_eq!(names(&buckets.static_functions, |f| f.name.as_str()), ["f"]);
        assert_eq!(buckets.len(), 5);
    }

    #[test]
    fn test_skipped_members_are_reported() {
        let members = members();
        let outcome = scan(&members, &ScanRules::default());

        let reasons: Vec<SkipReason> = outcome.skipped.iter().map(|skip| skip.reason).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::NotQualifying,
                SkipReason::Unsupported(UnsupportedKind::Subscript),
                SkipReason::NotQualifying,
            ]
        );
        assert_eq!(outcome.skipped[0].name.as_deref(), Some("b"));
        assert_eq!(outcome.skipped[1].position, Position::new(9, 5));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let members = members();
        let rules = ScanRules::default();
        assert_eq!(classify(&members, &rules), classify(&members, &rules));
    }

    #[test]
    fn test_exact_matching_ignores_detailed_modifiers() {
        let members = vec![Member::from(Property {
            modifiers: vec![Modifier::with_detail("private", "set")],
            ..Property::new("count", "Int").settable()
        })];
        assert!(classify(&members, &ScanRules::default()).is_empty());
        assert_eq!(classify(&members, &ScanRules::substring()).instance_properties.len(), 1);
    }

    #[test]
    fn test_substring_matching() {
        let rules = ScanRules::substring();
        assert!(rules.qualifies(&[Modifier::new("fileprivate")]));
        assert!(!rules.is_static(&[Modifier::new("class")]));

        let exact = ScanRules::default();
        assert!(exact.is_static(&[Modifier::new("class")]));
        assert!(!exact.qualifies(&[Modifier::new("privateish")]));
    }

    #[test]
    fn test_conditional_blocks_always_reported() {
        let members = vec![Member::from(UnsupportedMember::new(
            UnsupportedKind::ConditionalBlock,
            None,
            Vec::new(),
            Position::default(),
        ))];
        let outcome = scan(&members, &ScanRules::default());
        assert_eq!(
            outcome.skipped[0].reason,
            SkipReason::Unsupported(UnsupportedKind::ConditionalBlock)
        );
    }
}
