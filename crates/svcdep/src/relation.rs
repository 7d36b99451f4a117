//! The relationship vocabulary: declared dependency tags and the
//! directions they can be queried in.
//!
//! Service metadata declares relationships with a small closed set of tags
//! ([`DepKind`]). Queries walk those same edges in either direction, so the
//! query vocabulary ([`Relation`]) is each tag twice: once forward (list a
//! service's targets) and once reverse (list the services targeting it).
//! Traversal code never matches on concrete tags; it asks a [`Relation`]
//! for its [`DepKind`] and [`Direction`] and follows edges accordingly, so
//! adding a tag means adding variants and property arms here, nothing more.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A relationship tag as written in a service declaration.
///
/// These are the edge labels of the dependency graph. `provide` targets
/// name virtual services; the provided name becomes an ordinary graph node
/// whether or not a real service declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepKind {
    /// Hard requirement - the target must be available first
    Need,

    /// Soft hint - use the target if it is available
    Use,

    /// Ordering only - this service starts after the target
    After,

    /// Ordering only - this service starts before the target
    Before,

    /// This service supplies the named virtual service
    Provide,
}

impl DepKind {
    /// Every declared tag, in declaration-vocabulary order.
    pub const ALL: [Self; 5] = [
        Self::Need,
        Self::Use,
        Self::After,
        Self::Before,
        Self::Provide,
    ];

    /// The tag as it appears in declarations.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Need => "need",
            Self::Use => "use",
            Self::After => "after",
            Self::Before => "before",
            Self::Provide => "provide",
        }
    }

    /// How a missing target is treated for this tag.
    #[must_use]
    pub fn strength(self) -> Strength {
        match self {
            Self::Need => Strength::Required,
            Self::Use | Self::After | Self::Before | Self::Provide => Strength::Optional,
        }
    }
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "need" => Ok(Self::Need),
            "use" => Ok(Self::Use),
            "after" => Ok(Self::After),
            "before" => Ok(Self::Before),
            "provide" => Ok(Self::Provide),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

/// Whether a tag's missing target is breakage or noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    /// Missing targets are dependency breakage worth reporting
    Required,

    /// Missing targets are silently ignored
    Optional,
}

impl Strength {
    /// Returns `true` if a dangling target of this strength is ignorable.
    #[must_use]
    pub fn ignores_missing(self) -> bool {
        matches!(self, Self::Optional)
    }
}

/// Which way a relation walks the declared edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Listing service S yields S's declared targets
    Forward,

    /// Listing service S yields the services that declared S as a target
    Reverse,
}

/// A queryable relation: a declared tag plus a walking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Targets this service needs
    Need,

    /// Targets this service uses
    Use,

    /// Targets this service orders itself after
    After,

    /// Targets this service orders itself before
    Before,

    /// Virtual services this service provides
    Provide,

    /// Services that need this one
    NeededBy,

    /// Services that use this one
    UsedBy,

    /// Services that order themselves after this one
    AfterMe,

    /// Services that order themselves before this one
    BeforeMe,

    /// Services that provide this virtual name
    ProvidedBy,
}

impl Relation {
    /// Every queryable relation name.
    pub const ALL: [Self; 10] = [
        Self::Need,
        Self::Use,
        Self::After,
        Self::Before,
        Self::Provide,
        Self::NeededBy,
        Self::UsedBy,
        Self::AfterMe,
        Self::BeforeMe,
        Self::ProvidedBy,
    ];

    /// The relation set used when a query names none: hard requirements
    /// plus soft hints, forward.
    pub const DEFAULT: [Self; 2] = [Self::Need, Self::Use];

    /// The declared tag this relation walks.
    #[must_use]
    pub fn kind(self) -> DepKind {
        match self {
            Self::Need | Self::NeededBy => DepKind::Need,
            Self::Use | Self::UsedBy => DepKind::Use,
            Self::After | Self::AfterMe => DepKind::After,
            Self::Before | Self::BeforeMe => DepKind::Before,
            Self::Provide | Self::ProvidedBy => DepKind::Provide,
        }
    }

    /// The direction this relation walks the tag's edges.
    #[must_use]
    pub fn direction(self) -> Direction {
        match self {
            Self::Need | Self::Use | Self::After | Self::Before | Self::Provide => {
                Direction::Forward
            }
            Self::NeededBy | Self::UsedBy | Self::AfterMe | Self::BeforeMe | Self::ProvidedBy => {
                Direction::Reverse
            }
        }
    }

    /// How missing targets of the underlying tag are treated.
    #[must_use]
    pub fn strength(self) -> Strength {
        self.kind().strength()
    }

    /// The relation name accepted by `--type`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Need => "need",
            Self::Use => "use",
            Self::After => "after",
            Self::Before => "before",
            Self::Provide => "provide",
            Self::NeededBy => "needed-by",
            Self::UsedBy => "used-by",
            Self::AfterMe => "after-me",
            Self::BeforeMe => "before-me",
            Self::ProvidedBy => "provided-by",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "need" => Ok(Self::Need),
            "use" => Ok(Self::Use),
            "after" => Ok(Self::After),
            "before" => Ok(Self::Before),
            "provide" => Ok(Self::Provide),
            "needed-by" => Ok(Self::NeededBy),
            "used-by" => Ok(Self::UsedBy),
            "after-me" => Ok(Self::AfterMe),
            "before-me" => Ok(Self::BeforeMe),
            "provided-by" => Ok(Self::ProvidedBy),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

/// A tag or relation name outside the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown relationship tag '{0}'")]
pub struct UnknownTag(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::need("need", DepKind::Need)]
    #[case::use_("use", DepKind::Use)]
    #[case::after("after", DepKind::After)]
    #[case::before("before", DepKind::Before)]
    #[case::provide("provide", DepKind::Provide)]
    fn dep_kind_parses_its_own_name(#[case] text: &str, #[case] expected: DepKind) {
        assert_eq!(text.parse::<DepKind>().unwrap(), expected);
        assert_eq!(expected.as_str(), text);
    }

    #[test]
    fn dep_kind_rejects_unknown_tags() {
        let err = "wants".parse::<DepKind>().unwrap_err();
        assert_eq!(err, UnknownTag("wants".to_string()));
        assert!(err.to_string().contains("wants"));
    }

    #[test]
    fn only_need_is_required() {
        for kind in DepKind::ALL {
            let required = kind.strength() == Strength::Required;
            assert_eq!(required, kind == DepKind::Need);
            assert_eq!(kind.strength().ignores_missing(), !required);
        }
    }

    #[test]
    fn every_relation_roundtrips_through_its_name() {
        for relation in Relation::ALL {
            assert_eq!(relation.as_str().parse::<Relation>().unwrap(), relation);
        }
    }

    #[rstest]
    #[case::forward(Relation::Need, Direction::Forward, DepKind::Need)]
    #[case::reverse(Relation::NeededBy, Direction::Reverse, DepKind::Need)]
    #[case::provide_fwd(Relation::Provide, Direction::Forward, DepKind::Provide)]
    #[case::provide_rev(Relation::ProvidedBy, Direction::Reverse, DepKind::Provide)]
    #[case::order_rev(Relation::BeforeMe, Direction::Reverse, DepKind::Before)]
    fn relation_direction_and_kind(
        #[case] relation: Relation,
        #[case] direction: Direction,
        #[case] kind: DepKind,
    ) {
        assert_eq!(relation.direction(), direction);
        assert_eq!(relation.kind(), kind);
    }

    #[test]
    fn default_set_is_need_then_use() {
        assert_eq!(Relation::DEFAULT, [Relation::Need, Relation::Use]);
    }

    #[test]
    fn kebab_case_snapshot_form() {
        let json = serde_json::to_string(&DepKind::Need).unwrap();
        assert_eq!(json, "\"need\"");

        let parsed: DepKind = serde_json::from_str("\"before\"").unwrap();
        assert_eq!(parsed, DepKind::Before);
    }
}
