//! License condition vocabulary and bitmask condition sets.
//!
//! The vocabulary is closed: every condition name a metadata file may declare
//! maps to exactly one bit, assigned once here. All set operations are single
//! integer instructions, which keeps the propagation policy branch-free on
//! the hot path.

use std::fmt;

/// A recognized license condition.
///
/// The discriminant is the condition's bit in [`LicenseConditionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum LicenseCondition {
    /// Public domain or public-domain-like license with no obligations.
    Unencumbered = 0x0001,
    /// Permissive license with no notice requirement (e.g. BSD-0).
    Permissive = 0x0002,
    /// Notice obligation (e.g. Apache-2.0, BSD, MIT).
    Notice = 0x0004,
    /// The source of the licensed artifact itself must be shared (e.g. MPL).
    Reciprocal = 0x0008,
    /// Source sharing extends to surrounding artifacts (e.g. GPL).
    Restricted = 0x0010,
    /// Restricted, except artifacts linking dynamically (e.g. LGPL).
    RestrictedAllowsDynamicLinking = 0x0020,
    /// Restricted, except independent modules (e.g. GPL w/ classpath exception).
    RestrictedWithClasspathException = 0x0040,
    /// Restricted only when consumed through static linkage.
    RestrictedIfStaticallyLinked = 0x0080,
    /// Legacy weaker-copyleft marker retained for old metadata.
    WeaklyRestricted = 0x0100,
    /// Usable only under a case-by-case exception grant.
    ByExceptionOnly = 0x0200,
    /// Not usable at all; tracked so reports can flag it.
    NotAllowed = 0x0400,
    /// Proprietary first- or third-party license.
    Proprietary = 0x0800,
}

/// All recognized conditions in bit order.
pub const RECOGNIZED_CONDITIONS: [LicenseCondition; 12] = [
    LicenseCondition::Unencumbered,
    LicenseCondition::Permissive,
    LicenseCondition::Notice,
    LicenseCondition::Reciprocal,
    LicenseCondition::Restricted,
    LicenseCondition::RestrictedAllowsDynamicLinking,
    LicenseCondition::RestrictedWithClasspathException,
    LicenseCondition::RestrictedIfStaticallyLinked,
    LicenseCondition::WeaklyRestricted,
    LicenseCondition::ByExceptionOnly,
    LicenseCondition::NotAllowed,
    LicenseCondition::Proprietary,
];

impl LicenseCondition {
    /// The metadata spelling of the condition.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unencumbered => "unencumbered",
            Self::Permissive => "permissive",
            Self::Notice => "notice",
            Self::Reciprocal => "reciprocal",
            Self::Restricted => "restricted",
            Self::RestrictedAllowsDynamicLinking => "restricted_allows_dynamic_linking",
            Self::RestrictedWithClasspathException => "restricted_with_classpath_exception",
            Self::RestrictedIfStaticallyLinked => "restricted_if_statically_linked",
            Self::WeaklyRestricted => "weakly_restricted",
            Self::ByExceptionOnly => "by_exception_only",
            Self::NotAllowed => "not_allowed",
            Self::Proprietary => "proprietary",
        }
    }

    /// Look up a condition by its metadata spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        RECOGNIZED_CONDITIONS.iter().copied().find(|c| c.name() == name)
    }

    const fn bit(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for LicenseCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of license conditions as a fixed-width bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LicenseConditionSet(u16);

impl LicenseConditionSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// A set holding exactly `condition`.
    pub const fn of(condition: LicenseCondition) -> Self {
        Self(condition.bit())
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of conditions in the set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn contains(self, condition: LicenseCondition) -> bool {
        self.0 & condition.bit() != 0
    }

    pub const fn plus(self, condition: LicenseCondition) -> Self {
        Self(self.0 | condition.bit())
    }

    pub const fn minus(self, condition: LicenseCondition) -> Self {
        Self(self.0 & !condition.bit())
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// True when any condition of `other` is present.
    pub const fn matches_any(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Conditions in the set, in bit order.
    pub fn conditions(self) -> impl Iterator<Item = LicenseCondition> {
        RECOGNIZED_CONDITIONS.into_iter().filter(move |c| self.contains(*c))
    }

    /// Condition names in bit order.
    pub fn names(self) -> Vec<&'static str> {
        self.conditions().map(LicenseCondition::name).collect()
    }

    /// Builds a set from metadata spellings; returns the first unrecognized
    /// name on failure.
    pub fn from_names<'a, I: IntoIterator<Item = &'a str>>(names: I) -> std::result::Result<Self, &'a str> {
        let mut cs = Self::EMPTY;
        for name in names {
            match LicenseCondition::from_name(name) {
                Some(c) => cs = cs.plus(c),
                None => return Err(name),
            }
        }
        Ok(cs)
    }
}

impl fmt::Display for LicenseConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join("|"))
    }
}

impl FromIterator<LicenseCondition> for LicenseConditionSet {
    fn from_iter<I: IntoIterator<Item = LicenseCondition>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::plus)
    }
}

/// Conditions that impose no obligation at all.
pub const IMPLIES_UNENCUMBERED: LicenseConditionSet =
    LicenseConditionSet::of(LicenseCondition::Unencumbered);

/// Permissive conditions without a notice requirement.
pub const IMPLIES_PERMISSIVE: LicenseConditionSet =
    LicenseConditionSet::of(LicenseCondition::Permissive);

/// Every condition trackable as a NOTICE obligation.
pub const IMPLIES_NOTICE: LicenseConditionSet = LicenseConditionSet(
    LicenseCondition::Unencumbered as u16
        | LicenseCondition::Permissive as u16
        | LicenseCondition::Notice as u16
        | LicenseCondition::Reciprocal as u16
        | LicenseCondition::Restricted as u16
        | LicenseCondition::RestrictedAllowsDynamicLinking as u16
        | LicenseCondition::RestrictedWithClasspathException as u16
        | LicenseCondition::RestrictedIfStaticallyLinked as u16
        | LicenseCondition::Proprietary as u16
        | LicenseCondition::ByExceptionOnly as u16,
);

/// Conditions requiring the licensed artifact's own source to be shared.
pub const IMPLIES_RECIPROCAL: LicenseConditionSet =
    LicenseConditionSet::of(LicenseCondition::Reciprocal);

/// The restricted family: every condition whose name starts with `restricted`.
pub const IMPLIES_RESTRICTED: LicenseConditionSet = LicenseConditionSet(
    LicenseCondition::Restricted as u16
        | LicenseCondition::RestrictedAllowsDynamicLinking as u16
        | LicenseCondition::RestrictedWithClasspathException as u16
        | LicenseCondition::RestrictedIfStaticallyLinked as u16,
);

/// Conditions requiring source sharing of some artifact.
pub const IMPLIES_SHARED: LicenseConditionSet =
    IMPLIES_RECIPROCAL.union(IMPLIES_RESTRICTED);

/// Conditions that keep source private.
pub const IMPLIES_PRIVATE: LicenseConditionSet =
    LicenseConditionSet::of(LicenseCondition::Proprietary);

/// Conditions requiring a case-by-case exception grant.
pub const IMPLIES_BY_EXCEPTION_ONLY: LicenseConditionSet = LicenseConditionSet(
    LicenseCondition::ByExceptionOnly as u16 | LicenseCondition::NotAllowed as u16,
);

/// Resolves a condition or implication-group name to the set it selects.
///
/// Bare condition names select their implication group where one exists
/// (`restricted` selects the whole restricted family); `shared` and
/// `private` are accepted as group aliases.
pub fn implication_group(name: &str) -> Option<LicenseConditionSet> {
    match name {
        "unencumbered" => Some(IMPLIES_UNENCUMBERED),
        "permissive" => Some(IMPLIES_PERMISSIVE),
        "notice" => Some(IMPLIES_NOTICE),
        "reciprocal" => Some(IMPLIES_RECIPROCAL),
        "restricted" => Some(IMPLIES_RESTRICTED),
        "shared" => Some(IMPLIES_SHARED),
        "proprietary" | "private" => Some(IMPLIES_PRIVATE),
        "by_exception_only" => Some(IMPLIES_BY_EXCEPTION_ONLY),
        _ => LicenseCondition::from_name(name).map(LicenseConditionSet::of),
    }
}
