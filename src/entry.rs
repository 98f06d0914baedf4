//! The unit of ordering: a scored member.

use std::cmp::Ordering;

/// A `(score, member)` pair. Pairs order by score ascending, with ties broken
/// by member bytes ascending. A list only ever stores finite scores, and
/// lookups compare scores with exact floating-point equality.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub score: f64,
    pub member: String,
}

impl Entry {
    /// Create an entry. Validation happens at insertion, not here.
    pub fn new(score: f64, member: impl Into<String>) -> Entry {
        return Entry {
            score,
            member: member.into(),
        };
    }

    /// Compare this entry against a search key.
    pub fn key_cmp(&self, score: f64, member: &str) -> Ordering {
        if self.score < score {
            return Ordering::Less;
        }
        if self.score > score {
            return Ordering::Greater;
        }
        return self.member.as_str().cmp(member);
    }

    /// True when this entry sorts strictly before the search key.
    pub fn precedes(&self, score: f64, member: &str) -> bool {
        return self.key_cmp(score, member) == Ordering::Less;
    }

    /// Exact match: bit-for-bit equal score (finite, so `==` is total) and
    /// identical member.
    pub fn matches(&self, score: f64, member: &str) -> bool {
        return self.score == score && self.member == member;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_score_first() {
        let a = Entry::new(1.0, "z");
        assert_eq!(a.key_cmp(2.0, "a"), Ordering::Less);
        assert_eq!(a.key_cmp(0.5, "z"), Ordering::Greater);
    }

    #[test]
    fn ties_break_on_member_bytes() {
        let b = Entry::new(10.0, "B");
        assert_eq!(b.key_cmp(10.0, "A"), Ordering::Greater);
        assert_eq!(b.key_cmp(10.0, "B"), Ordering::Equal);
        assert_eq!(b.key_cmp(10.0, "C"), Ordering::Less);
    }

    #[test]
    fn matches_needs_exact_score() {
        let e = Entry::new(1.5, "m");
        assert!(e.matches(1.5, "m"));
        assert!(!e.matches(1.5 + f64::EPSILON, "m"));
        assert!(!e.matches(1.5, "n"));
    }
}
