//! Dotted artifact versions with an optional qualifier
//!
//! A version is `major.minor.incremental` followed by an optional qualifier
//! (`1.2.3-SNAPSHOT`, `3.0.0-beta.16`). Missing numeric components default to
//! zero, so `2.4` and `2.4.0` compare equal. A release (no qualifier) sorts
//! above every qualified version with the same numbers.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::model::error::ModelError;

const SNAPSHOT: &str = "SNAPSHOT";

#[derive(Debug, Clone)]
pub struct Version {
    major: u64,
    minor: u64,
    incremental: u64,
    /// Numeric components past the third, trailing zeros removed
    tail: Vec<u64>,
    qualifier: Option<String>,
    raw: String,
}

impl Version {
    /// Parse a version string.
    ///
    /// The numeric prefix ends at the first character that is neither a digit
    /// nor a dot; everything after it (minus a leading `-` or `.`) is the
    /// qualifier. Numeric components past the third are kept and compared
    /// after the incremental, so `1.2.3.4` sorts above `1.2.3`. Only an empty
    /// string or a numeric component that does not fit in a `u64` is rejected.
    ///
    /// Examples:
    /// - "2.4" -> (2, 4, 0, None)
    /// - "1.2.3-SNAPSHOT" -> (1, 2, 3, "SNAPSHOT")
    /// - "3.0.0-beta.16" -> (3, 0, 0, "beta.16")
    pub fn parse(version: &str) -> Result<Self, ModelError> {
        let raw = version.trim();
        if raw.is_empty() {
            return Err(ModelError::MalformedVersion(version.to_string()));
        }

        let boundary = raw
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(raw.len());
        let (numeric, rest) = raw.split_at(boundary);
        let rest = rest.trim_start_matches(['-', '.']);

        let mut numbers: Vec<u64> = Vec::new();
        for part in numeric.trim_end_matches('.').split('.') {
            let number = if part.is_empty() {
                0
            } else {
                part.parse()
                    .map_err(|_| ModelError::MalformedVersion(version.to_string()))?
            };
            numbers.push(number);
        }
        numbers.resize(numbers.len().max(3), 0);
        let mut tail = numbers.split_off(3);
        while tail.last() == Some(&0) {
            tail.pop();
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            incremental: numbers[2],
            tail,
            qualifier: (!rest.is_empty()).then(|| rest.to_string()),
            raw: raw.to_string(),
        })
    }

    /// Extract the version from an artifact file name such as
    /// `appui-1.2-SNAPSHOT.omod` or `openmrs-2.6.0.war`.
    pub fn from_file_name(file_name: &str) -> Result<Self, ModelError> {
        let stem = file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_name);
        let parts: Vec<&str> = stem.split('-').collect();

        let version = match parts.as_slice() {
            [.., number, last] if file_name.contains(SNAPSHOT) => format!("{number}-{last}"),
            [.., last] => last.to_string(),
            [] => String::new(),
        };
        Self::parse(&version)
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn incremental(&self) -> u64 {
        self.incremental
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// The version exactly as it was written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_snapshot(&self) -> bool {
        self.qualifier
            .as_deref()
            .is_some_and(|q| q.to_ascii_uppercase().contains(SNAPSHOT))
    }

    pub fn is_alpha(&self) -> bool {
        self.qualifier
            .as_deref()
            .is_some_and(|q| q.to_ascii_lowercase().contains("alpha"))
    }

    pub fn is_beta(&self) -> bool {
        self.qualifier
            .as_deref()
            .is_some_and(|q| q.to_ascii_lowercase().contains("beta"))
    }

    pub fn is_release(&self) -> bool {
        self.qualifier.is_none()
    }

    /// Same numeric components, qualifier ignored
    pub fn same_numbers(&self, other: &Version) -> bool {
        self.numbers() == other.numbers() && self.tail == other.tail
    }

    /// Equal numbers and both snapshots: nominally unchanged, but the build
    /// behind it may have been replaced.
    pub fn is_equal_snapshot_of(&self, other: &Version) -> bool {
        self.same_numbers(other) && self.is_snapshot() && other.is_snapshot()
    }

    fn numbers(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.incremental)
    }
}

/// Rank of a qualifier among pre-releases; a release ranks above all of them.
fn qualifier_rank(qualifier: Option<&str>) -> u8 {
    let Some(qualifier) = qualifier else {
        return 6;
    };
    let lower = qualifier.to_ascii_lowercase();
    if lower.contains("snapshot") {
        4
    } else if lower.starts_with("alpha") || lower == "a" {
        0
    } else if lower.starts_with("beta") || lower == "b" {
        1
    } else if lower.starts_with("milestone") || lower == "m" {
        2
    } else if lower.starts_with("rc") || lower.starts_with("cr") {
        3
    } else {
        5
    }
}

fn trailing_number(qualifier: &str) -> u64 {
    let digits = qualifier.bytes().rev().take_while(u8::is_ascii_digit).count();
    qualifier[qualifier.len() - digits..].parse().unwrap_or(0)
}

fn compare_qualifiers(a: Option<&str>, b: Option<&str>) -> Ordering {
    qualifier_rank(a)
        .cmp(&qualifier_rank(b))
        .then_with(|| match (a, b) {
            (Some(a), Some(b)) => trailing_number(a)
                .cmp(&trailing_number(b))
                .then_with(|| a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())),
            _ => Ordering::Equal,
        })
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers()
            .cmp(&other.numbers())
            .then_with(|| self.tail.cmp(&other.tail))
            .then_with(|| compare_qualifiers(self.qualifier(), other.qualifier()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numbers().hash(state);
        self.tail.hash(state);
        self.qualifier
            .as_ref()
            .map(|q| q.to_ascii_lowercase())
            .hash(state);
    }
}

impl FromStr for Version {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[rstest]
    #[case("2.4", (2, 4, 0), None)]
    #[case("1", (1, 0, 0), None)]
    #[case("1.2.3-SNAPSHOT", (1, 2, 3), Some("SNAPSHOT"))]
    #[case("3.0.0-beta.16", (3, 0, 0), Some("beta.16"))]
    #[case("1.0.0.RELEASE", (1, 0, 0), Some("RELEASE"))]
    #[case("1.2.3.4", (1, 2, 3), None)]
    #[case("1.2.3.4-SNAPSHOT", (1, 2, 3), Some("SNAPSHOT"))]
    #[case("next", (0, 0, 0), Some("next"))]
    fn parse_splits_numbers_and_qualifier(
        #[case] input: &str,
        #[case] numbers: (u64, u64, u64),
        #[case] qualifier: Option<&str>,
    ) {
        let version = v(input);
        assert_eq!(
            (version.major(), version.minor(), version.incremental()),
            numbers
        );
        assert_eq!(version.qualifier(), qualifier);
        assert_eq!(version.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("99999999999999999999999.1")]
    fn parse_rejects_malformed_input(#[case] input: &str) {
        assert!(matches!(
            Version::parse(input),
            Err(ModelError::MalformedVersion(_))
        ));
    }

    #[rstest]
    #[case("2.4", "2.4.0", Ordering::Equal)]
    #[case("1.2.3", "1.2.4", Ordering::Less)]
    #[case("1.10", "1.9.9", Ordering::Greater)]
    #[case("1.2.3", "1.2.3-SNAPSHOT", Ordering::Greater)]
    #[case("1.2.3-SNAPSHOT", "1.2.3-rc1", Ordering::Greater)]
    #[case("1.2.3-beta", "1.2.3-alpha", Ordering::Greater)]
    #[case("3.0.0-beta.16", "3.0.0-beta.9", Ordering::Greater)]
    #[case("1.2.3-SNAPSHOT", "1.2.3-snapshot", Ordering::Equal)]
    #[case("2.0.0-alpha", "1.9.9", Ordering::Greater)]
    #[case("1.2.3.4", "1.2.3", Ordering::Greater)]
    #[case("1.2.3.4", "1.2.4", Ordering::Less)]
    #[case("1.2.3.0", "1.2.3", Ordering::Equal)]
    #[case("1.2.3.4", "1.2.3.4-SNAPSHOT", Ordering::Greater)]
    #[case("1.2.3.10", "1.2.3.9", Ordering::Greater)]
    #[case("1.0-é", "1.0-x", Ordering::Greater)]
    #[case("1.0-é2", "1.0-ü1", Ordering::Greater)]
    #[case("1.0-日本", "1.0-日本", Ordering::Equal)]
    fn compare_orders_versions(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(v(a).cmp(&v(b)), expected);
        assert_eq!(v(b).cmp(&v(a)), expected.reverse());
    }

    #[test]
    fn compare_is_transitive_over_mixed_qualifiers() {
        let mut versions: Vec<Version> = [
            "1.0", "1.0-SNAPSHOT", "1.0-alpha", "1.0-beta-2", "1.0-rc1", "0.9", "1.0.1",
            "1.0-custom",
        ]
        .into_iter()
        .map(v)
        .collect();
        versions.sort();

        for window in versions.windows(2) {
            assert!(window[0] <= window[1]);
        }
        for a in &versions {
            for b in &versions {
                for c in &versions {
                    if a <= b && b <= c {
                        assert!(a <= c, "{a} <= {b} <= {c}");
                    }
                }
            }
        }
    }

    #[rstest]
    #[case("1.2.3-SNAPSHOT", true, false, false)]
    #[case("1.2.3-snapshot", true, false, false)]
    #[case("2.0.0-alpha.1", false, true, false)]
    #[case("2.0.0-BETA", false, false, true)]
    #[case("2.0.0", false, false, false)]
    #[case("1.2.3.4", false, false, false)]
    fn classifies_qualifiers(
        #[case] input: &str,
        #[case] snapshot: bool,
        #[case] alpha: bool,
        #[case] beta: bool,
    ) {
        let version = v(input);
        assert_eq!(version.is_snapshot(), snapshot);
        assert_eq!(version.is_alpha(), alpha);
        assert_eq!(version.is_beta(), beta);
    }

    #[test]
    fn four_part_versions_are_releases() {
        assert!(v("1.2.3.4").is_release());
        assert!(!v("1.2.3.4-SNAPSHOT").is_release());
        assert!(v("1.2.3.4-SNAPSHOT").is_equal_snapshot_of(&v("1.2.3.4-SNAPSHOT")));
        assert!(!v("1.2.3.4-SNAPSHOT").is_equal_snapshot_of(&v("1.2.3.5-SNAPSHOT")));
    }

    #[test]
    fn equal_snapshots_compare_equal_but_are_flagged() {
        let a = v("1.2.3-SNAPSHOT");
        let b = v("1.2.3-SNAPSHOT");
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert!(a.is_equal_snapshot_of(&b));
        assert!(!v("1.2.3").is_equal_snapshot_of(&v("1.2.3")));
    }

    #[rstest]
    #[case("appui-1.2-SNAPSHOT.omod", "1.2-SNAPSHOT")]
    #[case("openmrs-2.6.0.war", "2.6.0")]
    #[case("webservices.rest-2.40.0.omod", "2.40.0")]
    fn from_file_name_extracts_version(#[case] file: &str, #[case] expected: &str) {
        assert_eq!(Version::from_file_name(file).unwrap().as_str(), expected);
    }
}
