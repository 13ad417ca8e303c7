//! Profile snapshots and the compatibility predicate
//!
//! A profile is captured from the join/skip request payload and frozen for
//! the lifetime of that search. It is never linked back to any stored user
//! account; the matchmaking core only ever sees these snapshots.
//!
//! Gender and preference are free-form strings rather than a closed enum so
//! new categories need no code change. The single reserved value is `"any"`,
//! which matches every counterpart on either side of the predicate.

use serde::{Deserialize, Serialize};

/// Wildcard gender/preference value, compatible with everything.
pub const ANY: &str = "any";

fn default_any() -> String {
    ANY.to_string()
}

fn default_name() -> String {
    "Stranger".to_string()
}

fn default_place() -> String {
    "Unknown".to_string()
}

/// Profile snapshot supplied with a join or skip request
///
/// Every field has a placeholder default so a partial (or empty) request
/// payload still yields a usable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name shown to the matched partner
    #[serde(default = "default_name")]
    pub name: String,

    /// Free-text city
    #[serde(default = "default_place")]
    pub city: String,

    /// Free-text country
    #[serde(default = "default_place")]
    pub country: String,

    /// Self-reported gender (free-form, `"any"` if unspecified)
    #[serde(default = "default_any")]
    pub gender: String,

    /// Partner gender this session is looking for (`"any"` = wildcard)
    #[serde(default = "default_any")]
    pub preference: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: default_name(),
            city: default_place(),
            country: default_place(),
            gender: default_any(),
            preference: default_any(),
        }
    }
}

impl Profile {
    /// Create a profile with the given gender and preference, placeholder
    /// name and location. Mostly useful in tests and demos.
    pub fn seeking(gender: impl Into<String>, preference: impl Into<String>) -> Self {
        Self {
            gender: gender.into(),
            preference: preference.into(),
            ..Default::default()
        }
    }

    /// One-directional check: does this profile accept `other`'s gender?
    pub fn accepts(&self, other: &Profile) -> bool {
        self.preference == ANY || self.preference == other.gender
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let profile = Profile::default();

        assert_eq!(profile.name, "Stranger");
        assert_eq!(profile.city, "Unknown");
        assert_eq!(profile.country, "Unknown");
        assert_eq!(profile.gender, ANY);
        assert_eq!(profile.preference, ANY);
    }

    #[test]
    fn test_partial_payload_fills_placeholders() {
        let profile: Profile = serde_json::from_str(r#"{"gender":"male"}"#).unwrap();

        assert_eq!(profile.gender, "male");
        assert_eq!(profile.preference, ANY);
        assert_eq!(profile.name, "Stranger");
    }

    #[test]
    fn test_accepts_wildcard() {
        let any = Profile::seeking("female", ANY);
        let male = Profile::seeking("male", "female");

        assert!(any.accepts(&male));
        assert!(male.accepts(&any));
    }

    #[test]
    fn test_accepts_specific() {
        let a = Profile::seeking("male", "female");
        let b = Profile::seeking("female", "male");
        let c = Profile::seeking("male", "male");

        assert!(a.accepts(&b));
        assert!(b.accepts(&a));
        assert!(!a.accepts(&c));
        assert!(c.accepts(&a));
    }
}
