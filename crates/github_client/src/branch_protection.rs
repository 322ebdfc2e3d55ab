//! Branch protection domain types.
//!
//! GitHub uses different shapes for reading and writing branch protection, so the two are
//! modelled separately:
//!
//! - [`ProtectionState`] is the observed configuration returned by
//!   `GET /repos/{owner}/{repo}/branches/{branch}/protection`. Every block may be present,
//!   explicitly `null`, or missing from the payload entirely.
//! - [`ProtectionDefinition`] is the desired configuration sent with
//!   `PUT /repos/{owner}/{repo}/branches/{branch}/protection`. The endpoint requires
//!   `required_status_checks`, `enforce_admins` and `restrictions` to be sent, using `null`
//!   to disable a block, and disables dismissal restrictions with an empty object.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;

/// A field that can be missing, explicitly `null`, or carry a value.
///
/// Use with `#[serde(default)]` so that a missing key decodes to [`Presence::Absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence<T> {
    Absent,
    Null,
    Present(T),
}

impl<T> Presence<T> {
    pub fn as_present(&self) -> Option<&T> {
        match self {
            Presence::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Presence::Null)
    }
}

impl<T> Default for Presence<T> {
    fn default() -> Self {
        Presence::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Presence<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Presence::Present(value),
            None => Presence::Null,
        })
    }
}

impl<T: Serialize> Serialize for Presence<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Presence::Present(value) => value.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

/// A user reference inside an observed protection block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRef {
    pub login: String,
}

/// A team reference inside an observed protection block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TeamRef {
    pub slug: String,
}

/// Observed required status checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusChecksState {
    /// Require branches to be up to date before merging
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// Observed dismissal restrictions of pull request reviews.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DismissalRestrictionsState {
    #[serde(default)]
    pub users: Vec<UserRef>,
    #[serde(default)]
    pub teams: Vec<TeamRef>,
}

/// Observed required pull request reviews.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PullRequestReviewsState {
    #[serde(default, skip_serializing_if = "Presence::is_absent")]
    pub dismissal_restrictions: Presence<DismissalRestrictionsState>,
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
}

/// Observed admin enforcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnforceAdminsState {
    #[serde(default)]
    pub enabled: bool,
}

/// Observed push restrictions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RestrictionsState {
    #[serde(default)]
    pub users: Vec<UserRef>,
    #[serde(default)]
    pub teams: Vec<TeamRef>,
}

/// The protection configuration GitHub reports for a branch.
///
/// # Examples
///
/// ```rust
/// use github_client::ProtectionState;
///
/// let state: ProtectionState = serde_json::from_str(
///     r#"{"required_status_checks": {"strict": true, "contexts": ["ci/build"]}}"#,
/// ).unwrap();
///
/// assert!(state.has_strict_status_checks());
/// assert!(state.restrictions.is_absent());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtectionState {
    #[serde(default, skip_serializing_if = "Presence::is_absent")]
    pub required_status_checks: Presence<StatusChecksState>,

    #[serde(default, skip_serializing_if = "Presence::is_absent")]
    pub required_pull_request_reviews: Presence<PullRequestReviewsState>,

    #[serde(default, skip_serializing_if = "Presence::is_absent")]
    pub enforce_admins: Presence<EnforceAdminsState>,

    #[serde(default, skip_serializing_if = "Presence::is_absent")]
    pub restrictions: Presence<RestrictionsState>,
}

impl ProtectionState {
    /// Returns true when required status checks exist and are marked strict.
    pub fn has_strict_status_checks(&self) -> bool {
        self.required_status_checks
            .as_present()
            .is_some_and(|checks| checks.strict)
    }
}

/// Desired required status checks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusChecksDefinition {
    pub strict: bool,
    pub contexts: Vec<String>,
}

/// Desired dismissal restrictions. `Disabled` is written as `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DismissalRestrictions {
    Restricted {
        users: Vec<String>,
        teams: Vec<String>,
    },
    Disabled {},
}

/// Desired required pull request reviews.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PullRequestReviewsDefinition {
    pub dismissal_restrictions: DismissalRestrictions,
    pub dismiss_stale_reviews: bool,
}

/// Desired push restrictions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RestrictionsDefinition {
    pub users: Vec<String>,
    pub teams: Vec<String>,
}

/// The protection configuration written to a branch with a full replace.
///
/// `None` blocks are serialized as `null`, which disables them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtectionDefinition {
    pub required_status_checks: Option<StatusChecksDefinition>,
    pub required_pull_request_reviews: Option<PullRequestReviewsDefinition>,
    pub enforce_admins: bool,
    pub restrictions: Option<RestrictionsDefinition>,
}

/// Body of the partial update of the required status checks sub-resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusChecksPatch {
    pub strict: bool,
}
