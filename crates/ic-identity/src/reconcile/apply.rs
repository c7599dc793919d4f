//! Applying a computed delta against the store.
//!
//! Mutations run one at a time in a fixed order: role grants, claim
//! additions, role revocations, claim removals. Nothing is rolled back; the
//! report says exactly which mutations landed.

use std::fmt;

use ic_config::ReconcileConfig;

use super::delta::Delta;
use crate::claim::Claim;
use crate::shared::error::{IdentityError, Result};
use crate::store::{PrincipalKind, PrincipalStore};

/// A single store call produced by a delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    GrantRole(String),
    AddClaim(Claim),
    RevokeRole(String),
    RemoveClaim(Claim),
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GrantRole(role) => write!(f, "grant role '{}'", role),
            Self::AddClaim(c) => write!(f, "add claim '{}' = '{}'", c.claim_type, c.value),
            Self::RevokeRole(role) => write!(f, "revoke role '{}'", role),
            Self::RemoveClaim(c) => write!(f, "remove claim '{}' = '{}'", c.claim_type, c.value),
        }
    }
}

/// Order the deltas into the mutations to run.
pub fn plan(roles: Option<&Delta<String>>, claims: &Delta<Claim>) -> Vec<Mutation> {
    let mut mutations = Vec::new();
    if let Some(roles) = roles {
        mutations.extend(roles.to_add.iter().cloned().map(Mutation::GrantRole));
    }
    mutations.extend(claims.to_add.iter().cloned().map(Mutation::AddClaim));
    if let Some(roles) = roles {
        mutations.extend(roles.to_remove.iter().cloned().map(Mutation::RevokeRole));
    }
    mutations.extend(claims.to_remove.iter().cloned().map(Mutation::RemoveClaim));
    mutations
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyPolicy {
    /// Keep going past rejected mutations and report them all
    #[default]
    ContinueOnError,
    StopOnFirstError,
}

impl From<&ReconcileConfig> for ApplyPolicy {
    fn from(config: &ReconcileConfig) -> Self {
        if config.stop_on_first_error {
            Self::StopOnFirstError
        } else {
            Self::ContinueOnError
        }
    }
}

#[derive(Debug)]
pub struct ApplyFailure {
    pub mutation: Mutation,
    pub error: IdentityError,
}

impl ApplyFailure {
    /// `"<mutation>: <store reason>"`
    pub fn describe(&self) -> String {
        let reason = match &self.error {
            IdentityError::ValidationFailed { message } => message.clone(),
            other => other.to_string(),
        };
        format!("{}: {}", self.mutation, reason)
    }

    fn is_rejection(&self) -> bool {
        matches!(self.error, IdentityError::ValidationFailed { .. })
    }
}

#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: Vec<Mutation>,
    pub failures: Vec<ApplyFailure>,
    /// Planned but never attempted because the run stopped early
    pub skipped: Vec<Mutation>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn applied_descriptions(&self) -> Vec<String> {
        self.applied.iter().map(ToString::to_string).collect()
    }

    /// Turn failures into the caller-facing error.
    ///
    /// Any failure after at least one success is `PartialApply`. With no
    /// success a single failure is returned as is; several store rejections
    /// are merged into one `ValidationFailed`.
    pub fn into_result(mut self) -> Result<ApplyReport> {
        if self.failures.is_empty() {
            return Ok(self);
        }

        if !self.applied.is_empty() {
            return Err(IdentityError::PartialApply {
                applied: self.applied.len(),
                failed: self.failures.iter().map(ApplyFailure::describe).collect(),
            });
        }

        if self.failures.len() == 1 {
            return Err(self.failures.remove(0).error);
        }

        if let Some(index) = self.failures.iter().position(|f| !f.is_rejection()) {
            return Err(self.failures.remove(index).error);
        }

        let reasons: Vec<String> = self.failures.iter().map(ApplyFailure::describe).collect();
        Err(IdentityError::validation(reasons.join("; ")))
    }
}

/// Run mutations in order against one principal.
///
/// Store rejections (`ValidationFailed`) are recorded and, under
/// [`ApplyPolicy::ContinueOnError`], the run moves on to the next mutation.
/// Any other error stops the run.
pub async fn apply(
    store: &dyn PrincipalStore,
    kind: PrincipalKind,
    principal_id: &str,
    mutations: Vec<Mutation>,
    policy: ApplyPolicy,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut pending = mutations.into_iter();

    while let Some(mutation) = pending.next() {
        match run(store, kind, principal_id, &mutation).await {
            Ok(()) => report.applied.push(mutation),
            Err(error) => {
                let failure = ApplyFailure { mutation, error };
                let stop = !failure.is_rejection() || policy == ApplyPolicy::StopOnFirstError;
                report.failures.push(failure);
                if stop {
                    report.skipped.extend(pending.by_ref());
                    break;
                }
            }
        }
    }

    report
}

async fn run(
    store: &dyn PrincipalStore,
    kind: PrincipalKind,
    principal_id: &str,
    mutation: &Mutation,
) -> Result<()> {
    match (mutation, kind) {
        (Mutation::GrantRole(role), PrincipalKind::User) => store.add_to_role(principal_id, role).await,
        (Mutation::RevokeRole(role), PrincipalKind::User) => store.remove_from_role(principal_id, role).await,
        (Mutation::GrantRole(_) | Mutation::RevokeRole(_), PrincipalKind::Role) => {
            Err(IdentityError::validation("Roles cannot hold role memberships"))
        }
        (Mutation::AddClaim(claim), _) => store.add_claim(kind, principal_id, claim).await,
        (Mutation::RemoveClaim(claim), _) => store.remove_claim(kind, principal_id, claim).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::delta::{reconcile_claims, reconcile_roles};

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_order() {
        let roles = reconcile_roles(&names(&["Admin"]), &names(&["Editor"]));
        let claims = reconcile_claims(&[Claim::new("t", "old")], &[Claim::new("t", "new")]);

        let planned = plan(Some(&roles), &claims);
        assert_eq!(
            planned,
            vec![
                Mutation::GrantRole("Editor".to_string()),
                Mutation::AddClaim(Claim::new("t", "new")),
                Mutation::RevokeRole("Admin".to_string()),
                Mutation::RemoveClaim(Claim::new("t", "old")),
            ]
        );
    }

    #[test]
    fn test_plan_without_roles() {
        let claims = reconcile_claims(&[], &[Claim::new("t", "v")]);
        assert_eq!(plan(None, &claims), vec![Mutation::AddClaim(Claim::new("t", "v"))]);
    }

    #[test]
    fn test_clean_report_passes_through() {
        let report = ApplyReport {
            applied: vec![Mutation::GrantRole("A".to_string())],
            ..Default::default()
        };
        let report = report.into_result().unwrap();
        assert_eq!(report.applied_descriptions(), vec!["grant role 'A'"]);
    }

    #[test]
    fn test_partial_apply() {
        let report = ApplyReport {
            applied: vec![Mutation::GrantRole("A".to_string())],
            failures: vec![ApplyFailure {
                mutation: Mutation::GrantRole("Ghost".to_string()),
                error: IdentityError::validation("Role 'Ghost' does not exist"),
            }],
            skipped: vec![],
        };
        match report.into_result() {
            Err(IdentityError::PartialApply { applied, failed }) => {
                assert_eq!(applied, 1);
                assert_eq!(failed, vec!["grant role 'Ghost': Role 'Ghost' does not exist"]);
            }
            other => panic!("expected PartialApply, got {:?}", other),
        }
    }

    #[test]
    fn test_nothing_applied_merges_rejections() {
        let report = ApplyReport {
            applied: vec![],
            failures: vec![
                ApplyFailure {
                    mutation: Mutation::GrantRole("X".to_string()),
                    error: IdentityError::validation("no X"),
                },
                ApplyFailure {
                    mutation: Mutation::GrantRole("Y".to_string()),
                    error: IdentityError::validation("no Y"),
                },
            ],
            skipped: vec![],
        };
        match report.into_result() {
            Err(IdentityError::ValidationFailed { message }) => {
                assert_eq!(message, "grant role 'X': no X; grant role 'Y': no Y");
            }
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_single_failure_keeps_its_kind() {
        let report = ApplyReport {
            applied: vec![],
            failures: vec![ApplyFailure {
                mutation: Mutation::AddClaim(Claim::new("t", "v")),
                error: IdentityError::not_found("User", "u-1"),
            }],
            skipped: vec![],
        };
        assert!(matches!(report.into_result(), Err(IdentityError::NotFound { .. })));
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = ReconcileConfig::default();
        assert_eq!(ApplyPolicy::from(&config), ApplyPolicy::ContinueOnError);
        config.stop_on_first_error = true;
        assert_eq!(ApplyPolicy::from(&config), ApplyPolicy::StopOnFirstError);
    }
}
