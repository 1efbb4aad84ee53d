//! Referral resolution
//!
//! Two concerns live here:
//!
//! - [`ReferralResolver`] turns the opaque referral identifier from an
//!   intake request into a user record. Not-found is non-fatal: the claim
//!   proceeds without a referrer.
//! - [`OrganizationChain`] walks the self-referential `referred_by`
//!   relation into an ordered ancestor list up to a configured depth,
//!   replacing ad-hoc two-level unrolling at each call site.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use core_kernel::{PortError, UserId};

use crate::ports::UserDirectory;
use crate::user::User;

/// Resolves optional referral identifiers from intake requests
pub struct ReferralResolver {
    directory: Arc<dyn UserDirectory>,
}

impl ReferralResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Attempts to resolve a referral code to a user.
    ///
    /// Malformed codes, unknown users, and directory failures all resolve to
    /// `None`; the failure is logged and the intake proceeds unreferred.
    pub async fn resolve(&self, code: &str) -> Option<User> {
        let id = match UserId::from_str(code) {
            Ok(id) => id,
            Err(_) => {
                warn!(code, "referral code is not a valid user id");
                return None;
            }
        };

        match self.directory.find_by_id(id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                warn!(code, "referral code does not match any user");
                None
            }
            Err(e) => {
                warn!(code, error = %e, "referral lookup failed");
                None
            }
        }
    }
}

/// Resolves the upstream ancestor chain of a user
pub struct OrganizationChain {
    directory: Arc<dyn UserDirectory>,
    max_depth: usize,
}

impl OrganizationChain {
    /// Default chain depth. The notification fan-out only ever uses the
    /// first two hops (agent's organizer), but deeper nesting exists in the
    /// field.
    pub const DEFAULT_MAX_DEPTH: usize = 4;

    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Overrides the maximum chain depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the ordered list of ancestors of `id`, nearest first,
    /// stopping at the configured depth, a missing link, or a cycle.
    pub async fn ancestors(&self, id: UserId) -> Result<Vec<User>, PortError> {
        let mut chain = Vec::new();
        let mut seen: HashSet<UserId> = HashSet::from([id]);

        let mut current = match self.directory.find_by_id(id).await? {
            Some(user) => user,
            None => return Err(PortError::not_found("User", id)),
        };

        while chain.len() < self.max_depth {
            let parent_id = match current.referred_by {
                Some(parent_id) => parent_id,
                None => break,
            };
            if !seen.insert(parent_id) {
                warn!(user = %id, "referral chain contains a cycle");
                break;
            }
            match self.directory.find_by_id(parent_id).await? {
                Some(parent) => {
                    chain.push(parent.clone());
                    current = parent;
                }
                // Dangling reference: the upstream account was removed.
                None => break,
            }
        }

        Ok(chain)
    }
}
