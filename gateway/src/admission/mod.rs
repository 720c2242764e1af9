//! Admission control for the upload and delete endpoints
//!
//! Every request passes through [`AdmissionPipeline`] before any storage call
//! is made. Checks run in a fixed order and stop at the first failure:
//! authentication, batch structure, then quota. A refused batch never spends
//! quota.

mod credentials;
mod error;
mod identity;
mod policy;
mod quota;

use std::sync::Arc;

use axum::http::HeaderMap;

pub use credentials::{bearer_token, ApiSecret, CredentialValidator};
pub use error::AdmissionDenied;
pub use identity::{ClientIdentity, FORWARDED_FOR_HEADER, UNKNOWN_CLIENT};
pub use policy::{AuthPolicy, AuthenticatedQuota, RoutePolicies};
pub use quota::{QuotaTracker, QUOTA_CEILING};

use crate::media_storage::UploadFile;

/// Maximum number of files in one upload batch
pub const MAX_FILES_PER_BATCH: usize = 10;

/// Maximum size of a single uploaded file in bytes (5 MiB)
pub const MAX_FILE_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// Outcome of an admission check
pub type AdmissionDecision = Result<(), AdmissionDenied>;

/// Who is making a request, resolved once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Quota bucket the request is charged to
    pub identity: ClientIdentity,
    /// Whether the request carried the configured bearer credential
    pub authenticated: bool,
}

/// Ordered authentication, structural and quota checks
#[derive(Debug)]
pub struct AdmissionPipeline {
    credentials: CredentialValidator,
    quota: Arc<QuotaTracker>,
    authenticated_quota: AuthenticatedQuota,
}

impl AdmissionPipeline {
    /// Creates a pipeline over the given validator and ledger
    #[must_use]
    pub const fn new(
        credentials: CredentialValidator,
        quota: Arc<QuotaTracker>,
        authenticated_quota: AuthenticatedQuota,
    ) -> Self {
        Self {
            credentials,
            quota,
            authenticated_quota,
        }
    }

    /// Resolves the caller's identity and authentication state from request headers
    #[must_use]
    pub fn caller(&self, headers: &HeaderMap) -> Caller {
        Caller {
            identity: ClientIdentity::from_headers(headers),
            authenticated: self.credentials.is_authenticated(headers),
        }
    }

    /// Authentication step alone
    ///
    /// # Errors
    ///
    /// Returns `AdmissionDenied::Unauthorized` when the policy is strict and
    /// the caller is not authenticated
    #[allow(clippy::unused_self)]
    pub fn authorize(&self, caller: &Caller, policy: AuthPolicy) -> AdmissionDecision {
        match policy {
            AuthPolicy::Strict if !caller.authenticated => Err(AdmissionDenied::Unauthorized),
            _ => Ok(()),
        }
    }

    /// Runs every check for an upload batch, reserving quota on success
    ///
    /// # Errors
    ///
    /// Returns the first failed check, in order: `Unauthorized`, `NoFiles`,
    /// `TooManyFiles`, `FileTooLarge`, `QuotaExceeded`
    pub fn admit_upload(
        &self,
        caller: &Caller,
        files: &[UploadFile],
        policy: AuthPolicy,
    ) -> AdmissionDecision {
        self.admit_outline(caller, &BatchOutline::of(files), policy)
    }

    /// Same checks as [`Self::admit_upload`], over a batch whose parts may not
    /// all have been buffered
    ///
    /// # Errors
    ///
    /// Returns the first failed check, in order: `Unauthorized`, `NoFiles`,
    /// `TooManyFiles`, `FileTooLarge`, `QuotaExceeded`
    pub fn admit_outline(
        &self,
        caller: &Caller,
        outline: &BatchOutline,
        policy: AuthPolicy,
    ) -> AdmissionDecision {
        self.authorize(caller, policy)?;
        validate_outline(outline)?;

        if self.charges_quota(caller) {
            let cost = u32::try_from(outline.file_count).unwrap_or(u32::MAX);
            if !self.quota.try_reserve(&caller.identity, cost) {
                return Err(AdmissionDenied::QuotaExceeded {
                    attempted: outline.file_count,
                    allowed: self.quota.ceiling(),
                });
            }
            tracing::debug!(
                client = %caller.identity,
                cost,
                remaining = self.quota.remaining(&caller.identity),
                "Reserved upload quota"
            );
        }

        Ok(())
    }

    /// Checks a delete request; deletes always require authentication
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for unauthenticated callers and
    /// `MissingPublicUrl` when no URL was supplied
    pub fn admit_delete(&self, caller: &Caller, public_url: Option<&str>) -> AdmissionDecision {
        self.authorize(caller, AuthPolicy::Strict)?;

        match public_url {
            Some(url) if !url.trim().is_empty() => Ok(()),
            _ => Err(AdmissionDenied::MissingPublicUrl),
        }
    }

    /// Quota the caller has left
    #[must_use]
    pub fn remaining(&self, caller: &Caller) -> u32 {
        self.quota.remaining(&caller.identity)
    }

    /// Ceiling applied to every identity
    #[must_use]
    pub fn quota_ceiling(&self) -> u32 {
        self.quota.ceiling()
    }

    const fn charges_quota(&self, caller: &Caller) -> bool {
        !caller.authenticated || matches!(self.authenticated_quota, AuthenticatedQuota::Limited)
    }
}

/// What the structural checks need to know about a batch
///
/// Built either from buffered files or while streaming a form, where parts
/// past the limits are counted but never held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutline {
    /// Number of file parts sent
    pub file_count: usize,
    /// Name of the first file over [`MAX_FILE_SIZE_BYTES`]
    pub oversized: Option<String>,
}

impl BatchOutline {
    /// Outline of fully buffered files
    #[must_use]
    pub fn of(files: &[UploadFile]) -> Self {
        Self {
            file_count: files.len(),
            oversized: files
                .iter()
                .find(|file| file.size() > MAX_FILE_SIZE_BYTES)
                .map(|file| file.name.clone()),
        }
    }
}

/// Structural checks on a batch: non-empty, bounded count, bounded file size
///
/// # Errors
///
/// Returns `NoFiles`, `TooManyFiles` or `FileTooLarge` naming the first offending file
pub fn validate_batch(files: &[UploadFile]) -> AdmissionDecision {
    validate_outline(&BatchOutline::of(files))
}

/// Structural checks on an outline, in the same order as [`validate_batch`]
///
/// # Errors
///
/// Returns `NoFiles`, `TooManyFiles` or `FileTooLarge`
pub fn validate_outline(outline: &BatchOutline) -> AdmissionDecision {
    if outline.file_count == 0 {
        return Err(AdmissionDenied::NoFiles);
    }

    if outline.file_count > MAX_FILES_PER_BATCH {
        return Err(AdmissionDenied::TooManyFiles {
            max: MAX_FILES_PER_BATCH,
        });
    }

    if let Some(name) = &outline.oversized {
        return Err(AdmissionDenied::FileTooLarge { name: name.clone() });
    }

    Ok(())
}
