use strum::{Display, EnumString};

/// How an endpoint treats requests without a valid credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthPolicy {
    /// Unauthenticated requests are rejected outright
    Strict,
    /// Unauthenticated requests proceed but are always charged quota
    Tiered,
}

/// Whether authenticated callers are charged quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthenticatedQuota {
    /// Authenticated callers bypass the quota tracker entirely
    Exempt,
    /// Authenticated callers share the same ceiling as everyone else
    Limited,
}

/// Authorization policy for each upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicies {
    /// Policy for `POST /images`
    pub single_upload: AuthPolicy,
    /// Policy for `POST /images/multi`
    pub multi_upload: AuthPolicy,
}

impl RoutePolicies {
    /// Applies one policy to every upload endpoint
    #[must_use]
    pub const fn uniform(policy: AuthPolicy) -> Self {
        Self {
            single_upload: policy,
            multi_upload: policy,
        }
    }
}
