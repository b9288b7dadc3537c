//! Domain-level constants.
//!
//! Cache key layout, expirations and well-known parameter names.

// =============================================================================
// Cache Keys
// =============================================================================

/// Prefix for per-user cache entries (`user:{username}`)
pub const CACHE_PREFIX_USER: &str = "user:";

/// Build the per-user cache key for a username
pub fn user_cache_key(username: &str) -> String {
    format!("{}{}", CACHE_PREFIX_USER, username)
}

/// Key under which the identity-provider side of a registration is tracked.
///
/// Unprefixed: it is the bare username.
pub fn identity_cache_key(username: &str) -> String {
    username.to_string()
}

// =============================================================================
// Expiration
// =============================================================================

/// Default cache entry lifetime in seconds
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

/// Lifetime of the user entry written after a successful authentication
pub const AUTH_USER_CACHE_TTL_SECONDS: u64 = 3600;

// =============================================================================
// Parameters
// =============================================================================

/// Parameter holding the key id used to encrypt user secrets
pub const DEFAULT_KMS_KEY_ID_PARAMETER: &str = "/myapp/kms-key-id";

// =============================================================================
// Records
// =============================================================================

/// Identifier carried by records that have not been persisted yet
pub const UNASSIGNED_ID: i64 = 0;
