// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3030;

// Token lifetimes
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 900;
pub const MAX_ACCESS_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

// Identity cache configuration constants
pub const DEFAULT_IDENTITY_CACHE_TTL_SECS: u64 = 3600;
pub const MAX_IDENTITY_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_IDENTITY_CACHE_CAPACITY: usize = 10_000;

// Cache and store key namespaces
pub const USER_CACHE_PREFIX: &str = "user:";
pub const ROLE_CACHE_PREFIX: &str = "role:";
pub const ACCESS_TOKEN_BLACKLIST_PREFIX: &str = "blacklist:access-token:";
pub const REVOCATION_SENTINEL: &str = "blacklisted";

// Permission that bypasses every route requirement
pub const MANAGE_SYSTEM_PERMISSION: &str = "manage:system";

// Upper bound on accepted bearer token length
pub const MAX_TOKEN_LENGTH: usize = 4096;
