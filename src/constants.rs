// Constants module - centralized default values for configuration
//
// Defaults used by the config layer and by the synthesized responses.
// The response bodies are part of the interception contract seen by
// every page of the application, so they live here rather than inline.

// =============================================================================
// Network defaults
// =============================================================================

/// Default origin that relative request URLs are resolved against
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

/// Default per-request timeout in seconds (applied by the network layer only)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Cache defaults
// =============================================================================

/// Default cache generation name (combined with the version)
pub const DEFAULT_CACHE_NAME: &str = "hikyaku";

/// Default cache generation version
pub const DEFAULT_CACHE_VERSION: &str = "v1";

/// Default offline fallback document served for failed navigations
pub const DEFAULT_OFFLINE_PAGE: &str = "/offline.html";

/// Default maximum size of one cache generation in megabytes
pub const DEFAULT_MAX_CACHE_SIZE_MB: u64 = 256;

/// Default precache manifest
pub const DEFAULT_PRECACHE: &[&str] = &["/", "/offline.html", "/manifest.json"];

/// Default cacheable API surface (trailing-collection endpoints under /api/v1)
pub const DEFAULT_API_PATTERNS: &[&str] = &[
    r"^/api/v1/patients/$",
    r"^/api/v1/observations/$",
    r"^/api/v1/conditions/$",
    r"^/api/v1/allergies/$",
    r"^/api/v1/medications/$",
];

// =============================================================================
// Queue defaults
// =============================================================================

/// Default directory holding durable queue stores
pub const DEFAULT_QUEUE_DIR: &str = "/var/lib/hikyaku";

/// Default queue store name
pub const DEFAULT_STORE_NAME: &str = "pending-requests";

/// On-disk schema version of the queue store
pub const QUEUE_SCHEMA_VERSION: u32 = 1;

// =============================================================================
// Sync defaults
// =============================================================================

/// Background-sync registration tag that replays the pending queue
pub const DEFAULT_SYNC_TAG: &str = "sync-pending-requests";

/// In-process message meaning "connectivity has been restored"
pub const DEFAULT_ONLINE_MESSAGE: &str = "ONLINE";

/// Default initial replay backoff in milliseconds (0 = replay on every trigger)
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 0;

/// Default maximum replay backoff in milliseconds
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;

// =============================================================================
// Synthesized responses
// =============================================================================

/// Message returned with the 202 offline-write acknowledgement
pub const QUEUED_MESSAGE: &str = "Request queued for sync when online";

/// Message returned with the 503 offline-read fallback
pub const OFFLINE_MESSAGE: &str = "You are offline. Data will sync when connection is restored.";
