// default engine settings
pub const CONFIG_VERSION: &str = "v1";
pub const CONF_FILE_PATH_ENV_KEY: &str = "MESHGUARD_CONFIG_FILE_PATH";
pub const CB_ENABLE_ENV_KEY: &str = "MESHGUARD_CB_ENABLE";
pub const CB_EXPIRE_INTERVAL_ENV_KEY: &str = "MESHGUARD_CB_EXPIRE_INTERVAL_MS";
pub const CONFIG_FILENAME: &str = "USE_DEFAULT_CONFIGURATION";

// default circuit breaker settings
/// `0` lets the scheduler derive its period from the bucket width of the tracked windows
pub const AUTO_CHECK_PERIOD_MS: u64 = 0;
pub const DEFAULT_CHECK_PERIOD_MS: u64 = 1000;
pub const MIN_CHECK_PERIOD_MS: u64 = 10;
pub const DEFAULT_COUNTERS_EXPIRE_INTERVAL_MS: u64 = 60 * 1000;
/// upper bound between two expiry sweeps
pub const MAX_SWEEP_PERIOD_MS: u64 = 1000;
pub const DEFAULT_BUCKET_COUNT: u32 = 10;
pub const DEFAULT_MAX_HALF_OPEN_REQUESTS: u32 = 3;
pub const DEFAULT_REGEX_CACHE_CAPACITY: usize = 1024;

// default log settings
pub const DEFAULT_LOG_LEVEL: &str = "warn";
