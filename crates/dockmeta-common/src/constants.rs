//! System-wide constants and defaults.

/// Docker endpoint used when the configuration leaves it empty.
pub const DEFAULT_DOCKER_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// Event field holding the container identifier when none is configured.
pub const DEFAULT_CONTAINER_ID_FIELD: &str = "CONTAINER_ID";

/// Event field that receives the derived metadata map.
pub const DEFAULT_TARGET_FIELD: &str = "docker";

/// Upper bound on a single container inspection, in seconds.
pub const DEFAULT_INSPECT_TIMEOUT_SECS: u64 = 5;

/// Top-level key of the inspection document holding the container config.
pub const CONFIG_ATTRIBUTE: &str = "Config";

/// Key of the environment list inside the container config.
pub const ENV_ATTRIBUTE: &str = "Env";

/// Key of the label map inside the container config.
pub const LABELS_ATTRIBUTE: &str = "Labels";

/// Configuration file read when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "dockmeta.yml";
