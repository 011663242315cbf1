//! Stable exit codes for `tripstate` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, document, script, or other errors.
pub const INVALID: i32 = 1;
/// `tripstate get` found nothing at the requested path.
pub const ABSENT: i32 = 2;
