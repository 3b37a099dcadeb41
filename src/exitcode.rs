//! Process exit codes (BSD sysexits.h compatible)

/// Command ran; classified failures were reported on stdout
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Remote resource missing
pub const NOINPUT: i32 = 66;

/// Remote service failed or timed out
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Can't write output
pub const IOERR: i32 = 74;

/// Remote service rejected credentials
pub const NOPERM: i32 = 77;

/// Configuration error
pub const CONFIG: i32 = 78;
