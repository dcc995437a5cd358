//! CLI Exit Code Registry
//!
//! Single source of truth for `stockgrid` exit codes. Host flows branch on
//! them, so existing values never change meaning.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad arguments)                      |
//! | 3    | Reconcile config could not be parsed or is invalid |
//! | 4    | File could not be read or written                |
//! | 5    | Stock table missing or rejected a write          |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparseable input.
pub const EXIT_USAGE: u8 = 2;

/// Config TOML failed to parse or validate.
pub const EXIT_CONFIG: u8 = 3;

/// Reading the stock table / purchase batch or writing the result failed.
pub const EXIT_IO: u8 = 4;

/// The stock table was not found, is too narrow, or refused a write.
pub const EXIT_TABLE: u8 = 5;
