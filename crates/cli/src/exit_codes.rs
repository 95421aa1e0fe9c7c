//! CLI Exit Code Registry
//!
//! Single source of truth for `dues` exit codes. Scripts branch on these.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success (for `noc`: certificate can be issued)            |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad args, missing plot number, bad field)    |
//! | 3    | No record matches the given plot number                   |
//! | 4    | Input sheet unreadable or has no "Plot No" header row     |
//! | 5    | Ledger could not be read, parsed or written               |
//! | 6    | `noc`: record found but dues are outstanding              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError::from_recon` or the command's handler

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing plot number, unparseable field.
pub const EXIT_USAGE: u8 = 2;

/// Lookup or delete matched no record.
pub const EXIT_NOT_FOUND: u8 = 3;

/// Input sheet could not be read, or no header row was found.
/// The ledger is untouched when this is returned.
pub const EXIT_INPUT: u8 = 4;

/// Ledger persistence failed (I/O, corrupt file under `on_corrupt = "fail"`).
pub const EXIT_LEDGER: u8 = 5;

/// NOC cannot be issued: remaining balance is above zero.
pub const EXIT_NOC_OUTSTANDING: u8 = 6;
