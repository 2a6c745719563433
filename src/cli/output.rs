//! Diagnostic output helpers.
//!
//! stdout is reserved for the credential protocol, so everything meant
//! for humans goes to stderr.

use console::style;

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}
