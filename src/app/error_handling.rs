//! Error handling utilities

use crate::error::ConsoleError;
use tracing::error;

/// Print a fatal error and exit with its status code
///
/// `ConsoleError`s show their user message, plus the developer chain when
/// `verbose >= 1`. Anything else exits with status 1.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);

    let exit_code = if let Some(console_err) = error.downcast_ref::<ConsoleError>() {
        eprintln!("{}", console_err.user_message());
        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", console_err.developer_message());
        }
        console_err.exit_code()
    } else {
        eprintln!("Error: {error}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
        1
    };

    std::process::exit(exit_code)
}
