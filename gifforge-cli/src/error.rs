// gifforge-cli/src/error.rs
//
// Error handling for the CLI, reusing the core error types.

use gifforge_core::CoreResult;

/// Type alias for CLI results using CoreError.
///
/// This provides consistency with the core library while allowing
/// CLI-specific error handling when needed.
pub type CliResult<T> = CoreResult<T>;
