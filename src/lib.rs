// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # glesys-server
//!
//! Declarative, idempotent reconciliation of a single `GleSYS` Cloud server.
//!
//! ## Overview
//!
//! The desired server is described in a YAML file. Each run looks the server
//! up, decides whether to create, edit, power-cycle or delete it, waits for
//! the provider to settle, and reports the latest snapshot.
//!
//! Running it twice against an unchanged server reports no change the second
//! time.
//!
//! ## Architecture
//!
//! 1. **Desired State**: Defined in `server.yaml`
//! 2. **Observed State**: Queried from the `GleSYS` API
//! 3. **Reconciler**: Decides and executes the necessary actions
//!
//! ## Modules
//!
//! - [`config`]: Configuration parsing, validation and credentials
//! - [`glesys`]: `GleSYS` API client, wire types and password generation
//! - [`planner`]: Decision logic and power transitions
//! - [`convergence`]: Lock and state polling
//! - [`reconciler`]: Reconciliation entry point
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! server:
//!   hostname: web1
//!   cpus: 2
//!   memory: 4096
//!   state: running
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod convergence;
pub mod error;
pub mod glesys;
pub mod planner;
pub mod reconciler;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, CredentialResolver, DesiredServer, ServerConfig};
pub use convergence::{PollPolicy, StateWaiter};
pub use error::{GlesysError, Result};
pub use glesys::{GlesysClient, ServerApi, ServerSnapshot};
pub use planner::{decide, ActionDecision};
pub use reconciler::{ReconcileOutcome, ReconcilePlan, Reconciler};
