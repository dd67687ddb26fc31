//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → KnockConfig (validated, immutable)
//!     → shared with the daemon subsystems
//!
//! CLI flags override file values before validation runs.
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload (restart to change)
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::KnockConfig;
pub use schema::ObservabilityConfig;
pub use validation::{validate_config, ValidationError};
