// All extraction functionality is in papermeta-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod output;

// Re-export core types for convenience
pub use papermeta_core::*;
