//! oraclescan-oracle — bytecode-heuristic oracle classification.
//!
//! # Architecture
//!
//! ```text
//! OracleIdentifier (classification engine, memoizing)
//!       │
//!       ├── SignatureCatalog (per-protocol bytecode patterns)
//!       └── confidence_score (weighted evidence arithmetic)
//! ```
//!
//! Classification is a pure function of an address's deployed bytecode plus
//! one optional deployer lookup; it never mutates chain state and never
//! fails the caller, folding errors into `Unknown` results instead.

pub mod identifier;
pub mod patterns;
pub mod scorer;

pub use identifier::OracleIdentifier;
pub use patterns::{SignatureCatalog, SignaturePattern};
pub use scorer::confidence_score;
