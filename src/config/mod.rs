//! Configuration: where the ledger lives on disk and how it behaves.

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::Settings;
