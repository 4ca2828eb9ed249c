// ============================================
// Background Jobs Module (後台任務模組)
// ============================================
//
// Contains one-shot job runners for:
// 1. Bootstrap: seeding windows and leaderboards from historical ratings
//
// Triggered at startup when BOOTSTRAP_SEED_FILE is set.

pub mod bootstrap;

pub use bootstrap::{BootstrapError, BootstrapJob, BootstrapStats};
