//! Graft - migrates a legacy JavaScript module tree in two phases
//!
//! The content phase runs an ordered chain of tasks over every source file
//! and writes the edited tree to the target directory. The structure phase
//! then moves, renames and deletes files in the target tree by naming
//! convention.

pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod library;
pub mod overlay;
pub mod path_info;
pub mod recognize;
pub mod structure;
pub mod task;
pub mod tasks;
pub mod tree;
pub mod working_copy;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{JS_SOURCE_DIR, ModuleConfig};
pub use content::{ContentPhase, ContentReport};
pub use context::{MigrationContext, Warning};
pub use error::{MigrationError, Result};
pub use library::LibraryApi;
pub use overlay::{FixAction, ManualFix, ManualFixOverlay};
pub use path_info::PathInfo;
pub use recognize::JsFile;
pub use structure::{StructurePhase, StructureReport, StructureSettings};
pub use task::{PostMigrationTask, PreMigrationTask, Task, TaskChain};
pub use tasks::default_chain;
pub use tree::{PathFilter, TreeWalker};
pub use working_copy::WorkingCopy;
pub use writer::{WriteReport, Writer};

/// Install the stderr log subscriber. `RUST_LOG` overrides `verbosity`.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "graft=info",
        1 => "graft=debug",
        _ => "graft=trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
