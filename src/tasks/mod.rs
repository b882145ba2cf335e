//! Built-in tasks and the default task chain

mod imports;
mod library;
mod recognize;

pub use imports::LibraryImportsTask;
pub use library::{LoadLibraryApisTask, PersistLibraryApiTask};
pub use recognize::RecognizeJsTask;

use crate::config::ModuleConfig;
use crate::task::TaskChain;

/// The chain used by the command line, in execution order.
pub fn default_chain(config: &ModuleConfig) -> TaskChain {
    TaskChain::new()
        .pre_task(LoadLibraryApisTask)
        .task(RecognizeJsTask::new(config))
        .task(LibraryImportsTask::default())
        .post_task(PersistLibraryApiTask)
}
