//! Directory tree walking and filtering
//!
//! - `TreeWalker`: ordered walk over a module root that skips VCS, build and
//!   vendored directories, then applies include/exclude `PathFilter`s
//! - `prune_empty_dirs`: post-order removal of directories left empty by
//!   structural moves and deletes

pub mod filter;
mod utils;
mod walker;

pub use filter::{GlobFilter, PathFilter, PathFilterExt};
pub use utils::{delete_file, ensure_parent, move_file, prune_empty_dirs};
pub use walker::TreeWalker;
