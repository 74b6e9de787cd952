//! Resource providers for the towerdoc compositor.
//!
//! - [`FilesystemResourceProvider`]: serves blob paths from a local asset mirror
//! - [`InMemoryResourceProvider`]: re-exported from `towerdoc-traits`

mod filesystem;

pub use filesystem::FilesystemResourceProvider;

pub use towerdoc_traits::InMemoryResourceProvider;
