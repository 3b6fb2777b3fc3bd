pub mod url;

use tera::Tera;

pub use url::{UrlExtension, UrlHelpers};

/// A fixed set of functions, filters or testers registered into a tera environment.
pub trait Extension: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn register(&self, tera: &mut Tera);
}
