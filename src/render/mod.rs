pub mod context;
pub mod loader;
pub mod view;

pub use context::{build_context, merge_context};
pub use loader::{collect_templates, load_tera, TemplateFile};
pub use view::View;
