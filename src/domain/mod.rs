pub mod column;
pub mod page;
pub mod record;
pub mod source_url;

pub use column::{Column, NewColumn};
pub use page::RenderedPage;
pub use record::PreviewRecord;
pub use source_url::{SourceUrl, UrlRejection, UrlRules};
