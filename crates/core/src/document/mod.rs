pub mod id;
pub mod model;

pub use id::DocumentId;
pub use model::{Document, Fields, Filter, ListQuery, SortDirection};
