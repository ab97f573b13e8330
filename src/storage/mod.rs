pub mod db;
mod events;
mod meta;
mod relations;
pub mod sort_index;
mod tables;

pub use db::{Database, DatabaseError};
pub use sort_index::{IndexNamespace, IndexReplaceMode};
pub use tables::*;
