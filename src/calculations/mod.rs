pub mod critical_path;
pub mod evaluation;
pub mod results;

pub use critical_path::{CriticalPath, CriticalPathSearch, NodePath};
pub use evaluation::Evaluation;
pub use results::ResultsTable;
