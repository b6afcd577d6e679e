//! CLI flags.

mod node;
pub use node::NodeArgs;

mod capture;
pub use capture::{CaptureArgs, parse_cutoff};

mod query;
pub use query::QueryArgs;
