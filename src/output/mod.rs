// Output module
pub mod table;

pub use table::{NotificationRow, OutputFormat};
