pub mod args;

pub use args::{AlertKindArg, Cli, Commands, ConfigAction};
