// framescope-cli/src/commands/mod.rs
//
// One module per subcommand.

pub mod analyze;
pub mod probe;
