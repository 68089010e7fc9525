use std::fmt;

use crate::Args;

/// Final config created from CLI arguments.
#[derive(Debug, Default)]
pub struct Config {
    pub(crate) debug: bool,
    pub(crate) dryrun: bool,
    pub(crate) output_dir_name: String,
    pub(crate) verbose: bool,
}

impl Config {
    /// Create config from given command line args.
    pub fn from_args(args: &Args) -> Self {
        Self {
            debug: args.debug,
            dryrun: args.print,
            output_dir_name: args.output.clone(),
            verbose: args.verbose || args.debug,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config:")?;
        writeln!(f, "  debug:   {}", cheat_tools::colorize_bool(self.debug))?;
        writeln!(f, "  dryrun:  {}", cheat_tools::colorize_bool(self.dryrun))?;
        writeln!(f, "  output:  \"{}\"", self.output_dir_name)?;
        writeln!(f, "  verbose: {}", cheat_tools::colorize_bool(self.verbose))
    }
}
