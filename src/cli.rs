//! Command-line surface. Every flag here mirrors one entry in the
//! original tool's `ARGUMENTS` x-macro table, adapted to `clap`'s derive
//! API the way `amargo`'s `Cli`/`Command` pair is written.

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "buildsmith",
    version,
    about = "Project-driven, parallel build orchestrator for native C/C++ code",
    long_about = None
)]
pub struct Cli {
    /// Output version information and exit.
    #[clap(short = 'v', long = "version-info")]
    pub show_version: bool,

    /// Print the byte sizes of the fixed-width integer types used for
    /// version packing, then exit.
    #[clap(short = 's', long = "type-sizes")]
    pub show_type_sizes: bool,

    /// Print more information about progress.
    #[clap(short = 'V', long = "verbose")]
    pub verbose: bool,

    /// Suppress all but error output.
    #[clap(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Clean and rebuild all the source files.
    #[clap(short = 'r', long = "rebuild")]
    pub rebuild: bool,

    /// If the build is successful, run the output.
    #[clap(short = 'x', long = "run-after-build")]
    pub run_after_build: bool,

    /// Sets the number of worker threads used for parallel compilation.
    #[clap(short = 'n', long = "num-threads")]
    pub num_threads: Option<usize>,

    /// Builds the given configuration, if found.
    #[clap(short = 'c', long = "active-config")]
    pub active_config: Option<String>,

    /// Rewrites the project descriptor with every default filled in and
    /// exits without building.
    #[clap(short = 'u', long = "update-project")]
    pub update_project: Option<String>,

    /// Truncates each task's captured output to this many lines.
    #[clap(short = 't', long = "truncate-output")]
    pub truncate_output: Option<usize>,

    /// Times the build and prints the elapsed duration.
    #[clap(short = 'T', long = "time-build")]
    pub time_build: bool,

    /// Script mode: treat the sole positional argument as a C/C++ source
    /// file with a shebang line. Must be the only flag given.
    #[clap(short = '#', long = "shebang")]
    pub shebang: bool,

    /// Scaffolds a new project named NAME in a new directory.
    #[clap(short = 'P', long = "new-project")]
    pub new_project: Option<String>,

    /// Presents a numbered menu to choose a configuration interactively.
    #[clap(short = 'i', long = "interactive")]
    pub interactive: bool,

    /// Prints the descriptor schema. An optional file path saves it there
    /// instead of printing to stdout.
    #[clap(short = 'S', long = "schema")]
    pub schema: Option<Option<String>>,

    /// Project descriptor path, or (in script mode) the source file, plus
    /// any arguments forwarded to the built executable.
    pub positional: Vec<String>,
}

impl Cli {
    /// `-#` must be the only flag used; everything else on the command
    /// line belongs to the script being run, not to `buildsmith` itself.
    pub fn validate_shebang_is_sole_flag(&self) -> bool {
        !self.shebang
            || (!self.show_version
                && !self.show_type_sizes
                && !self.verbose
                && !self.quiet
                && !self.rebuild
                && !self.run_after_build
                && self.num_threads.is_none()
                && self.active_config.is_none()
                && self.update_project.is_none()
                && self.truncate_output.is_none()
                && !self.time_build
                && self.new_project.is_none()
                && !self.interactive
                && self.schema.is_none())
    }
}
