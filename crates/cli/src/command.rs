use clap::{Arg, ArgAction, Command as ClapCommand, value_parser};
use std::path::PathBuf;

/// Builds the argument grammar for `program_name` (spec.md §6).
///
/// Help and version are defined as plain flags rather than clap's built-ins
/// so [`crate::run`] can render them through the same stdout handle the rest
/// of the program writes to.
pub(crate) fn clap_command(program_name: &'static str) -> ClapCommand {
    ClapCommand::new(program_name)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg_required_else_help(false)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("roots")
                .value_name("ROOT")
                .help("Directory to load (repeatable).")
                .value_parser(value_parser!(PathBuf))
                .num_args(1..),
        )
        .arg(
            Arg::new("num-set")
                .long("num-set")
                .value_name("N")
                .help("Repeat the whole dispatch this many times.")
                .value_parser(value_parser!(u32))
                .default_value("1"),
        )
        .arg(
            Arg::new("num-reader")
                .long("num-reader")
                .value_name("N")
                .help("Reader worker count.")
                .value_parser(value_parser!(usize))
                .default_value("0"),
        )
        .arg(
            Arg::new("num-writer")
                .long("num-writer")
                .value_name("N")
                .help("Writer worker count.")
                .value_parser(value_parser!(usize))
                .default_value("0"),
        )
        .arg(
            Arg::new("num-repeat")
                .long("num-repeat")
                .value_name("N")
                .help("Per-worker iteration cap; values <= 0 mean unbounded.")
                .value_parser(value_parser!(i64))
                .default_value("-1"),
        )
        .arg(
            Arg::new("time-minute")
                .long("time-minute")
                .value_name("N")
                .help("Per-worker deadline, minute component.")
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new("time-second")
                .long("time-second")
                .value_name("N")
                .help("Per-worker deadline, second component.")
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new("monitor-interval-minute")
                .long("monitor-interval-minute")
                .value_name("N")
                .help("Monitor tick interval, minute component.")
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new("monitor-interval-second")
                .long("monitor-interval-second")
                .value_name("N")
                .help("Monitor tick interval, second component.")
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new("stat-only")
                .long("stat-only")
                .help("Skip body reads/writes.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ignore-dot")
                .long("ignore-dot")
                .help("Drop non-directory dot entries in walk and flist.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("follow-symlink")
                .long("follow-symlink")
                .help("Read through a resolved symlink's target.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("lstat")
                .long("lstat")
                .help("Legacy alias: never follow symlinks. Wins over --follow-symlink when both are given.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("read-buffer-size")
                .long("read-buffer-size")
                .value_name("BYTES")
                .help("Size of each worker's read buffer (1..=131072).")
                .value_parser(value_parser!(usize))
                .default_value("65536"),
        )
        .arg(
            Arg::new("write-buffer-size")
                .long("write-buffer-size")
                .value_name("BYTES")
                .help("Size of each worker's write buffer (1..=131072).")
                .value_parser(value_parser!(usize))
                .default_value("65536"),
        )
        .arg(
            Arg::new("read-size")
                .long("read-size")
                .value_name("N")
                .help("-1 = read to EOF, 0 = random per open, >0 = exact residual.")
                .value_parser(value_parser!(i64))
                .default_value("-1"),
        )
        .arg(
            Arg::new("write-size")
                .long("write-size")
                .value_name("N")
                .help("-1 = no body write, 0 = random per open, >0 = exact residual.")
                .value_parser(value_parser!(i64))
                .default_value("-1"),
        )
        .arg(
            Arg::new("random-write-data")
                .long("random-write-data")
                .help("Copy from a printable-ASCII bank instead of a fixed fill byte.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("num-write-paths")
                .long("num-write-paths")
                .value_name("N")
                .help("Writer quota; negative means unbounded.")
                .value_parser(value_parser!(i64))
                .default_value("1024"),
        )
        .arg(
            Arg::new("truncate-write-paths")
                .long("truncate-write-paths")
                .help("Substitute ftruncate for the write loop.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("fsync-write-paths")
                .long("fsync-write-paths")
                .help("Fsync each created path after writing.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dirsync-write-paths")
                .long("dirsync-write-paths")
                .help("Fsync each created path's parent directory.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("keep-write-paths")
                .long("keep-write-paths")
                .help("Skip cleanup; report the created-path count instead.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("clean-write-paths")
                .long("clean-write-paths")
                .help("One-shot: unlink existing dirload_<base>_* entries and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("write-paths-base")
                .long("write-paths-base")
                .value_name("BASE")
                .help("Basename component embedded in created paths.")
                .default_value("x"),
        )
        .arg(
            Arg::new("write-paths-type")
                .long("write-paths-type")
                .value_name("LETTERS")
                .help("Kind alphabet over d|r|s|l, sampled uniformly per create.")
                .default_value("dr"),
        )
        .arg(
            Arg::new("path-iter")
                .long("path-iter")
                .value_name("MODE")
                .help("One of walk|ordered|reverse|random.")
                .value_parser(["walk", "ordered", "reverse", "random"])
                .default_value("ordered"),
        )
        .arg(
            Arg::new("flist-file")
                .long("flist-file")
                .value_name("PATH")
                .help("Optional pre-recorded absolute-path list.")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("flist-file-create")
                .long("flist-file-create")
                .help("One-shot: emit the flist for the roots and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .help("Bypass the root-proximity-to-/ safety check.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Raise console log verbosity to info.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable the debug log sink.")
                .action(ArgAction::SetTrue),
        )
}
