use std::ffi::OsString;
use std::path::PathBuf;

use dispatch::{PathIter, RawConfig};

use crate::command::clap_command;

/// The result of parsing one invocation, before [`RawConfig`] validation.
pub(crate) struct ParsedArgs {
    pub(crate) show_help: bool,
    pub(crate) show_version: bool,
    pub(crate) verbose: bool,
    pub(crate) debug: bool,
    pub(crate) raw: RawConfig,
}

/// Parses `arguments` against the grammar in [`clap_command`].
///
/// # Errors
///
/// Returns [`clap::Error`] for any malformed invocation; the caller (`run`)
/// renders it and maps it to exit code 1.
pub(crate) fn parse_args<I, S>(program_name: &'static str, arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let command = clap_command(program_name);
    let matches = command.try_get_matches_from(arguments)?;

    let show_help = matches.get_flag("help");
    let show_version = matches.get_flag("version");
    let verbose = matches.get_flag("verbose");
    let debug = matches.get_flag("debug");

    let roots: Vec<PathBuf> = matches
        .get_many::<PathBuf>("roots")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
        .into_iter()
        .map(absolute)
        .collect();

    let follow_symlink = matches.get_flag("follow-symlink") && !matches.get_flag("lstat");

    let path_iter = match matches.get_one::<String>("path-iter").map(String::as_str) {
        Some("walk") => PathIter::Walk,
        Some("reverse") => PathIter::Reverse,
        Some("random") => PathIter::Random,
        _ => PathIter::Ordered,
    };

    let raw = RawConfig {
        roots,
        num_set: *matches.get_one::<u32>("num-set").unwrap(),
        num_reader: *matches.get_one::<usize>("num-reader").unwrap(),
        num_writer: *matches.get_one::<usize>("num-writer").unwrap(),
        num_repeat: *matches.get_one::<i64>("num-repeat").unwrap(),
        time_minute: *matches.get_one::<u64>("time-minute").unwrap(),
        time_second: *matches.get_one::<u64>("time-second").unwrap(),
        monitor_interval_minute: *matches.get_one::<u64>("monitor-interval-minute").unwrap(),
        monitor_interval_second: *matches.get_one::<u64>("monitor-interval-second").unwrap(),
        stat_only: matches.get_flag("stat-only"),
        ignore_dot: matches.get_flag("ignore-dot"),
        follow_symlink,
        read_buffer_size: *matches.get_one::<usize>("read-buffer-size").unwrap(),
        write_buffer_size: *matches.get_one::<usize>("write-buffer-size").unwrap(),
        read_size: *matches.get_one::<i64>("read-size").unwrap(),
        write_size: *matches.get_one::<i64>("write-size").unwrap(),
        random_write_data: matches.get_flag("random-write-data"),
        num_write_paths: *matches.get_one::<i64>("num-write-paths").unwrap(),
        truncate_write_paths: matches.get_flag("truncate-write-paths"),
        fsync_write_paths: matches.get_flag("fsync-write-paths"),
        dirsync_write_paths: matches.get_flag("dirsync-write-paths"),
        keep_write_paths: matches.get_flag("keep-write-paths"),
        clean_write_paths: matches.get_flag("clean-write-paths"),
        write_paths_base: matches.get_one::<String>("write-paths-base").unwrap().clone(),
        write_paths_type: matches.get_one::<String>("write-paths-type").unwrap().clone(),
        path_iter,
        flist_file: matches.get_one::<PathBuf>("flist-file").cloned(),
        flist_file_create: matches.get_flag("flist-file-create"),
        force: matches.get_flag("force"),
    };

    Ok(ParsedArgs {
        show_help,
        show_version,
        verbose,
        debug,
        raw,
    })
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir().map_or(path.clone(), |cwd| cwd.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let parsed = parse_args("dirload", ["dirload", "/tmp/data"]).unwrap();
        assert_eq!(parsed.raw.num_set, 1);
        assert_eq!(parsed.raw.num_repeat, -1);
        assert_eq!(parsed.raw.write_paths_base, "x");
        assert_eq!(parsed.raw.write_paths_type, "dr");
        assert_eq!(parsed.raw.path_iter, dispatch::PathIter::Ordered);
    }

    #[test]
    fn lstat_overrides_follow_symlink_when_both_given() {
        let parsed = parse_args("dirload", ["dirload", "--follow-symlink", "--lstat", "/tmp/data"]).unwrap();
        assert!(!parsed.raw.follow_symlink);
    }

    #[test]
    fn lstat_wins_regardless_of_flag_order() {
        let parsed = parse_args("dirload", ["dirload", "--lstat", "--follow-symlink", "/tmp/data"]).unwrap();
        assert!(!parsed.raw.follow_symlink);
    }

    #[test]
    fn help_and_version_flags_are_recognised() {
        let parsed = parse_args("dirload", ["dirload", "--help"]).unwrap();
        assert!(parsed.show_help);
        let parsed = parse_args("dirload", ["dirload", "--version"]).unwrap();
        assert!(parsed.show_version);
    }

    #[test]
    fn rejects_unknown_path_iter() {
        assert!(parse_args("dirload", ["dirload", "--path-iter", "bogus", "/tmp"]).is_err());
    }
}
