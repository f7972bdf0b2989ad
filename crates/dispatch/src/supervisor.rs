use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use logging::DebugSink;
use rand::Rng;
use stats::{Live, Row};
use worker::{ReadConfig, RandomWriteData, WorkerRole, WorkerState, WriteConfig, read_entry, write_entry};

use crate::cleanup;
use crate::config::{PathIter, RunConfig};
use crate::context::RunContext;
use crate::error::DispatchError;
use crate::signal::{self, Interrupt, is_cancelled};

/// The tuple the supervisor hands back after one full dispatch (spec.md
/// §4.E phase 10).
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Workers that ran to natural or timer completion.
    pub num_complete: u64,
    /// Workers cancelled by the interrupt broadcast.
    pub num_interrupted: u64,
    /// Workers that exited on an unrecoverable error.
    pub num_error: u64,
    /// Write paths that could not be reclaimed (0 when `keep_write_paths`
    /// reports the full created count instead).
    pub remaining_write_paths: usize,
    /// One row per worker, for [`stats::render`].
    pub rows: Vec<Row>,
}

enum Sentinel {
    Interrupt,
    Timer,
    Error(worker::WorkerError),
}

enum Completion {
    Complete,
    Interrupted,
    Error,
}

struct WorkerRunCtx {
    state: WorkerState,
    root: PathBuf,
    flist: Option<Arc<Vec<PathBuf>>>,
    path_iter: PathIter,
    num_repeat: i64,
    deadline_secs: u64,
    interrupt_rx: Receiver<()>,
    read_cfg: ReadConfig,
    write_cfg: WriteConfig,
    live: Option<Arc<Live>>,
    sink: Arc<dyn DebugSink>,
    finished_count: Arc<AtomicUsize>,
    num_workers: usize,
    completion_tx: crossbeam_channel::Sender<()>,
}

/// Runs one full dispatch: spawns workers, waits for completion or SIGINT,
/// reclaims created write paths, and returns the aggregate outcome.
///
/// This is one iteration of the `num_set` loop; [`crate::dispatch_all`]
/// drives the repeat and the divider banners.
///
/// # Errors
///
/// Returns [`DispatchError`] if flist construction fails, the SIGINT
/// handler cannot be installed, or reclaim hits an unexpected file kind.
pub fn dispatch_once(cfg: &RunConfig, sink: Arc<dyn DebugSink>) -> Result<DispatchOutcome, DispatchError> {
    if cfg.num_reader == 0 && cfg.num_writer == 0 {
        return Ok(DispatchOutcome::default());
    }

    signal::install()?;
    let ctx = RunContext::new(cfg);
    let flists = build_flists(cfg, sink.as_ref())?;

    let num_workers = cfg.num_reader + cfg.num_writer;
    let monitor_enabled = cfg.monitor_interval_secs > 0;

    let read_cfg = ReadConfig {
        ignore_dot: cfg.ignore_dot,
        stat_only: cfg.stat_only,
        follow_symlink: cfg.follow_symlink,
        read_size: cfg.read_size,
    };
    let write_cfg = WriteConfig {
        write_paths_base: cfg.write_paths_base.clone(),
        ignore_dot: cfg.ignore_dot,
        ts: ctx.ts.clone(),
        write_paths_type: cfg.write_paths_type.clone(),
        num_write_paths: cfg.num_write_paths,
        write_size: cfg.write_size,
        truncate_write_paths: cfg.truncate_write_paths,
        fsync_write_paths: cfg.fsync_write_paths,
        dirsync_write_paths: cfg.dirsync_write_paths,
        random_write_data: ctx.random_write_data.clone().map(|bank| RandomWriteData { bank }),
    };

    let mut interrupt = Interrupt::new();
    let (completion_tx, completion_rx) = crossbeam_channel::bounded::<()>(1);
    signal::arm(completion_tx.clone());
    let finished_count = Arc::new(AtomicUsize::new(0));

    let mut lives: Vec<Option<Arc<Live>>> = Vec::with_capacity(num_workers);
    let mut handles = Vec::with_capacity(num_workers);

    for id in 0..num_workers {
        let role = if id < cfg.num_reader { WorkerRole::Reader } else { WorkerRole::Writer };
        let root = cfg.roots[id % cfg.roots.len()].clone();
        let live = monitor_enabled.then(|| Arc::new(Live::new(role, root.clone())));
        lives.push(live.clone());

        let state = match role {
            WorkerRole::Reader => WorkerState::new_reader(id, cfg.read_buffer_size),
            WorkerRole::Writer => WorkerState::new_writer(id, id - cfg.num_reader, cfg.write_buffer_size),
        };

        let flist = flists.as_ref().map(|per_root| Arc::clone(&per_root[id % per_root.len()]));

        let run_ctx = WorkerRunCtx {
            state,
            root,
            flist,
            path_iter: cfg.path_iter,
            num_repeat: cfg.num_repeat,
            deadline_secs: cfg.deadline_secs,
            interrupt_rx: interrupt.receiver(),
            read_cfg,
            write_cfg: write_cfg.clone(),
            live,
            sink: Arc::clone(&sink),
            finished_count: Arc::clone(&finished_count),
            num_workers,
            completion_tx: completion_tx.clone(),
        };

        let handle = thread::Builder::new()
            .name(format!("dirload-w{id}"))
            .spawn(move || run_worker(run_ctx))
            .expect("spawning a worker thread should not fail under normal resource limits");
        handles.push(handle);
    }
    drop(completion_tx);

    let monitor_handle = monitor_enabled.then(|| {
        let lives: Vec<Arc<Live>> = lives.iter().flatten().cloned().collect();
        let interrupt_rx = interrupt.receiver();
        let interval = Duration::from_secs(cfg.monitor_interval_secs);
        thread::spawn(move || monitor_loop(lives, interrupt_rx, interval))
    });

    completion_rx.recv().ok();
    interrupt.close();
    signal::disarm();

    let mut num_complete = 0u64;
    let mut num_interrupted = 0u64;
    let mut num_error = 0u64;
    let mut registry: Vec<PathBuf> = Vec::new();
    let mut rows = Vec::with_capacity(num_workers);

    for (id, handle) in handles.into_iter().enumerate() {
        let (state, completion) = handle.join().map_err(|_| DispatchError::WorkerPanicked(id))?;
        match completion {
            Completion::Complete => num_complete += 1,
            Completion::Interrupted => num_interrupted += 1,
            Completion::Error => num_error += 1,
        }
        let role = state.role();
        let stats = state.stats.clone();
        registry.extend(state.into_write_registry());
        rows.push(Row { role, stats });
    }

    if let Some(handle) = monitor_handle {
        let _ = handle.join();
    }

    let remaining_write_paths = if cfg.keep_write_paths {
        registry.len()
    } else {
        cleanup::reclaim(registry)?.len()
    };

    Ok(DispatchOutcome {
        num_complete,
        num_interrupted,
        num_error,
        remaining_write_paths,
        rows,
    })
}

fn run_worker(mut ctx: WorkerRunCtx) -> (WorkerState, Completion) {
    ctx.state.stats.input_root = ctx.root.clone();
    ctx.state.stats.time_begin = Some(Instant::now());

    let deadline_rx = (ctx.deadline_secs > 0).then(|| crossbeam_channel::after(Duration::from_secs(ctx.deadline_secs)));

    let completion = loop {
        let sentinel = match ctx.path_iter {
            PathIter::Walk => run_walk_iteration(&mut ctx, deadline_rx.as_ref()),
            _ => run_flist_iteration(&mut ctx, deadline_rx.as_ref()),
        };

        match sentinel {
            Some(Sentinel::Interrupt) => {
                ctx.sink.line(&format!("#{} interrupt", ctx.state.id()));
                break Completion::Interrupted;
            }
            Some(Sentinel::Timer) => {
                ctx.sink.line(&format!("#{} timer", ctx.state.id()));
                break Completion::Complete;
            }
            Some(Sentinel::Error(e)) => {
                ctx.sink.line(&format!("#{} {e}", ctx.state.id()));
                break Completion::Error;
            }
            None => {
                ctx.state.stats.num_repeat += 1;
                if let Some(live) = &ctx.live {
                    live.sync(&ctx.state.stats);
                }
                let writer_quota_met = ctx.state.role() == WorkerRole::Writer
                    && ctx.write_cfg.num_write_paths > 0
                    && ctx.state.write_registry().len() as i64 >= ctx.write_cfg.num_write_paths;
                let repeat_cap_met = ctx.num_repeat > 0 && ctx.state.stats.num_repeat >= ctx.num_repeat as u64;
                if repeat_cap_met || writer_quota_met {
                    break Completion::Complete;
                }
            }
        }
    };

    ctx.state.stats.time_end = Some(Instant::now());
    if let Some(live) = &ctx.live {
        live.sync(&ctx.state.stats);
        live.finish();
    }

    let total = ctx.finished_count.fetch_add(1, Ordering::SeqCst) + 1;
    if total == ctx.num_workers && !signal::was_signaled() {
        let _ = ctx.completion_tx.try_send(());
    }

    (ctx.state, completion)
}

fn run_walk_iteration(ctx: &mut WorkerRunCtx, deadline_rx: Option<&Receiver<Instant>>) -> Option<Sentinel> {
    let root = ctx.root.clone();
    let mut sentinel = None;

    let walk_result = walk::walk(&root, |path| {
        if is_cancelled(&ctx.interrupt_rx) {
            sentinel = Some(Sentinel::Interrupt);
            return Ok(walk::WalkControl::Stop);
        }
        if deadline_rx.is_some_and(|rx| rx.try_recv().is_ok()) {
            sentinel = Some(Sentinel::Timer);
            return Ok(walk::WalkControl::Stop);
        }
        assert!(path.starts_with(&root), "walk yielded a path outside its root");

        if let Err(e) = process_entry(ctx, path) {
            sentinel = Some(Sentinel::Error(e));
            return Ok(walk::WalkControl::Stop);
        }
        Ok(walk::WalkControl::Continue)
    });

    if let Err(e) = walk_result {
        return Some(Sentinel::Error(e.into()));
    }
    sentinel
}

fn run_flist_iteration(ctx: &mut WorkerRunCtx, deadline_rx: Option<&Receiver<Instant>>) -> Option<Sentinel> {
    let flist = Arc::clone(ctx.flist.as_ref().expect("flist assigned for non-walk path_iter"));
    let len = flist.len();

    for j in 0..len {
        if is_cancelled(&ctx.interrupt_rx) {
            return Some(Sentinel::Interrupt);
        }
        if deadline_rx.is_some_and(|rx| rx.try_recv().is_ok()) {
            return Some(Sentinel::Timer);
        }
        let idx = match ctx.path_iter {
            PathIter::Ordered => j,
            PathIter::Reverse => len - 1 - j,
            PathIter::Random => rand::rng().random_range(0..len),
            PathIter::Walk => unreachable!("flist iteration never runs for PathIter::Walk"),
        };
        if let Err(e) = process_entry(ctx, &flist[idx]) {
            return Some(Sentinel::Error(e));
        }
    }
    None
}

fn process_entry(ctx: &mut WorkerRunCtx, path: &std::path::Path) -> Result<(), worker::WorkerError> {
    match ctx.state.role() {
        WorkerRole::Reader => read_entry(&mut ctx.state, path, &ctx.read_cfg)?,
        WorkerRole::Writer => write_entry(&mut ctx.state, path, &ctx.write_cfg)?,
    }
    if let Some(live) = &ctx.live {
        live.sync(&ctx.state.stats);
    }
    Ok(())
}

fn monitor_loop(lives: Vec<Arc<Live>>, interrupt_rx: Receiver<()>, interval: Duration) {
    let ticker = crossbeam_channel::tick(interval);
    loop {
        crossbeam_channel::select! {
            recv(ticker) -> _ => {
                let rows: Vec<Row> = lives.iter().map(|l| l.snapshot()).collect();
                tracing::info!(target: "dirload::monitor", "\n{}", stats::render(&rows));
            }
            recv(interrupt_rx) -> _ => break,
        }
    }
}

fn build_flists(cfg: &RunConfig, sink: &dyn DebugSink) -> Result<Option<Vec<Arc<Vec<PathBuf>>>>, DispatchError> {
    if cfg.path_iter == PathIter::Walk {
        return Ok(None);
    }

    let per_root: Vec<Vec<PathBuf>> = if let Some(flist_file) = &cfg.flist_file {
        let lines = flist::load_file(flist_file)?;
        flist::distribute(&lines, &cfg.roots)?
    } else {
        cfg.roots
            .iter()
            .map(|root| flist::build_for_root(root, cfg.ignore_dot))
            .collect::<Result<_, _>>()?
    };

    for (root, list) in cfg.roots.iter().zip(per_root.iter()) {
        if list.is_empty() {
            return Err(flist::FlistError::Empty(root.clone()).into());
        }
        sink.line(&format!("{} files scanned from {}", list.len(), root.display()));
    }

    Ok(Some(per_root.into_iter().map(Arc::new).collect()))
}

/// One-shot `clean_write_paths` startup action (spec.md §6): collects every
/// `dirload_<base>_*` entry under each root and reclaims it via
/// [`cleanup::reclaim`], bypassing the worker pool entirely.
///
/// # Errors
///
/// Returns [`DispatchError`] if a root cannot be walked, or reclaim hits an
/// unexpected file kind.
pub fn run_clean_write_paths(cfg: &RunConfig) -> Result<usize, DispatchError> {
    let mut found = Vec::new();
    for root in &cfg.roots {
        let entries = cleanup::collect_existing(root, &cfg.write_paths_base)
            .map_err(|source| DispatchError::Io { path: root.clone(), source })?;
        found.extend(entries);
    }
    Ok(cleanup::reclaim(found)?.len())
}

/// One-shot `flist_file_create` startup action (spec.md §6): builds the
/// flist for every root and writes the sorted union to `cfg.flist_file`.
///
/// # Errors
///
/// Returns [`DispatchError`] if no `flist_file` is configured, a root
/// cannot be walked, or the output file already exists without `force`.
pub fn run_flist_file_create(cfg: &RunConfig, sink: &dyn DebugSink) -> Result<(), DispatchError> {
    let flist_file = cfg
        .flist_file
        .as_ref()
        .ok_or_else(|| DispatchError::Configuration("flist_file_create requires --flist-file".into()))?;

    let mut union = Vec::new();
    for root in &cfg.roots {
        let entries = flist::build_for_root(root, cfg.ignore_dot)?;
        sink.line(&format!("{} files scanned from {}", entries.len(), root.display()));
        union.extend(entries);
    }
    flist::write_file(flist_file, &union, cfg.force)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::NullSink;
    use tempfile::tempdir;

    fn minimal_cfg(roots: Vec<PathBuf>) -> RunConfig {
        crate::config::RunConfig::validate(crate::config::RawConfig {
            roots,
            num_set: 1,
            num_reader: 0,
            num_writer: 0,
            num_repeat: -1,
            time_minute: 0,
            time_second: 0,
            monitor_interval_minute: 0,
            monitor_interval_second: 0,
            stat_only: false,
            ignore_dot: false,
            follow_symlink: false,
            read_buffer_size: 65536,
            write_buffer_size: 65536,
            read_size: -1,
            write_size: -1,
            random_write_data: false,
            num_write_paths: 1024,
            truncate_write_paths: false,
            fsync_write_paths: false,
            dirsync_write_paths: false,
            keep_write_paths: false,
            clean_write_paths: false,
            write_paths_base: "x".into(),
            write_paths_type: "dr".into(),
            path_iter: PathIter::Ordered,
            flist_file: None,
            flist_file_create: false,
            force: true,
        })
        .unwrap()
    }

    #[test]
    fn zero_workers_returns_all_zero_outcome_without_side_effects() {
        let dir = tempdir().unwrap();
        let cfg = minimal_cfg(vec![dir.path().to_path_buf()]);
        let outcome = dispatch_once(&cfg, Arc::new(NullSink)).unwrap();
        assert_eq!(outcome.num_complete, 0);
        assert_eq!(outcome.num_interrupted, 0);
        assert_eq!(outcome.num_error, 0);
        assert_eq!(outcome.remaining_write_paths, 0);
        assert!(outcome.rows.is_empty());
    }

    #[test]
    fn reader_completes_over_flist_and_reports_one_row() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"hello").unwrap();
        let mut cfg = minimal_cfg(vec![dir.path().to_path_buf()]);
        cfg.num_reader = 1;
        cfg.num_repeat = 1;

        let outcome = dispatch_once(&cfg, Arc::new(NullSink)).unwrap();

        assert_eq!(outcome.num_complete, 1);
        assert_eq!(outcome.rows.len(), 1);
        assert!(outcome.rows[0].stats.num_stat >= 1);
    }

    #[test]
    fn writer_respects_quota_and_cleans_up() {
        let dir = tempdir().unwrap();
        let mut cfg = minimal_cfg(vec![dir.path().to_path_buf()]);
        cfg.num_writer = 1;
        cfg.num_repeat = -1;
        cfg.num_write_paths = 3;
        cfg.write_paths_type = vec![walk::CreateKind::Dir];

        let outcome = dispatch_once(&cfg, Arc::new(NullSink)).unwrap();

        assert_eq!(outcome.num_complete, 1);
        assert_eq!(outcome.remaining_write_paths, 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
