//! ResolverService: the resolve-file entry point.
//!
//! ## Pipeline
//!
//! ```text
//! request ─► document_path (workspace containment)
//!         ─► Workspace::load_file (read, parse, lower; parse cache)
//!         ─► extract (Scope: file → package → builtin / imports)
//!         ─► build_index ─► check_network ─► node error policy
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let service = ResolverService::new(ResolverConfig::default(), Arc::new(FsLoader));
//! let outcome = service.resolve(&request)?;
//! let json = serde_json::to_string(&outcome.response)?;
//! ```

use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::resolve_file::{Extra, ResolveFileRequest, ResolveFileResponse, ResolveOutcome};
use crate::config::{NodeErrorPolicy, ResolverConfig};
use crate::error::ResolveError;
use crate::hir::{
    DiagnosticCollector, Scope, build_index, check_integrity, check_network, extract,
};
use crate::project::{
    FileError, FsLoader, ParseCache, SourceLoader, Workspace, document_path, normalize,
};

struct Shared {
    config: ResolverConfig,
    loader: Arc<dyn SourceLoader>,
    cache: Option<ParseCache>,
}

/// Resolves documents of a Neva workspace.
///
/// Cheap to clone; clones share the loader and the parse cache.
#[derive(Clone)]
pub struct ResolverService {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ResolverService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverService")
            .field("config", &self.shared.config)
            .field("cached", &self.cache_len())
            .finish()
    }
}

impl ResolverService {
    pub fn new(config: ResolverConfig, loader: Arc<dyn SourceLoader>) -> Self {
        let cache = (config.cache_capacity > 0).then(|| ParseCache::new(config.cache_capacity));
        Self {
            shared: Arc::new(Shared {
                config,
                loader,
                cache,
            }),
        }
    }

    /// A service reading from the local filesystem.
    pub fn with_fs(config: ResolverConfig) -> Self {
        Self::new(config, Arc::new(FsLoader))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.shared.config
    }

    /// Resolve one document on the worker pool, bounded by the deadline.
    ///
    /// Called from a rayon worker, the document is resolved on that worker
    /// and the deadline cancels it cooperatively.
    pub fn resolve(&self, request: &ResolveFileRequest) -> Result<ResolveOutcome, ResolveError> {
        let service = self.clone();
        let request = request.clone();
        self.with_deadline(
            move |cancel| service.resolve_with_cancel(&request, cancel),
            || Err(ResolveError::Timeout),
        )
    }

    /// Resolve independent documents in parallel. Results follow request order.
    ///
    /// The deadline applies to the whole batch.
    pub fn resolve_many(
        &self,
        requests: &[ResolveFileRequest],
    ) -> Vec<Result<ResolveOutcome, ResolveError>> {
        let service = self.clone();
        let owned = requests.to_vec();
        let count = requests.len();
        self.with_deadline(
            move |cancel| {
                owned
                    .par_iter()
                    .map(|request| service.resolve_with_cancel(request, cancel))
                    .collect()
            },
            move || (0..count).map(|_| Err(ResolveError::Timeout)).collect(),
        )
    }

    /// Resolve one document on the calling thread.
    ///
    /// `cancel` is checked before every top-level declaration and between
    /// components; once it fires the result is [`ResolveError::Cancelled`].
    pub fn resolve_with_cancel(
        &self,
        request: &ResolveFileRequest,
        cancel: &CancellationToken,
    ) -> Result<ResolveOutcome, ResolveError> {
        let started = Instant::now();
        let config = &self.shared.config;
        let path = document_path(&request.workspace_uri, &request.document)?;
        let root = normalize(&request.workspace_uri.fs_path());
        if !self.shared.loader.is_dir(&root) {
            return Err(ResolveError::NotFound(root));
        }
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let file_name = request.document.display_name();
        debug!(document = %file_name, path = %path.display(), "resolving");

        let mut workspace = Workspace::new(&*self.shared.loader, root, cancel)
            .with_stdlib(config.stdlib_root.clone())
            .with_cache(self.shared.cache.as_ref());
        let lowered = workspace
            .load_file(&path, &file_name)
            .map_err(|error| match error {
                FileError::Load(error) => ResolveError::from(error),
                FileError::Syntax(fatal) => {
                    debug!(document = %file_name, position = %fatal.position, "unparseable file");
                    ResolveError::from(fatal)
                }
                FileError::Cancelled => ResolveError::Cancelled,
            })?;

        let mut diagnostics = DiagnosticCollector::new();
        diagnostics.extend_issues(&lowered.issues);

        let extraction = {
            let mut scope = Scope::new(&mut workspace, lowered.clone(), path.clone());
            extract(&mut scope, &lowered, &mut diagnostics)
        }
        .ok_or(ResolveError::Cancelled)?;

        let nodes_ports = build_index(&lowered.file, &extraction);
        debug_assert!(check_integrity(&lowered.file, &nodes_ports).is_ok());

        if config.check_network {
            check_network(&lowered.file, &extraction, &mut diagnostics);
        }
        let diagnostics = diagnostics.finish();

        if config.node_errors == NodeErrorPolicy::Fail {
            if let Some(first) = diagnostics.iter().find(|d| d.is_error()) {
                debug!(document = %file_name, code = %first.code, "failing on node error");
                return Err(ResolveError::from_diagnostic(first));
            }
        }

        let outcome = ResolveOutcome {
            response: ResolveFileResponse {
                file: lowered.file.clone(),
                extra: Extra { nodes_ports },
            },
            diagnostics,
        };
        info!(
            document = %file_name,
            components = outcome.response.extra.nodes_ports.len(),
            diagnostics = outcome.diagnostics.len(),
            partial = outcome.is_partial(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "resolved"
        );
        Ok(outcome)
    }

    /// Drop cached parses of one document.
    pub fn invalidate(&self, path: &Path) {
        if let Some(cache) = &self.shared.cache {
            cache.invalidate(&normalize(path));
        }
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.shared.cache {
            cache.clear();
        }
    }

    pub fn cache_len(&self) -> usize {
        self.shared.cache.as_ref().map_or(0, ParseCache::len)
    }

    /// Run `work` on the rayon pool and wait at most `config.deadline`.
    fn with_deadline<T: Send + 'static>(
        &self,
        work: impl FnOnce(&CancellationToken) -> T + Send + 'static,
        on_timeout: impl FnOnce() -> T,
    ) -> T {
        let cancel = CancellationToken::new();
        let Some(deadline) = self.shared.config.deadline else {
            return work(&cancel);
        };
        // A worker blocked on a spawned job can starve the pool.
        if rayon::current_thread_index().is_some() {
            return run_on_worker(deadline, cancel, work, on_timeout);
        }

        let (tx, rx) = mpsc::channel();
        let token = cancel.clone();
        rayon::spawn(move || {
            // The receiver is gone once the deadline has passed.
            let _ = tx.send(work(&token));
        });

        match rx.recv_timeout(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                warn!(deadline_ms = deadline.as_millis() as u64, "resolution timed out");
                on_timeout()
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("resolution worker exited without a result");
                on_timeout()
            }
        }
    }
}

/// Run `work` on the current thread while a watchdog cancels `cancel` once
/// `deadline` has passed.
fn run_on_worker<T>(
    deadline: Duration,
    cancel: CancellationToken,
    work: impl FnOnce(&CancellationToken) -> T,
    on_timeout: impl FnOnce() -> T,
) -> T {
    let (done, finished) = mpsc::channel::<()>();
    let token = cancel.clone();
    let watchdog = thread::Builder::new()
        .name("neva-deadline".to_string())
        .spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = finished.recv_timeout(deadline) {
                token.cancel();
            }
        });
    if let Err(error) = &watchdog {
        warn!(%error, "deadline watchdog unavailable");
    }

    let result = work(&cancel);
    drop(done);
    if cancel.is_cancelled() {
        warn!(deadline_ms = deadline.as_millis() as u64, "resolution timed out");
        return on_timeout();
    }
    result
}
