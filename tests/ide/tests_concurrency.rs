//! Cancellation, deadlines, batches and the parse cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use neva::project::LoadError;
use neva::{ErrorKind, MemoryLoader, ResolverConfig, ResolverService, SourceLoader};
use tokio_util::sync::CancellationToken;

use crate::helpers::source_fixtures::*;
use crate::helpers::workspace_helpers::*;

/// Delays every read.
struct SlowLoader {
    inner: MemoryLoader,
    delay: Duration,
}

impl SourceLoader for SlowLoader {
    fn read_document(&self, path: &Path) -> Result<String, LoadError> {
        thread::sleep(self.delay);
        self.inner.read_document(path)
    }

    fn package_documents(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        self.inner.package_documents(dir)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
}

/// Cancels the token as soon as the document has been read.
struct CancellingLoader {
    inner: MemoryLoader,
    cancel: CancellationToken,
}

impl SourceLoader for CancellingLoader {
    fn read_document(&self, path: &Path) -> Result<String, LoadError> {
        self.cancel.cancel();
        self.inner.read_document(path)
    }

    fn package_documents(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        self.inner.package_documents(dir)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
}

fn scenario_loader() -> MemoryLoader {
    MemoryLoader::new().with_file("/ws/main.neva", SCENARIO)
}

#[test]
fn test_deadline_expiry_is_timeout() {
    let loader = SlowLoader {
        inner: scenario_loader(),
        delay: Duration::from_millis(500),
    };
    let config = ResolverConfig::default().with_deadline(Some(Duration::from_millis(20)));
    let service = ResolverService::new(config, Arc::new(loader));

    let error = service
        .resolve(&request_for(Path::new("/ws"), Path::new("/ws/main.neva")))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Timeout);
}

#[test]
fn test_deadline_holds_on_a_busy_worker_pool() {
    let loader = SlowLoader {
        inner: scenario_loader(),
        delay: Duration::from_millis(300),
    };
    let config = ResolverConfig::default().with_deadline(Some(Duration::from_millis(20)));
    let service = ResolverService::new(config, Arc::new(loader));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();

    let error = pool
        .install(|| service.resolve(&request_for(Path::new("/ws"), Path::new("/ws/main.neva"))))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Timeout);
}

#[test]
fn test_no_deadline_waits() {
    let loader = SlowLoader {
        inner: scenario_loader(),
        delay: Duration::from_millis(30),
    };
    let config = ResolverConfig::default().with_deadline(None);
    let service = ResolverService::new(config, Arc::new(loader));

    let outcome = service
        .resolve(&request_for(Path::new("/ws"), Path::new("/ws/main.neva")))
        .unwrap();
    assert!(outcome.response.extra.nodes_ports.contains_key("compA"));
}

#[test]
fn test_cancel_during_parse() {
    let cancel = CancellationToken::new();
    let loader = CancellingLoader {
        inner: scenario_loader(),
        cancel: cancel.clone(),
    };
    let service = ResolverService::new(ResolverConfig::default(), Arc::new(loader));

    let error = service
        .resolve_with_cancel(
            &request_for(Path::new("/ws"), Path::new("/ws/main.neva")),
            &cancel,
        )
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Cancelled);
    assert_eq!(service.cache_len(), 0);
}

#[test]
fn test_resolve_many_keeps_request_order() {
    let loader = MemoryLoader::new()
        .with_file("/ws/a.neva", SCENARIO)
        .with_file("/ws/b.neva", EMPTY_PORTS)
        .with_file("/ws/c.neva", BROKEN_BOUNDARY);
    let service = ResolverService::new(ResolverConfig::default(), Arc::new(loader));
    let requests: Vec<_> = ["a", "b", "missing", "c"]
        .iter()
        .map(|name| {
            request_for(
                Path::new("/ws"),
                &Path::new("/ws").join(format!("{name}.neva")),
            )
        })
        .collect();

    let results = service.resolve_many(&requests);
    assert_eq!(results.len(), 4);
    assert!(results[0].as_ref().unwrap().response.extra.nodes_ports.contains_key("compA"));
    assert!(results[1].as_ref().unwrap().response.extra.nodes_ports.contains_key("Silent"));
    assert_eq!(results[2].as_ref().unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(results[3].as_ref().unwrap_err().kind(), ErrorKind::Parse);
}

#[test]
fn test_cache_follows_content_changes() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", SCENARIO);
    let service = fs_service(ResolverConfig::default().with_cache_capacity(8));
    let request = ws.request("app/main.neva");

    service.resolve(&request).unwrap();
    service.resolve(&request).unwrap();
    assert_eq!(service.cache_len(), 1);

    ws.write("app/main.neva", EMPTY_PORTS);
    let outcome = service.resolve(&request).unwrap();
    assert!(outcome.response.extra.nodes_ports.contains_key("Silent"));
    assert_eq!(service.cache_len(), 1);

    service.clear_cache();
    assert_eq!(service.cache_len(), 0);
}

#[test]
fn test_concurrent_resolutions_share_one_service() {
    let ws = TestWorkspace::new();
    ws.write("app/main.neva", FULL_PROGRAM);
    let service = fs_service(ResolverConfig::default());
    let request = ws.request("app/main.neva");
    let expected = service.resolve(&request).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            let request = request.clone();
            thread::spawn(move || service.resolve(&request).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
