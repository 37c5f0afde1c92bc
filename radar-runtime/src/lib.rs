//! Tokio runtime owned by the `radar` binary.
//!
//! The runtime carries one [`CancellationToken`] shared by every ingest
//! cycle it runs; cancelling it stops new items from starting and tears down
//! in-flight browser sessions.
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct RadarHandle {
    inner: Handle,
    cancel: Arc<CancellationToken>,
}

pub struct RadarRuntime {
    runtime: Runtime,
    cancel: Arc<CancellationToken>,
}

impl RadarRuntime {
    /// Build a multi-threaded runtime.
    ///
    /// ```
    /// use radar_runtime::RadarRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = RadarRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        Ok(Self {
            runtime,
            cancel: Arc::new(CancellationToken::new()),
        })
    }

    /// Cloneable handle for spawning tasks and sharing cancellation.
    ///
    /// ```
    /// use radar_runtime::RadarRuntime;
    ///
    /// let runtime = RadarRuntime::build("handle-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// assert!(!handle.cancellation().is_cancelled());
    /// ```
    pub fn handle(&self) -> RadarHandle {
        RadarHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel the shared token when the process receives Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("runtime.ctrl_c");
                cancel.cancel();
            }
        });
    }

    /// Cancel outstanding work and shut the runtime down.
    ///
    /// ```
    /// use radar_runtime::RadarRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = RadarRuntime::build("shutdown-example", Some(1)).unwrap();
    /// let token = runtime.handle().cancellation();
    /// runtime.shutdown(Duration::from_millis(5));
    /// assert!(token.is_cancelled());
    /// ```
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl RadarHandle {
    /// Spawn a future onto the shared runtime.
    ///
    /// ```
    /// use radar_runtime::RadarRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = RadarRuntime::build("handle-doctest", Some(1)).unwrap();
    /// let task = runtime.handle().spawn(async { 21 * 2 });
    /// let result = runtime.block_on(async move { task.await.unwrap() });
    /// assert_eq!(result, 42);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// Child token: cancelled with the runtime, but cancellable on its own.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn cancellation(&self) -> Arc<CancellationToken> {
        self.cancel.clone()
    }
}
