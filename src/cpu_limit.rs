//! Limiting the number of CPU-hungry external processes.

use std::sync::LazyLock;

use tokio::sync::Semaphore;

use crate::prelude::*;

/// One permit per CPU, shared by every `pdfinfo`, `pdftocairo` and
/// `tesseract` process we start.
static CPU_SEMAPHORE: LazyLock<Semaphore> = LazyLock::new(|| Semaphore::new(num_cpus::get()));

/// Call an async function while holding a permit from the CPU semaphore.
///
/// Rasterizing and OCRing each keep a core busy, and with `--jobs` times
/// `--page-jobs` pages in flight we could otherwise start far more processes
/// than we have cores. In-process work doesn't need this, since it already
/// runs on Tokio's bounded blocking pool.
#[instrument(level = "trace", skip_all)]
pub async fn with_cpu_semaphore<Func, Fut, R>(f: Func) -> Result<R>
where
    Func: FnOnce() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let _permit = CPU_SEMAPHORE
        .acquire()
        .await
        .context("Could not acquire CPU permit")?;
    f().await
}
