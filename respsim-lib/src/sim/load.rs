use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use rama::telemetry::tracing;

/// Size of a single ballast allocation.
pub const BALLAST_UNIT: usize = 1024 * 1024;

static RETAINED_BALLAST_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Bytes held by all live [`MemoryBallast`] values of this process.
pub fn retained_ballast_bytes() -> usize {
    RETAINED_BALLAST_BYTES.load(Ordering::Relaxed)
}

/// Outcome of a CPU burn, the checksum keeps the work observable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuBurn {
    pub elapsed: Duration,
    pub rounds: u64,
    pub checksum: f64,
}

/// Busy loop of floating point work until `budget` of wall-clock time passed.
///
/// Blocks the calling thread, see [`simulate_cpu`] for async contexts.
pub fn burn_cpu(budget: Duration) -> CpuBurn {
    let started = Instant::now();
    let mut rounds = 0u64;
    let mut x = 1.000_001_f64;
    let mut checksum = 0.0_f64;

    while started.elapsed() < budget {
        for i in 0..1024 {
            x = (x * 1.000_000_3 + f64::from(i)).sqrt();
            checksum += x;
        }
        checksum = std::hint::black_box(checksum);
        rounds += 1;
    }

    CpuBurn {
        elapsed: started.elapsed(),
        rounds,
        checksum,
    }
}

/// Burn CPU on the blocking pool so async workers keep serving other requests.
pub async fn simulate_cpu(budget: Duration) -> Option<CpuBurn> {
    if budget.is_zero() {
        return None;
    }

    match tokio::task::spawn_blocking(move || burn_cpu(budget)).await {
        Ok(burn) => {
            tracing::debug!(
                elapsed_ms = burn.elapsed.as_millis() as u64,
                rounds = burn.rounds,
                checksum = burn.checksum,
                "cpu burn completed"
            );
            Some(burn)
        }
        Err(err) => {
            tracing::error!("cpu burn task failed: {err}");
            None
        }
    }
}

/// Memory retained for the lifetime of one request.
///
/// Allocated in [`BALLAST_UNIT`] blocks whose pages are written on allocation,
/// so the memory is resident and not merely reserved. Released on drop.
#[derive(Debug, Default)]
pub struct MemoryBallast {
    blocks: Vec<Box<[u8]>>,
}

impl MemoryBallast {
    pub fn allocate(megabytes: usize) -> Self {
        let blocks = (0..megabytes)
            .map(|i| vec![(i as u8) | 1; BALLAST_UNIT].into_boxed_slice())
            .collect::<Vec<_>>();
        RETAINED_BALLAST_BYTES.fetch_add(blocks.len() * BALLAST_UNIT, Ordering::Relaxed);
        Self { blocks }
    }

    pub fn size_bytes(&self) -> usize {
        self.blocks.len() * BALLAST_UNIT
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Drop for MemoryBallast {
    fn drop(&mut self) {
        if !self.blocks.is_empty() {
            RETAINED_BALLAST_BYTES.fetch_sub(self.size_bytes(), Ordering::Relaxed);
            tracing::trace!(size_bytes = self.size_bytes(), "release memory ballast");
        }
    }
}

/// Allocate the ballast on the blocking pool, writing hundreds of MiB takes a while.
pub async fn simulate_memory(megabytes: usize) -> MemoryBallast {
    if megabytes == 0 {
        return MemoryBallast::default();
    }

    match tokio::task::spawn_blocking(move || MemoryBallast::allocate(megabytes)).await {
        Ok(ballast) => {
            tracing::debug!(
                size_bytes = ballast.size_bytes(),
                retained_bytes = retained_ballast_bytes(),
                "memory ballast acquired"
            );
            ballast
        }
        Err(err) => {
            tracing::error!("memory ballast allocation task failed: {err}");
            MemoryBallast::default()
        }
    }
}
