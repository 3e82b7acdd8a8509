use std::{
    io::{self, Write as _},
    num::NonZeroU64,
    time::Duration,
};

use flate2::{Compression, write::GzEncoder};
use rama::{bytes::Bytes, http::Body, telemetry::tracing};

use super::{Dice, MemoryBallast, ResolvedRange, Synthesizer, ThreadDice};

/// Location of one chunk within the virtual body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub len: usize,
}

/// Splits a resolved range into sequential chunks of at most `chunk_size` bytes.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    next_offset: u64,
    end_exclusive: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    pub fn new(range: Option<ResolvedRange>, chunk_size: usize) -> Self {
        let (next_offset, end_exclusive) = match range {
            Some(range) => (range.start, range.end + 1),
            None => (0, 0),
        };
        Self {
            next_offset,
            end_exclusive,
            chunk_size: (chunk_size as u64).max(1),
        }
    }

    pub fn remaining(&self) -> u64 {
        self.end_exclusive - self.next_offset
    }
}

impl Iterator for ChunkPlan {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.remaining();
        if remaining == 0 {
            return None;
        }
        // bounded by chunk_size, which came from a usize
        let len = remaining.min(self.chunk_size) as usize;
        let chunk = Chunk {
            offset: self.next_offset,
            len,
        };
        self.next_offset += len as u64;
        Some(chunk)
    }
}

/// Delay inserted between two chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub chunk_size: usize,
    pub bytes_per_second: Option<NonZeroU64>,
    pub jitter_max: Duration,
}

impl PacingPolicy {
    /// Deterministic part of the delay: `chunk_size / bytes_per_second` seconds.
    pub fn pacing_delay(&self) -> Duration {
        match self.bytes_per_second {
            Some(bps) => Duration::from_secs_f64(self.chunk_size as f64 / bps.get() as f64),
            None => Duration::ZERO,
        }
    }

    /// Full delay to wait after a (non-final) chunk: pacing plus a jitter draw.
    pub fn delay_after_chunk(&self, dice: &mut impl Dice) -> Duration {
        let jitter_ms = self.jitter_max.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(dice.uniform_inclusive(0, jitter_ms))
        } else {
            Duration::ZERO
        };
        self.pacing_delay() + jitter
    }
}

/// Byte counters of one stream, counting uncompressed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamState {
    pub bytes_sent: u64,
    pub bytes_remaining: u64,
}

/// Gzip encoder emitting one independently flushed frame per chunk.
struct GzipFramer {
    encoder: GzEncoder<Vec<u8>>,
}

impl GzipFramer {
    fn new() -> Self {
        Self {
            encoder: GzEncoder::new(Vec::new(), Compression::fast()),
        }
    }

    fn encode(&mut self, data: &[u8]) -> io::Result<Bytes> {
        self.encoder.write_all(data)?;
        // sync flush, the client can decode everything received so far
        self.encoder.flush()?;
        Ok(Bytes::from(std::mem::take(self.encoder.get_mut())))
    }

    fn finish(self) -> io::Result<Bytes> {
        self.encoder.finish().map(Bytes::from)
    }
}

impl std::fmt::Debug for GzipFramer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipFramer").finish_non_exhaustive()
    }
}

/// Pull based, paced producer of the body chunks of one response.
///
/// Owns the request's [`MemoryBallast`], so the ballast is released
/// once the stream completes or is dropped by the transport.
#[derive(Debug)]
pub struct ThrottledStream<D = ThreadDice> {
    plan: ChunkPlan,
    synth: Synthesizer,
    pacing: PacingPolicy,
    state: StreamState,
    dice: D,
    pending_delay: Option<Duration>,
    gzip: Option<GzipFramer>,
    finished: bool,
    _ballast: MemoryBallast,
}

impl ThrottledStream<ThreadDice> {
    pub fn new(
        range: Option<ResolvedRange>,
        synth: Synthesizer,
        pacing: PacingPolicy,
        ballast: MemoryBallast,
    ) -> Self {
        Self::new_with_dice(range, synth, pacing, ballast, ThreadDice)
    }
}

impl<D: Dice> ThrottledStream<D> {
    pub fn new_with_dice(
        range: Option<ResolvedRange>,
        synth: Synthesizer,
        pacing: PacingPolicy,
        ballast: MemoryBallast,
        dice: D,
    ) -> Self {
        let plan = ChunkPlan::new(range, pacing.chunk_size);
        let state = StreamState {
            bytes_sent: 0,
            bytes_remaining: plan.remaining(),
        };
        Self {
            plan,
            synth,
            pacing,
            state,
            dice,
            pending_delay: None,
            gzip: None,
            finished: false,
            _ballast: ballast,
        }
    }

    /// Compress every chunk with gzip.
    pub fn with_gzip(mut self) -> Self {
        self.gzip = Some(GzipFramer::new());
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Next frame to write, `None` once the full range was produced.
    ///
    /// Waits for the pacing delay owed by the previous chunk first,
    /// no delay follows the final chunk.
    pub async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        if let Some(delay) = self.pending_delay.take()
            && !delay.is_zero()
        {
            tokio::time::sleep(delay).await;
        }

        let Some(chunk) = self.plan.next() else {
            return self.finish();
        };

        let data = self.synth.fill(chunk.offset, chunk.len);
        self.state.bytes_sent += chunk.len as u64;
        self.state.bytes_remaining -= chunk.len as u64;
        tracing::trace!(
            offset = chunk.offset,
            len = chunk.len,
            bytes_remaining = self.state.bytes_remaining,
            "emit chunk"
        );

        if self.state.bytes_remaining > 0 {
            self.pending_delay = Some(self.pacing.delay_after_chunk(&mut self.dice));
        }

        match self.gzip.as_mut() {
            Some(gzip) => Some(gzip.encode(&data)),
            None => Some(Ok(data)),
        }
    }

    fn finish(&mut self) -> Option<io::Result<Bytes>> {
        if let Some(gzip) = self.gzip.take() {
            return Some(gzip.finish());
        }
        if !self.finished {
            self.finished = true;
            tracing::debug!(
                bytes_sent = self.state.bytes_sent,
                flavor = %self.synth.flavor(),
                "body stream completed"
            );
        }
        None
    }
}

impl<D: Dice + Send + 'static> ThrottledStream<D> {
    /// Turn into a streaming body, each chunk becomes its own frame.
    pub fn into_body(self) -> Body {
        Body::from_stream(futures::stream::unfold(self, |mut stream| async move {
            let item = stream.next_chunk().await?;
            Some((item, stream))
        }))
    }
}

/// Body without content that keeps `ballast` alive until the transport
/// drains or drops the body, i.e. after the response head went out.
pub fn empty_body_holding(ballast: MemoryBallast) -> Body {
    if ballast.is_empty() {
        return Body::empty();
    }
    Body::from_stream(futures::stream::unfold(ballast, |ballast| async move {
        drop(ballast);
        None::<(io::Result<Bytes>, MemoryBallast)>
    }))
}

impl<D> Drop for ThrottledStream<D> {
    fn drop(&mut self) {
        if !self.finished && self.state.bytes_remaining > 0 {
            tracing::debug!(
                bytes_sent = self.state.bytes_sent,
                bytes_remaining = self.state.bytes_remaining,
                "body stream dropped before completion: release request resources"
            );
        }
    }
}
