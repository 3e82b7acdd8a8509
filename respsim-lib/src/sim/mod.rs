//! Response generation pipeline.
//!
//! Stages run in this order for every request:
//! parameter resolution, fault injection, cpu burn, memory hold,
//! status or redirect decision, range resolution and finally
//! content synthesis driven by the throttled streamer.

mod content;
mod fault;
mod finalize;
mod load;
mod params;
mod range;
mod stream;

pub use self::{
    content::{ContentFlavor, Synthesizer, html_template, json_template},
    fault::{Dice, FaultCause, FaultPlan, ThreadDice},
    finalize::{BodyPlan, StatusDecision, decide_status, plan_body, status_permits_body},
    load::{
        BALLAST_UNIT, CpuBurn, MemoryBallast, burn_cpu, retained_ballast_bytes, simulate_cpu,
        simulate_memory,
    },
    params::{ALLOWED_STATUS_CODES, RawParams, RequestConfig, SimMethod, is_redirect_status},
    range::{ByteRangeSpec, RangeOutcome, ResolvedRange, resolve_range},
    stream::{
        Chunk, ChunkPlan, PacingPolicy, StreamState, ThrottledStream, empty_body_holding,
    },
};
