//! HTTP surface of the simulator.

mod encoding;
mod gate;
mod headers;
mod service;

pub use self::{
    encoding::accepts_gzip,
    gate::is_authorized,
    headers::{
        CookieBatch, FILL_VALUE_LEN, SEED_HEADER, insert_cors_headers, insert_header_fill,
    },
    service::{INJECTED_FAILURE_BODY, SimulatorService, UNAUTHORIZED_BODY},
};
