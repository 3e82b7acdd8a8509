pub const fn project_name() -> &'static str {
    "respsim"
}

/// Value used for the `Server` header of every simulated response.
pub const fn network_service_identifier() -> &'static str {
    concat!("respsim/", env!("CARGO_PKG_VERSION"))
}
