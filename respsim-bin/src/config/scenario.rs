use respsim_lib::sim::RawParams;

/// High level simulation scenarios.
/// Each scenario is a preset of default request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum Scenario {
    /// Ideal conditions.
    /// Used to measure pure client and network overhead.
    #[default]
    Baseline,

    /// Slow time to first byte, bodies stream at full speed afterwards.
    /// Used to observe connect and header timeouts.
    SlowStart,

    /// Large bodies delivered at a limited rate with some jitter.
    /// Used to test download progress and read timeouts.
    Throttled,

    /// Unstable upstream behavior.
    /// Used to test error handling and retries.
    FlakyUpstream,

    /// Every request burns CPU and holds memory.
    /// Used to put the simulator host itself under pressure.
    HeavyLoad,
}

impl Scenario {
    /// Default request parameters associated with this scenario.
    pub fn default_params(self) -> RawParams {
        fn value(v: &str) -> Option<String> {
            Some(v.to_owned())
        }

        match self {
            Scenario::Baseline => RawParams::default(),

            Scenario::SlowStart => RawParams {
                ttfb: value("2000"),
                jitter: value("50"),
                ..Default::default()
            },

            Scenario::Throttled => {
                // 1 MiB at 64 KiB/s: ~16 seconds per body
                RawParams {
                    bytes: value("1048576"),
                    bps: value("65536"),
                    chunk: value("8192"),
                    jitter: value("25"),
                    ..Default::default()
                }
            }

            Scenario::FlakyUpstream => {
                // Server occasionally errors or stalls.
                RawParams {
                    ttfb: value("100"),
                    jitter: value("500"),
                    failrate: value("0.05"),
                    burst_n: value("20"),
                    ..Default::default()
                }
            }

            Scenario::HeavyLoad => RawParams {
                bytes: value("262144"),
                cpu_ms: value("200"),
                mem_mb: value("32"),
                ..Default::default()
            },
        }
    }
}
