use camino::Utf8PathBuf;
use thiserror::Error;

/// Faults in the harness itself.
///
/// DUT misbehaviour is never reported through this type: divergences are
/// recorded by the [`Checker`](crate::Checker) and the run keeps going.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{dut} has no signal named `{signal}`")]
    UnknownSignal { dut: &'static str, signal: String },

    #[error("signal `{signal}` is driven by the DUT and cannot be written")]
    ReadOnlySignal { signal: String },

    #[error("value {value:#x} does not fit in {width}-bit signal `{signal}`")]
    ValueTooWide {
        signal: String,
        value: u64,
        width: u32,
    },

    #[error("clock `{signal}` is owned by the clock driver")]
    ClockOwned { signal: String },

    #[error("{dut} has no {role} port")]
    MissingPort { dut: &'static str, role: &'static str },

    #[error("address {addr} is outside a {capacity}-byte memory")]
    AddressOutOfRange { addr: usize, capacity: usize },

    #[error("stalled waiting for `{signal}` for {cycles} cycles")]
    Stalled { signal: String, cycles: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config {path}")]
    ConfigRead {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    ConfigParse(#[from] toml::de::Error),

    #[error("verilator: {0}")]
    Verilator(String),

    #[error("sweep worker failed: {0}")]
    Worker(String),
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
