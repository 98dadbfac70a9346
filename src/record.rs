//! One row of the benchmark log.
//!
//! Values are kept as numbers; the precision of the persisted text is fixed by
//! the serializers below (times to the microsecond, memory to two decimals,
//! relative error in scientific notation with two digits).

use serde::{Serialize, Serializer};

/// Timestamp format of the `timestamp` column (ISO-8601, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Column names in output order.
pub const COLUMNS: [&str; 15] = [
    "os",
    "timestamp",
    "matrixName",
    "rows",
    "cols",
    "nonZeros",
    "loadTime",
    "loadMem",
    "decompTime",
    "decompMem",
    "decompPeakMem",
    "solveTime",
    "solveMem",
    "solvePeakMem",
    "relativeError",
];

/// The measurements of one fully benchmarked matrix.
///
/// The field order is the column order of the log file. Memory deltas may be
/// negative when the allocator returned memory during a stage; peaks of `0.0`
/// mean the platform exposes no peak counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRecord {
    pub os: String,
    pub timestamp: String,
    pub matrix_name: String,
    pub rows: usize,
    pub cols: usize,
    pub non_zeros: usize,
    #[serde(serialize_with = "seconds")]
    pub load_time: f64,
    #[serde(serialize_with = "megabytes")]
    pub load_mem: f64,
    #[serde(serialize_with = "seconds")]
    pub decomp_time: f64,
    #[serde(serialize_with = "megabytes")]
    pub decomp_mem: f64,
    #[serde(serialize_with = "megabytes")]
    pub decomp_peak_mem: f64,
    #[serde(serialize_with = "seconds")]
    pub solve_time: f64,
    #[serde(serialize_with = "megabytes")]
    pub solve_mem: f64,
    #[serde(serialize_with = "megabytes")]
    pub solve_peak_mem: f64,
    #[serde(serialize_with = "scientific")]
    pub relative_error: f64,
}

impl BenchmarkRecord {
    /// Wall-clock time of the three stages together.
    pub fn total_time(&self) -> f64 {
        self.load_time + self.decomp_time + self.solve_time
    }
}

fn seconds<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:.6}"))
}

fn megabytes<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:.2}"))
}

fn scientific<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_scientific(*value))
}

/// Formats `value` with two decimals and a signed exponent of at least two
/// digits (`1.00e+00`, `1.23e-15`).
fn format_scientific(value: f64) -> String {
    let text = format!("{value:.2e}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        // NaN and infinities carry no exponent.
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}
