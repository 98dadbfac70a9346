//! Process memory introspection and platform identification.
//!
//! Memory is read from `/proc/self/status` on Linux. Other hosts read the
//! resident set size through `sysinfo`, which exposes no peak counter, so
//! their peak is [`MemoryReading::Unsupported`] and persisted as `0.0` MB.
//! A `0.0` peak in a log row therefore means "unknown", not a real zero
//! reading.

use std::sync::{Mutex, Once};
use sysinfo::{Pid, ProcessesToUpdate, System};

const KB_PER_MB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A single memory sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemoryReading {
    /// A value reported by the operating system, in megabytes.
    Measured(f64),
    /// The host exposes no counter for this quantity (degraded measurement).
    Unsupported,
}

impl MemoryReading {
    /// Returns the reading in megabytes, mapping `Unsupported` to the `0.0` sentinel.
    pub fn as_mb(self) -> f64 {
        match self {
            MemoryReading::Measured(mb) => mb,
            MemoryReading::Unsupported => 0.0,
        }
    }

    pub fn is_supported(self) -> bool {
        matches!(self, MemoryReading::Measured(_))
    }
}

/// Read-only access to the memory usage of the running process.
///
/// Implementations must never fail: when the underlying OS facility is not
/// available they return [`MemoryReading::Unsupported`].
pub trait MemoryProbe {
    /// Current resident memory of the process.
    fn current(&self) -> MemoryReading;

    /// Peak resident memory observed for the process so far.
    fn peak(&self) -> MemoryReading;

    fn current_memory_mb(&self) -> f64 {
        self.current().as_mb()
    }

    fn peak_memory_mb(&self) -> f64 {
        self.peak().as_mb()
    }
}

impl<P: MemoryProbe + ?Sized> MemoryProbe for Box<P> {
    fn current(&self) -> MemoryReading {
        (**self).current()
    }

    fn peak(&self) -> MemoryReading {
        (**self).peak()
    }
}

/// Reads `VmRSS` (current) and `VmHWM` (peak) from `/proc/self/status`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcStatusProbe;

impl ProcStatusProbe {
    fn read_field(&self, field: &str) -> MemoryReading {
        let status_content = match std::fs::read_to_string("/proc/self/status") {
            Ok(content) => content,
            Err(e) => {
                warn_degraded(&format!("cannot read /proc/self/status: {e}"));
                return MemoryReading::Unsupported;
            }
        };

        match parse_status_kb(&status_content, field) {
            Some(kb) => MemoryReading::Measured(kb as f64 / KB_PER_MB),
            None => {
                warn_degraded(&format!("field {field} missing from /proc/self/status"));
                MemoryReading::Unsupported
            }
        }
    }
}

impl MemoryProbe for ProcStatusProbe {
    fn current(&self) -> MemoryReading {
        self.read_field("VmRSS:")
    }

    fn peak(&self) -> MemoryReading {
        self.read_field("VmHWM:")
    }
}

/// Reads the resident set size of the current process through `sysinfo`.
///
/// Used where `/proc` is not available. Peak memory is always
/// [`MemoryReading::Unsupported`].
#[derive(Debug)]
pub struct SysinfoProbe {
    system: Mutex<System>,
    pid: Pid,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: Pid::from_u32(std::process::id()),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoProbe {
    fn current(&self) -> MemoryReading {
        let Ok(mut system) = self.system.lock() else {
            warn_degraded("process table lock poisoned");
            return MemoryReading::Unsupported;
        };
        system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        match system.process(self.pid) {
            Some(process) => MemoryReading::Measured(process.memory() as f64 / BYTES_PER_MB),
            None => {
                warn_degraded("current process missing from the process table");
                MemoryReading::Unsupported
            }
        }
    }

    fn peak(&self) -> MemoryReading {
        MemoryReading::Unsupported
    }
}

/// Probe for hosts without a supported memory reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProbe;

impl MemoryProbe for UnsupportedProbe {
    fn current(&self) -> MemoryReading {
        MemoryReading::Unsupported
    }

    fn peak(&self) -> MemoryReading {
        MemoryReading::Unsupported
    }
}

/// Returns the probe appropriate for the host platform.
#[cfg(target_os = "linux")]
pub fn default_probe() -> Box<dyn MemoryProbe> {
    Box::new(ProcStatusProbe)
}

#[cfg(not(target_os = "linux"))]
pub fn default_probe() -> Box<dyn MemoryProbe> {
    warn_degraded("peak memory is only measured on Linux; reporting 0 MB");
    Box::new(SysinfoProbe::new())
}

/// Extracts the kB value of a `/proc/<pid>/status` line such as `VmRSS:   1234 kB`.
fn parse_status_kb(status: &str, field: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with(field))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|value| value.parse().ok())
}

fn warn_degraded(reason: &str) {
    static WARN_ONCE: Once = Once::new();
    WARN_ONCE.call_once(|| {
        log::warn!("Degraded memory measurement ({reason}); affected values are logged as 0.");
    });
}

/// Human-readable name of the host operating system, as written in the `os` column.
pub fn platform_name() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "windows" => "Windows".to_string(),
        "macos" => "Darwin".to_string(),
        other => other.to_string(),
    }
}

/// Lowercase platform name used as the log file prefix.
pub fn platform_tag() -> String {
    platform_name().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tchol-bench\nVmPeak:\t  204800 kB\nVmHWM:\t    8192 kB\nVmRSS:\t    4096 kB\n";

    #[test]
    fn test_parse_status_fields() {
        assert_eq!(parse_status_kb(STATUS, "VmRSS:"), Some(4096));
        assert_eq!(parse_status_kb(STATUS, "VmHWM:"), Some(8192));
        assert_eq!(parse_status_kb(STATUS, "VmSwap:"), None);
    }

    #[test]
    fn test_unsupported_is_distinguishable_from_measured_zero() {
        let probe = UnsupportedProbe;
        assert_eq!(probe.peak(), MemoryReading::Unsupported);
        assert!(!probe.peak().is_supported());
        assert!(MemoryReading::Measured(0.0).is_supported());
        // Both persist as the same value.
        assert_eq!(probe.peak_memory_mb(), MemoryReading::Measured(0.0).as_mb());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_proc_status_probe_reports_memory() {
        let probe = ProcStatusProbe;
        let current = probe.current();
        let peak = probe.peak();
        assert!(current.is_supported());
        assert!(peak.is_supported());
        assert!(current.as_mb() > 0.0);
        assert!(peak.as_mb() >= current.as_mb());
    }

    #[test]
    fn test_sysinfo_reports_current_but_not_peak() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let probe = SysinfoProbe::new();
        let current = probe.current();
        assert!(current.is_supported());
        assert!(current.as_mb() > 0.0);
        assert_eq!(probe.peak(), MemoryReading::Unsupported);
    }

    #[test]
    fn test_default_reader_measures_current_memory() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        assert!(default_probe().current().is_supported());
        assert!(default_probe().current_memory_mb() > 0.0);
    }

    #[test]
    fn test_platform_tag_is_lowercase() {
        let tag = platform_tag();
        assert_eq!(tag, tag.to_lowercase());
        assert!(!tag.is_empty());
    }
}
