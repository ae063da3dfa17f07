//! Process resource usage.

use serde::Serialize;

/// Memory held by the current process, in bytes. Zero when the platform
/// does not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

/// Sample the current process's memory.
pub fn current_memory() -> MemoryUsage {
    use sysinfo::{System, get_current_pid};

    let pid = match get_current_pid() {
        Ok(pid) => pid,
        Err(e) => {
            tracing::debug!(error = e, "Cannot resolve current pid");
            return MemoryUsage::default();
        }
    };

    let mut sys = System::new();
    if !sys.refresh_process(pid) {
        return MemoryUsage::default();
    }

    sys.process(pid)
        .map(|process| MemoryUsage {
            resident_bytes: process.memory(),
            virtual_bytes: process.virtual_memory(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    fn test_current_process_uses_memory() {
        let memory = current_memory();
        assert!(memory.resident_bytes > 0);
    }
}
