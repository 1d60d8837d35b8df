//! 프로세스 메모리 사용량 조회

/// 현재 RSS와 최대 RSS (바이트)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub current_bytes: u64,
    pub peak_bytes: u64,
}

impl MemorySnapshot {
    /// 지원하지 않는 플랫폼에서는 0을 반환합니다.
    pub fn capture() -> Self {
        #[cfg(target_os = "linux")]
        {
            match std::fs::read_to_string("/proc/self/status") {
                Ok(status) => Self::from_proc_status(&status),
                Err(_) => Self::default(),
            }
        }

        #[cfg(not(target_os = "linux"))]
        {
            Self::default()
        }
    }

    /// `/proc/self/status` 내용에서 VmRSS / VmHWM을 읽습니다.
    pub fn from_proc_status(status: &str) -> Self {
        let mut snapshot = Self::default();
        for line in status.lines() {
            if let Some(value) = line.strip_prefix("VmRSS:") {
                snapshot.current_bytes = parse_kb(value);
            } else if let Some(value) = line.strip_prefix("VmHWM:") {
                snapshot.peak_bytes = parse_kb(value);
            }
        }
        snapshot
    }
}

fn parse_kb(value: &str) -> u64 {
    value
        .split_whitespace()
        .next()
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
        .unwrap_or(0)
}

/// 바이트 수를 `"12.3MB"` 형태로 표시합니다.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
}
