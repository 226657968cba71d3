//! Process memory probe for the status line.

const MB: u64 = 1024 * 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryUsage {
    /// Status line text drawn in the bottom-right corner.
    pub fn label(&self) -> String {
        format!(
            "Memory usage: {} MB of {} MB",
            self.used_bytes / MB,
            self.total_bytes / MB
        )
    }
}

/// Resident vs. virtual size of the current process, when the platform exposes it.
pub fn current_usage() -> Option<MemoryUsage> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    parse_statm(&statm, page_size())
}

fn parse_statm(statm: &str, page_size: u64) -> Option<MemoryUsage> {
    let mut fields = statm.split_whitespace();
    let total_pages: u64 = fields.next()?.parse().ok()?;
    let resident_pages: u64 = fields.next()?.parse().ok()?;
    Some(MemoryUsage {
        used_bytes: resident_pages.saturating_mul(page_size),
        total_bytes: total_pages.saturating_mul(page_size),
    })
}

#[cfg(unix)]
fn page_size() -> u64 {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        4096
    }
}

#[cfg(not(unix))]
fn page_size() -> u64 {
    4096
}

#[cfg(test)]
mod tests {
    use super::{parse_statm, MemoryUsage};

    #[test]
    fn parses_statm_pages() {
        let usage = parse_statm("2560 512 100 1 0 300 0\n", 4096).expect("statm parses");
        assert_eq!(
            usage,
            MemoryUsage {
                used_bytes: 512 * 4096,
                total_bytes: 2560 * 4096,
            }
        );
        assert_eq!(usage.label(), "Memory usage: 2 MB of 10 MB");
    }

    #[test]
    fn malformed_statm_is_none() {
        assert_eq!(parse_statm("", 4096), None);
        assert_eq!(parse_statm("abc 12", 4096), None);
    }
}
