/// `MM:SS` for a remaining duration, with seconds rounded up.
///
/// Minutes do not wrap at the hour, so a 90 minute countdown shows `90:00`.
pub fn format_remaining(remaining_ms: u64) -> String {
    let total_secs = remaining_ms.div_ceil(1000);
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
