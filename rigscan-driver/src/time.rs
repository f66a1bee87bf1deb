use std::time::Instant;

#[cfg(test)]
pub(crate) fn sleep_ms(duration_ms: u64) {
    std::thread::sleep(std::time::Duration::from_millis(duration_ms));
}

/// Sleeps until `deadline`. Returns at once when it has already passed.
pub(crate) fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        std::thread::sleep(deadline - now);
    }
}
