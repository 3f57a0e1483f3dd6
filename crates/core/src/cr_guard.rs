//! Debounced uniqueness check for the CR number.
//!
//! Every keystroke clears the displayed error and restarts a quiet-period timer. Only when
//! the timer runs out is the current value sent for an existence check. Results for a value
//! that has since been edited are dropped.
//!
//! The guard is a plain state machine: callers pass in `Instant`s and perform the network
//! call themselves, which keeps it deterministic under test.

use std::time::{Duration, Instant};

use psyrec_types::CR_NUMBER_MIN_LEN;

pub const DUPLICATE_CR_MESSAGE: &str = "This CR number is already registered";

/// A check handed out by [`CrNumberGuard::poll`]; returned with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrCheckTicket {
    value: String,
}

impl CrCheckTicket {
    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone)]
pub struct CrNumberGuard {
    delay: Duration,
    current: String,
    deadline: Option<Instant>,
    in_flight: Option<String>,
    error: Option<String>,
}

impl CrNumberGuard {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: String::new(),
            deadline: None,
            in_flight: None,
            error: None,
        }
    }

    /// Records a keystroke.
    pub fn on_input(&mut self, value: &str, now: Instant) {
        self.error = None;
        self.current = value.trim().to_string();
        self.deadline = if self.current.chars().count() >= CR_NUMBER_MIN_LEN {
            Some(now + self.delay)
        } else {
            None
        };
    }

    /// Hands out a check once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<CrCheckTicket> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        self.in_flight = Some(self.current.clone());
        tracing::debug!(cr_no = %self.current, "CR number quiet period elapsed, checking");
        Some(CrCheckTicket {
            value: self.current.clone(),
        })
    }

    /// Applies a check result. Returns `false` when the result was stale and dropped.
    pub fn complete(&mut self, ticket: CrCheckTicket, exists: bool) -> bool {
        self.settle(&ticket);
        if ticket.value != self.current {
            tracing::debug!(cr_no = %ticket.value, "dropping stale CR number check result");
            return false;
        }
        self.error = exists.then(|| DUPLICATE_CR_MESSAGE.to_string());
        true
    }

    /// Records that a check failed; no error is shown for a failed check.
    pub fn fail(&mut self, ticket: CrCheckTicket) {
        self.settle(&ticket);
    }

    fn settle(&mut self, ticket: &CrCheckTicket) {
        if self.in_flight.as_deref() == Some(ticket.value.as_str()) {
            self.in_flight = None;
        }
    }

    /// Whether a check for the current value is awaiting its result.
    pub fn is_checking(&self) -> bool {
        self.in_flight.as_deref() == Some(self.current.as_str())
    }

    /// Uniqueness error for the current value, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Forgets the tracked value, pending timer and error.
    pub fn reset(&mut self) {
        *self = Self::new(self.delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_rapid_typing_yields_single_check_for_last_value() {
        let t0 = Instant::now();
        let mut guard = CrNumberGuard::new(DELAY);
        let mut tickets = Vec::new();

        for (i, value) in ["C", "CR", "CR1"].iter().enumerate() {
            let now = t0 + ms(i as u64 * 100);
            guard.on_input(value, now);
            tickets.extend(guard.poll(now));
        }
        tickets.extend(guard.poll(t0 + ms(400)));
        tickets.extend(guard.poll(t0 + ms(700)));
        tickets.extend(guard.poll(t0 + ms(2000)));

        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].value(), "CR1");
    }

    #[test]
    fn test_short_values_are_never_checked() {
        let t0 = Instant::now();
        let mut guard = CrNumberGuard::new(DELAY);
        guard.on_input("CR", t0);
        assert_eq!(guard.poll(t0 + ms(5000)), None);
    }

    #[test]
    fn test_keystroke_clears_error_immediately() {
        let t0 = Instant::now();
        let mut guard = CrNumberGuard::new(DELAY);
        guard.on_input("CR100", t0);
        let ticket = guard.poll(t0 + DELAY).unwrap();
        assert!(guard.is_checking());
        assert!(guard.complete(ticket, true));
        assert_eq!(guard.error(), Some(DUPLICATE_CR_MESSAGE));

        guard.on_input("CR1001", t0 + ms(600));
        assert_eq!(guard.error(), None);
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let t0 = Instant::now();
        let mut guard = CrNumberGuard::new(DELAY);
        guard.on_input("CR100", t0);
        let stale = guard.poll(t0 + DELAY).unwrap();

        guard.on_input("CR200", t0 + ms(550));
        assert!(!guard.is_checking(), "check in flight is for an old value");
        assert!(!guard.complete(stale, true));
        assert_eq!(guard.error(), None);
    }

    #[test]
    fn test_failed_check_sets_no_error() {
        let t0 = Instant::now();
        let mut guard = CrNumberGuard::new(DELAY);
        guard.on_input("CR100", t0);
        let ticket = guard.poll(t0 + DELAY).unwrap();
        guard.fail(ticket);
        assert!(!guard.is_checking());
        assert_eq!(guard.error(), None);
    }
}
