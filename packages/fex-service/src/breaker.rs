//! Per-dependency circuit breakers.
//!
//! `Closed` counts consecutive failures. Reaching the threshold opens the circuit until the
//! cooldown elapses, after which a single trial call is let through (`HalfOpen`). The trial's
//! outcome closes or reopens the circuit.

use std::{
	sync::Mutex,
	time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
	Closed { failures: u32 },
	Open { until: Instant },
	HalfOpen { trial_started: Instant },
}

#[derive(Debug)]
pub struct CircuitBreaker {
	name: &'static str,
	failure_threshold: u32,
	cooldown: Duration,
	state: Mutex<BreakerState>,
}
impl CircuitBreaker {
	pub fn new(name: &'static str, policy: fex_config::Breaker) -> Self {
		Self {
			name,
			failure_threshold: policy.failure_threshold.max(1),
			cooldown: Duration::from_millis(policy.cooldown_ms),
			state: Mutex::new(BreakerState::Closed { failures: 0 }),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn state(&self) -> BreakerState {
		*self.lock()
	}

	pub fn allow(&self) -> bool {
		self.allow_at(Instant::now())
	}

	pub fn allow_at(&self, now: Instant) -> bool {
		let mut state = self.lock();

		match *state {
			BreakerState::Closed { .. } => true,
			BreakerState::Open { until } if now >= until => {
				*state = BreakerState::HalfOpen { trial_started: now };

				tracing::info!(breaker = self.name, "Circuit half-open. Allowing a trial call.");

				true
			},
			BreakerState::Open { .. } => false,
			// A trial that never reported back must not wedge the circuit.
			BreakerState::HalfOpen { trial_started } if now >= trial_started + self.cooldown => {
				*state = BreakerState::HalfOpen { trial_started: now };

				true
			},
			BreakerState::HalfOpen { .. } => false,
		}
	}

	pub fn record_success(&self) {
		let mut state = self.lock();

		if matches!(*state, BreakerState::Open { .. } | BreakerState::HalfOpen { .. }) {
			tracing::info!(breaker = self.name, "Circuit closed.");
		}

		*state = BreakerState::Closed { failures: 0 };
	}

	pub fn record_failure(&self) {
		self.record_failure_at(Instant::now());
	}

	pub fn record_failure_at(&self, now: Instant) {
		let mut state = self.lock();
		let next = match *state {
			BreakerState::Closed { failures } if failures + 1 < self.failure_threshold =>
				BreakerState::Closed { failures: failures + 1 },
			BreakerState::Closed { .. } | BreakerState::HalfOpen { .. } =>
				BreakerState::Open { until: now + self.cooldown },
			open @ BreakerState::Open { .. } => open,
		};

		if matches!(next, BreakerState::Open { .. }) && !matches!(*state, BreakerState::Open { .. }) {
			tracing::info!(
				breaker = self.name,
				cooldown_ms = self.cooldown.as_millis() as u64,
				"Circuit opened."
			);
		}

		*state = next;
	}

	/// Records the outcome of a call that went through this breaker.
	pub fn observe<T, E>(&self, result: &Result<T, E>) {
		match result {
			Ok(_) => self.record_success(),
			Err(_) => self.record_failure(),
		}
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}
}

/// One breaker per external dependency, owned by the service instance.
#[derive(Debug)]
pub struct Breakers {
	pub store: CircuitBreaker,
	pub llm: CircuitBreaker,
	pub embedding: CircuitBreaker,
}
impl Breakers {
	pub fn new(policy: fex_config::Breaker) -> Self {
		Self {
			store: CircuitBreaker::new("store", policy),
			llm: CircuitBreaker::new("llm", policy),
			embedding: CircuitBreaker::new("embedding", policy),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn breaker() -> CircuitBreaker {
		CircuitBreaker::new("test", fex_config::Breaker { failure_threshold: 2, cooldown_ms: 1_000 })
	}

	#[test]
	fn opens_after_consecutive_failures() {
		let breaker = breaker();
		let now = Instant::now();

		breaker.record_failure_at(now);

		assert_eq!(breaker.state(), BreakerState::Closed { failures: 1 });
		assert!(breaker.allow_at(now));

		breaker.record_failure_at(now);

		assert!(matches!(breaker.state(), BreakerState::Open { .. }));
		assert!(!breaker.allow_at(now + Duration::from_millis(999)));
	}

	#[test]
	fn success_resets_the_failure_count() {
		let breaker = breaker();
		let now = Instant::now();

		breaker.record_failure_at(now);
		breaker.record_success();
		breaker.record_failure_at(now);

		assert_eq!(breaker.state(), BreakerState::Closed { failures: 1 });
	}

	#[test]
	fn half_open_allows_one_trial() {
		let breaker = breaker();
		let now = Instant::now();

		breaker.record_failure_at(now);
		breaker.record_failure_at(now);

		let later = now + Duration::from_secs(1);

		assert!(breaker.allow_at(later));
		assert!(matches!(breaker.state(), BreakerState::HalfOpen { .. }));
		assert!(!breaker.allow_at(later));

		breaker.record_success();

		assert_eq!(breaker.state(), BreakerState::Closed { failures: 0 });
	}

	#[test]
	fn failed_trial_reopens() {
		let breaker = breaker();
		let now = Instant::now();

		breaker.record_failure_at(now);
		breaker.record_failure_at(now);

		let later = now + Duration::from_secs(1);

		assert!(breaker.allow_at(later));

		breaker.record_failure_at(later);

		assert_eq!(breaker.state(), BreakerState::Open { until: later + Duration::from_secs(1) });
	}
}
