use std::time::{Duration, Instant};

use thiserror::Error;

/// The condition reported by a [`Deadline`] once the time it was given has run out.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("deadline of {duration:?} exceeded")]
pub struct DeadlineExceeded {
    /// The duration the deadline was configured with.
    pub duration: Duration,
}

/// The errors returned by the [`Deadline`] operations.
///
/// Everything except [`DeadlineError::Expired`] is a misuse of the deadline by its caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeadlineError<E = DeadlineExceeded> {
    #[error("the deadline has not been started")]
    NotStarted,
    #[error("the deadline has already been started")]
    AlreadyStarted,
    #[error("the deadline has already been cancelled")]
    Cancelled,
    #[error("the deadline has already expired")]
    AlreadyExpired,
    #[error("{0}")]
    Expired(E),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeadlineState {
    Unstarted,
    Running { started_at: Instant },
    Expired,
    Cancelled,
}

/// A cooperative deadline that bounds a polling loop.
///
/// The deadline moves through `Unstarted -> Running -> {Expired, Cancelled}` and is never
/// restarted. A deadline without a duration never expires, checking it is then a no-op for as
/// long as it runs.
///
/// When constructed through [`Deadline::with_expiry_error`] the supplied error is handed back on
/// expiry instead of the generic [`DeadlineExceeded`].
#[derive(Debug)]
pub struct Deadline<E = DeadlineExceeded> {
    duration: Option<Duration>,
    state: DeadlineState,
    expiry_error: Option<E>,
}

impl Deadline {
    pub fn new(duration: impl Into<Option<Duration>>) -> Self {
        Self {
            duration: duration.into(),
            state: DeadlineState::Unstarted,
            expiry_error: None,
        }
    }
}

impl<E> Deadline<E>
where
    E: From<DeadlineExceeded>,
{
    pub fn with_expiry_error(duration: impl Into<Option<Duration>>, expiry_error: E) -> Self {
        Self {
            duration: duration.into(),
            state: DeadlineState::Unstarted,
            expiry_error: Some(expiry_error),
        }
    }

    pub fn start(&mut self) -> Result<(), DeadlineError<E>> {
        match self.state {
            DeadlineState::Unstarted => {
                self.state = DeadlineState::Running {
                    started_at: Instant::now(),
                };
                Ok(())
            }
            _ => Err(DeadlineError::AlreadyStarted),
        }
    }

    /// Checks the deadline, transitioning it to [`DeadlineState::Expired`] and returning the
    /// expiry error if its duration has elapsed.
    pub fn check(&mut self) -> Result<(), DeadlineError<E>> {
        let started_at = match self.state {
            DeadlineState::Unstarted => return Err(DeadlineError::NotStarted),
            DeadlineState::Cancelled => return Err(DeadlineError::Cancelled),
            DeadlineState::Expired => return Err(DeadlineError::AlreadyExpired),
            DeadlineState::Running { started_at } => started_at,
        };
        let Some(duration) = self.duration else {
            return Ok(());
        };

        if started_at.elapsed() > duration {
            self.state = DeadlineState::Expired;
            let error = self
                .expiry_error
                .take()
                .unwrap_or_else(|| DeadlineExceeded { duration }.into());
            return Err(DeadlineError::Expired(error));
        }
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.state = DeadlineState::Cancelled;
    }

    pub fn state(&self) -> DeadlineState {
        self.state
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DeadlineState::Running { .. })
    }

    /// The instant at which the deadline expires. [`None`] for unbounded or unstarted deadlines.
    pub fn expires_at(&self) -> Option<Instant> {
        match self.state {
            DeadlineState::Running { started_at } => {
                self.duration.map(|duration| started_at + duration)
            }
            _ => None,
        }
    }

    /// The time left before expiry, [`None`] when the deadline has no bound.
    pub fn remaining(&self) -> Option<Duration> {
        match self.state {
            DeadlineState::Running { started_at } => self
                .duration
                .map(|duration| duration.saturating_sub(started_at.elapsed())),
            DeadlineState::Unstarted => self.duration,
            DeadlineState::Expired | DeadlineState::Cancelled => Some(Duration::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum CustomError {
        TookTooLong,
        Generic(DeadlineExceeded),
    }

    impl From<DeadlineExceeded> for CustomError {
        fn from(value: DeadlineExceeded) -> Self {
            Self::Generic(value)
        }
    }

    #[test]
    fn checking_an_unstarted_deadline_fails() {
        // Arrange
        let mut deadline = Deadline::new(Duration::from_secs(1));

        // Act
        let result = deadline.check();

        // Assert
        assert_eq!(result, Err(DeadlineError::NotStarted));
    }

    #[test]
    fn starting_a_deadline_twice_fails() {
        // Arrange
        let mut deadline = Deadline::new(Duration::from_secs(1));
        deadline.start().expect("Failed to start the deadline");

        // Act
        let result = deadline.start();

        // Assert
        assert_eq!(result, Err(DeadlineError::AlreadyStarted));
    }

    #[test]
    fn running_deadline_passes_check_before_expiry() {
        // Arrange
        let mut deadline = Deadline::new(Duration::from_secs(60));
        deadline.start().unwrap();

        // Act
        let result = deadline.check();

        // Assert
        assert_eq!(result, Ok(()));
        assert!(deadline.is_running());
        assert!(deadline.expires_at().is_some());
    }

    #[test]
    fn deadline_expires_with_configured_duration() {
        // Arrange
        let duration = Duration::from_millis(5);
        let mut deadline = Deadline::new(duration);
        deadline.start().unwrap();
        sleep(Duration::from_millis(20));

        // Act
        let result = deadline.check();

        // Assert
        assert_eq!(
            result,
            Err(DeadlineError::Expired(DeadlineExceeded { duration }))
        );
        assert_eq!(deadline.state(), DeadlineState::Expired);
        assert_eq!(deadline.check(), Err(DeadlineError::AlreadyExpired));
    }

    #[test]
    fn unbounded_deadline_never_expires() {
        // Arrange
        let mut deadline = Deadline::new(None);
        deadline.start().unwrap();
        sleep(Duration::from_millis(10));

        // Act
        let results = (0..100).map(|_| deadline.check()).collect::<Vec<_>>();

        // Assert
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(deadline.expires_at(), None);
        assert_eq!(deadline.remaining(), None);
    }

    #[test]
    fn custom_expiry_error_is_returned_instead_of_generic_one() {
        // Arrange
        let mut deadline =
            Deadline::with_expiry_error(Duration::ZERO, CustomError::TookTooLong);
        deadline.start().unwrap();
        sleep(Duration::from_millis(5));

        // Act
        let result = deadline.check();

        // Assert
        assert_eq!(
            result,
            Err(DeadlineError::Expired(CustomError::TookTooLong))
        );
    }

    #[test]
    fn cancel_is_idempotent_and_blocks_further_checks() {
        // Arrange
        let mut deadline = Deadline::new(Duration::from_secs(1));
        deadline.cancel();
        deadline.start().unwrap_err();
        deadline.cancel();

        // Act
        let result = deadline.check();

        // Assert
        assert_eq!(result, Err(DeadlineError::Cancelled));
        assert_eq!(deadline.state(), DeadlineState::Cancelled);
    }
}
