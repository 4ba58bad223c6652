use std::{ops::ControlFlow, thread::sleep, time::Duration};

use rand::Rng;

use crate::timeout::{Deadline, DeadlineError, DeadlineExceeded};

/// A function that repeatedly calls a fallible probe, sleeping between attempts, until the probe
/// breaks out with a value or the deadline expires.
///
/// The loop alternates between "probe once" and "sleep, then check the deadline" which means that
/// the probe is always attempted at least once, even with a zero duration deadline. The deadline
/// is started by this function and must therefore be handed over unstarted.
///
/// Errors returned by the probe stop the polling and are returned as is. The expiry of the
/// deadline is converted into the probe's error type.
pub fn poll<O, E, P>(
    mut deadline: Deadline<E>,
    polling_wait_behavior: PollingWaitBehavior,
    mut probe: impl FnMut() -> Result<ControlFlow<O, ()>, P>,
) -> Result<O, P>
where
    E: From<DeadlineExceeded>,
    P: From<DeadlineError<E>>,
{
    deadline.start()?;

    let mut retries = 0u64;
    loop {
        match probe()? {
            ControlFlow::Break(output) => {
                deadline.cancel();
                break Ok(output);
            }
            ControlFlow::Continue(()) => {
                let next_wait_duration = polling_wait_behavior.next_wait_duration();
                let next_wait_duration = match deadline.remaining() {
                    Some(remaining) => next_wait_duration.min(remaining),
                    None => next_wait_duration,
                };
                retries += 1;
                tracing::trace!(retries, ?next_wait_duration, "Probe not ready yet");

                sleep(next_wait_duration);
                deadline.check()?;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollingWaitBehavior {
    Constant(Duration),
    /// Waits for the interval plus a uniformly random extra of at most `max_jitter`.
    Jittered {
        interval: Duration,
        max_jitter: Duration,
    },
}

impl PollingWaitBehavior {
    pub fn next_wait_duration(&self) -> Duration {
        match *self {
            Self::Constant(duration) => duration,
            Self::Jittered {
                interval,
                max_jitter,
            } => {
                let max_jitter_micros = u64::try_from(max_jitter.as_micros()).unwrap_or(u64::MAX);
                let jitter = rand::thread_rng().gen_range(0..=max_jitter_micros);
                interval + Duration::from_micros(jitter)
            }
        }
    }
}

impl Default for PollingWaitBehavior {
    fn default() -> Self {
        Self::Jittered {
            interval: Duration::from_millis(100),
            max_jitter: Duration::from_millis(25),
        }
    }
}
