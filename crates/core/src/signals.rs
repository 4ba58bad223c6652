use geth_harness_node::InterruptHandle;

/// The termination requests received by the harness. Every request is also reported to the node
/// being stopped so that repeated requests escalate its shutdown.
#[derive(Clone, Debug, Default)]
pub struct Interrupts {
    handle: InterruptHandle,
}

impl Interrupts {
    pub fn handle(&self) -> InterruptHandle {
        self.handle.clone()
    }

    pub fn is_requested(&self) -> bool {
        self.handle.count() > 0
    }
}

/// Routes `SIGINT` and `SIGTERM` to a dedicated thread that records them.
///
/// Must be called before any other thread is spawned since only the threads spawned afterwards
/// inherit the blocked signal mask.
#[cfg(unix)]
pub fn install() -> anyhow::Result<Interrupts> {
    use anyhow::Context as _;
    use nix::sys::signal::{SigSet, Signal};
    use tracing::{info, warn};

    let mut signals = SigSet::empty();
    signals.add(Signal::SIGINT);
    signals.add(Signal::SIGTERM);
    signals
        .thread_block()
        .context("Failed to block the termination signals")?;

    let interrupts = Interrupts::default();
    let handle = interrupts.handle();
    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            loop {
                match signals.wait() {
                    Ok(signal) => {
                        info!(?signal, "Received a termination request");
                        handle.interrupt();
                    }
                    Err(error) => {
                        warn!(%error, "Failed to wait for termination signals");
                        return;
                    }
                }
            }
        })
        .context("Failed to spawn the signal handling thread")?;
    Ok(interrupts)
}

#[cfg(not(unix))]
pub fn install() -> anyhow::Result<Interrupts> {
    Ok(Interrupts::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupts_are_shared_with_the_handle() {
        // Arrange
        let interrupts = Interrupts::default();
        let handle = interrupts.handle();

        // Act
        handle.interrupt();

        // Assert
        assert!(interrupts.is_requested());
        assert_eq!(interrupts.handle().count(), 1);
    }
}
