//! OS signal handling.
//!
//! SIGINT and SIGTERM both trigger graceful shutdown. Only the first signal
//! is acted on.

use crate::lifecycle::Shutdown;

/// Logged when SIGINT arrives.
pub const SIGINT_MESSAGE: &str = "echo from SIGINT handler";

/// Logged when SIGTERM arrives.
pub const SIGTERM_MESSAGE: &str = "echo from SIGTERM handler";

/// Wait for SIGINT or SIGTERM, then trigger `shutdown`.
///
/// Returns an error if the signal handlers cannot be installed.
pub async fn listen_for_signals(shutdown: Shutdown) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = interrupt.recv() => tracing::info!("{}", SIGINT_MESSAGE),
            _ = terminate.recv() => tracing::info!("{}", SIGTERM_MESSAGE),
            _ = shutdown.triggered() => return Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("{}", SIGINT_MESSAGE);
            }
            _ = shutdown.triggered() => return Ok(()),
        }
    }

    shutdown.trigger();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigint_message_is_fixed() {
        assert_eq!(SIGINT_MESSAGE, "echo from SIGINT handler");
    }

    #[tokio::test]
    async fn returns_when_shutdown_triggers_elsewhere() {
        let shutdown = Shutdown::new();
        let listener = tokio::spawn(listen_for_signals(shutdown.clone()));
        shutdown.trigger();
        listener.await.unwrap().unwrap();
    }
}
