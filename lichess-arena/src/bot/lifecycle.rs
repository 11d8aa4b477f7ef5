//! Control messages and OS signal wiring

/// Command delivered to the bot's dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Stop accepting and issuing games; the current game is played out
    Standby,
    /// Stop everything and return from [`Bot::run`](crate::Bot::run)
    Terminate,
}

/// Translate process signals into control commands
///
/// SIGUSR1 requests standby; SIGTERM and SIGINT request termination. Returns
/// after forwarding a terminate, or when the dispatcher is gone.
#[cfg(unix)]
pub async fn forward_signals(sender: flume::Sender<ControlCommand>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1())?;
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;

    loop {
        let command = tokio::select! {
            _ = usr1.recv() => {
                tracing::info!("Received SIGUSR1, entering standby");
                ControlCommand::Standby
            }
            _ = term.recv() => {
                tracing::info!("Received SIGTERM, terminating");
                ControlCommand::Terminate
            }
            _ = int.recv() => {
                tracing::info!("Received SIGINT, terminating");
                ControlCommand::Terminate
            }
        };

        if sender.send_async(command).await.is_err() || command == ControlCommand::Terminate {
            return Ok(());
        }
    }
}

/// Translate Ctrl-C into a terminate command
#[cfg(not(unix))]
pub async fn forward_signals(sender: flume::Sender<ControlCommand>) -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl-C, terminating");
    let _ = sender.send_async(ControlCommand::Terminate).await;
    Ok(())
}
