use agentchat::api::{ChatTransport, HealthStatus, HttpTransport};
use agentchat::cli::Args;
use agentchat::config::Config;
use agentchat::error::ChatError;
use agentchat::session::{Notification, SessionController, SessionOutcome, Status};
use agentchat::ui::{format_status, format_turn, print_now, TerminalRenderer};
use clap::Parser;
use colored::*;
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match Config::from_env_and_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    init_tracing(config.verbose);
    tracing::debug!(
        base_url = %config.base_url,
        history = config.history_capacity,
        window = config.context_window,
        "configuration loaded"
    );

    let transport = HttpTransport::new(config.base_url.clone())?;
    let (controller, notifications) = SessionController::new(transport, config.session_options());
    let mut console = Console {
        renderer: TerminalRenderer::new(),
        notifications,
    };

    let health = report_health(&controller, &mut console).await;
    if args.health {
        process::exit(if health == HealthStatus::Ready { 0 } else { 1 });
    }

    if !args.message.is_empty() {
        let message = args.message.join(" ");
        if console.send(&controller, &message).await.is_err() {
            process::exit(1);
        }
        return Ok(());
    }

    run_prompt(&controller, &mut console).await
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "agentchat=debug" } else { "warn" };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Renders notifications while a send is in flight.
struct Console {
    renderer: TerminalRenderer,
    notifications: UnboundedReceiver<Notification>,
}

impl Console {
    async fn send<T: ChatTransport>(
        &mut self,
        controller: &SessionController<T>,
        message: &str,
    ) -> agentchat::Result<SessionOutcome> {
        let Console {
            renderer,
            notifications,
        } = self;

        let send = controller.send(message);
        tokio::pin!(send);

        let result = loop {
            tokio::select! {
                biased;
                Some(notification) = notifications.recv() => {
                    print_now(&renderer.render(&notification))?;
                }
                result = &mut send => break result,
                _ = tokio::signal::ctrl_c() => {
                    controller.cancel();
                }
            }
        };

        // Everything the send produced is queued by the time it returns.
        while let Ok(notification) = notifications.try_recv() {
            print_now(&renderer.render(&notification))?;
        }

        if let Err(e) = &result {
            // Stream failures were already rendered from their notification.
            if matches!(e, ChatError::SessionBusy | ChatError::EmptyMessage) {
                eprintln!("{} {}", "Error:".red(), e);
            }
        }
        result
    }

    fn discard_pending(&mut self) {
        while self.notifications.try_recv().is_ok() {}
    }
}

async fn report_health<T: ChatTransport>(
    controller: &SessionController<T>,
    console: &mut Console,
) -> HealthStatus {
    let health = controller.check_health().await;
    console.discard_pending();
    eprintln!("{}", format_status(&Status::from(health)));
    health
}

async fn run_prompt<T: ChatTransport>(
    controller: &SessionController<T>,
    console: &mut Console,
) -> anyhow::Result<()> {
    eprintln!(
        "{}",
        "Type a message. /history lists the conversation, /health checks the agent, /quit exits."
            .dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_now(&format!("{} ", ">".green().bold()))?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                for turn in controller.history() {
                    println!("{}", format_turn(&turn));
                }
            }
            "/health" => {
                report_health(controller, console).await;
            }
            message => {
                // Failures are shown to the user; the prompt carries on.
                let _ = console.send(controller, message).await;
            }
        }
    }

    Ok(())
}
