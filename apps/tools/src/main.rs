use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, normalize_database_url},
    open_controller, StateSubscription,
};
use shared::domain::UiState;

#[derive(Parser, Debug)]
#[command(about = "Inspect and flip the persisted dark mode preference")]
struct Cli {
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current state once the stored value is loaded.
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Flip the preference and print the new value.
    Toggle,
    /// Print every state change until interrupted.
    Watch {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings()?;
    if let Some(url) = cli.database_url {
        settings.database_url = normalize_database_url(&url);
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let (storage, controller) = open_controller(&settings)
        .await
        .with_context(|| format!("failed to open preferences at '{}'", settings.database_url))?;
    let mut subscription = controller.subscribe();
    wait_loaded(&mut subscription).await?;

    match cli.command {
        Command::Show { json } => print_state(controller.current_state(), json)?,
        Command::Toggle => {
            controller.toggle_dark_mode().await?;
            let state = subscription
                .changed()
                .await
                .ok_or_else(|| anyhow!("preference stream ended before the toggle was observed"))?;
            print_state(state, false)?;
        }
        Command::Watch { json } => {
            print_state(subscription.current(), json)?;
            loop {
                tokio::select! {
                    state = subscription.changed() => match state {
                        Some(state) => print_state(state, json)?,
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("interrupted; stopping watch");
                        break;
                    }
                }
            }
        }
    }

    subscription.unsubscribe();
    storage.close().await;
    Ok(())
}

async fn wait_loaded(subscription: &mut StateSubscription) -> Result<bool> {
    subscription
        .wait_until_loaded()
        .await
        .ok_or_else(|| anyhow!("preference controller stopped before loading"))
}

fn print_state(state: UiState, json: bool) -> Result<()> {
    println!("{}", render_state(state, json)?);
    Ok(())
}

fn render_state(state: UiState, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(&state)?);
    }

    Ok(match state {
        UiState::Loading => "dark_mode=loading".to_string(),
        UiState::Success { is_dark_mode } => format!("dark_mode={is_dark_mode}"),
    })
}
