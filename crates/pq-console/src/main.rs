use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use pq_client::{AgentTransport, Dispatcher, HttpTransport, MockTransport};
use pq_console::config::{ConfigFile, ConsoleConfig, InterfaceMode, Overrides, ENV_CONFIG_PATH};
use pq_console::logging::{self, LogTarget};
use pq_console::oneshot::run_oneshot;
use pq_console::{run_console, ChatView, ConsoleContext, ProgressPresenter, QuestionView};
use pq_session::ProfileDirectory;

/// Reply delay of the offline mock agent, long enough to see progress.
const MOCK_AGENT_DELAY: Duration = Duration::from_secs(7);

#[derive(Parser, Debug)]
#[command(
    name = "pq-console",
    version,
    about = "Terminal console for the PQ question-answering agent"
)]
struct Cli {
    /// Config file (defaults to $PQ_CONSOLE_CONFIG, then the user config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Agent endpoint URL.
    #[arg(long)]
    url: Option<String>,

    /// Interface layout: "chat" or "question".
    #[arg(long)]
    interface: Option<String>,

    /// Accept invalid TLS certificates from the agent endpoint.
    #[arg(long)]
    insecure: bool,

    /// Ask one question, print the answer and exit.
    #[arg(long)]
    query: Option<String>,

    /// Profile id to send with --query.
    #[arg(long)]
    profile: Option<String>,

    /// Write logs to this file (the interactive views log nowhere otherwise).
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Answer from a built-in offline mock agent instead of the endpoint.
    #[arg(long)]
    mock: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            shared_secret: None,
            interface: self.interface.clone(),
            verify_tls: self.insecure.then_some(false),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let interactive = cli.query.is_none();
    logging::init(&LogTarget::select(interactive, cli.log_file.as_deref()))?;

    let env_config_path = std::env::var(ENV_CONFIG_PATH).ok();
    let file = ConfigFile::load(cli.config.as_deref(), env_config_path.as_deref())?;
    let env = Overrides::from_env()?;
    let config = ConsoleConfig::resolve(file, &env, &cli.overrides(), !cli.mock)?;

    let transport: Arc<dyn AgentTransport> = if cli.mock {
        Arc::new(MockTransport::new().with_delay(MOCK_AGENT_DELAY))
    } else {
        Arc::new(HttpTransport::new(config.transport_config()).context("invalid agent endpoint")?)
    };

    tracing::info!(
        agent = %transport.describe(),
        mode = %config.mode,
        verify_tls = config.verify_tls,
        secret_fingerprint = ?config.secret_fingerprint(),
        "PQ console starting"
    );

    let ctx = ConsoleContext::new(Dispatcher::new(transport))
        .with_progress(ProgressPresenter::new(
            config.progress.phases.clone(),
            config.progress.interval,
        ))
        .with_secret_fingerprint(config.secret_fingerprint());
    let profiles = ProfileDirectory::new(config.profiles.clone());

    if let Some(query) = &cli.query {
        let profile = match cli.profile.as_deref() {
            Some(id) => Some(
                profiles
                    .get(id)
                    .cloned()
                    .with_context(|| format!("unknown profile '{id}'"))?,
            ),
            None => None,
        };
        let mut stdout = std::io::stdout();
        let answered = run_oneshot(&ctx, query, config.display, profile, &mut stdout).await?;
        return Ok(if answered {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    match config.mode {
        InterfaceMode::Question => {
            let mut view = QuestionView::new(ctx, config.display);
            run_console(&mut view).await?;
        }
        InterfaceMode::Chat => {
            let mut view = ChatView::new(ctx, config.display, profiles);
            run_console(&mut view).await?;
        }
    }

    tracing::info!("PQ console exited");
    Ok(ExitCode::SUCCESS)
}
