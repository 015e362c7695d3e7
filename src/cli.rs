//! Command-line front-end: the dashboard, auth and preferences screens.

use crate::agents::{AbortHandle, AbortSignal, AgentsApi, RunOutcome, abort_pair};
use crate::client::{ClientConfig, DEFAULT_API_URL, MealwormClient, resolve_credentials};
use crate::error::ClientResult;
use crate::protocol::{AgentType, Credentials, Model, RunRequest, UpdatePreferencesRequest};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

const QUICK_PLAN_MESSAGE: &str = "Generate me a meal plan for next week";

/// Mealworm meal planner client
#[derive(Debug, Parser)]
#[command(name = "mealworm", version, about)]
pub struct Cli {
    /// Base URL of the mealworm API
    #[arg(long, env = "MEALWORM_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Bearer token to use instead of the stored one (not persisted)
    #[arg(long, env = "MEALWORM_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Where the access token is stored between invocations
    #[arg(long, env = "MEALWORM_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// Verbosity level (use -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and sign in
    Register(AccountArgs),
    /// Sign in and store the access token
    Login(AccountArgs),
    /// Sign out and forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List available agents
    Agents,
    /// Show or edit meal preferences
    #[command(subcommand)]
    Prefs(PrefsCmd),
    /// Send a message to an agent
    Run(RunArgs),
    /// Generate next week's meal plan
    Plan(AgentArgs),
}

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "MEALWORM_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct AgentArgs {
    #[arg(long, value_enum, default_value_t = AgentType::MealPlanningAgent)]
    pub agent: AgentType,

    #[arg(long, value_enum, default_value_t = Model::ClaudeSonnet40)]
    pub model: Model,

    /// Wait for the whole response instead of streaming it
    #[arg(long)]
    pub no_stream: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    pub message: String,

    #[command(flatten)]
    pub agent: AgentArgs,

    #[arg(long)]
    pub user_id: Option<String>,

    #[arg(long)]
    pub session_id: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum PrefsCmd {
    Show,
    Set(PrefsSetArgs),
}

/// List values are comma separated; pass an empty value to clear a list.
#[derive(Debug, Default, Args)]
pub struct PrefsSetArgs {
    #[arg(long)]
    pub chicken: Option<u32>,
    #[arg(long)]
    pub fish: Option<u32>,
    #[arg(long)]
    pub vegetables: Option<bool>,
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub eating_out: Option<Vec<String>>,
    #[arg(long)]
    pub leftovers: Option<bool>,
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub likes: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub dislikes: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub cuisines: Option<Vec<String>>,
    #[arg(long)]
    pub sauce: Option<String>,
    #[arg(long)]
    pub easy_meals: Option<String>,
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub restrictions: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub allergens: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub avoid: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub other_items: Option<Vec<String>>,
}

impl From<PrefsSetArgs> for UpdatePreferencesRequest {
    fn from(args: PrefsSetArgs) -> Self {
        let list = |values: Option<Vec<String>>| {
            values.map(|values| {
                values
                    .into_iter()
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .collect()
            })
        };

        Self {
            chicken_dishes_per_week: args.chicken,
            fish_dishes_per_week: args.fish,
            vegetables_required: args.vegetables,
            eating_out_days: list(args.eating_out),
            leftovers_for_lunch: args.leftovers,
            likes: list(args.likes),
            dislikes: list(args.dislikes),
            preferred_cuisines: list(args.cuisines),
            sauce_preference: args.sauce,
            easy_meal_preference: args.easy_meals,
            dietary_restrictions: list(args.restrictions),
            allergens: list(args.allergens),
            avoid_meal_types: list(args.avoid),
            other_items: list(args.other_items),
        }
    }
}

impl Cli {
    /// Logs go to stderr; stdout carries only API output.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let directive = match self.verbose {
                0 => "warn",
                1 => "mealworm=debug",
                2 => "mealworm=trace",
                _ => "trace",
            };
            EnvFilter::new(directive)
        });

        fmt()
            .without_time()
            .with_env_filter(filter)
            .with_target(self.verbose != 0)
            .with_writer(std::io::stderr)
            .init();
    }

    pub async fn run(self) -> ClientResult<()> {
        let credentials = resolve_credentials(self.token, self.token_file);
        let config = ClientConfig {
            base_url: self.api_url,
            ..Default::default()
        };
        let client = MealwormClient::new(config, credentials)?;
        debug!(base_url = client.base_url(), "client ready");

        match self.command {
            Command::Register(args) => {
                let user = client.auth().register(&args.into()).await?;
                println!("Registered and signed in as {}", user.email);
            }
            Command::Login(args) => {
                let user = client.auth().login(&args.into()).await?;
                println!("Signed in as {}", user.email);
            }
            Command::Logout => {
                let response = client.auth().logout().await?;
                println!("{}", response.message);
            }
            Command::Whoami => {
                let user = client.auth().me().await?;
                println!("{} (id {}, since {})", user.email, user.id, user.created_at);
            }
            Command::Agents => {
                for agent in client.agents().list().await? {
                    println!("{}", agent);
                }
            }
            Command::Prefs(PrefsCmd::Show) => {
                let prefs = client.preferences().get().await?;
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            }
            Command::Prefs(PrefsCmd::Set(args)) => {
                let update = UpdatePreferencesRequest::from(args);
                if update.is_empty() {
                    warn!("no preference fields given; nothing to update");
                    return Ok(());
                }
                let prefs = client.preferences().update(&update).await?;
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            }
            Command::Run(args) => {
                let mut request = RunRequest::new(args.message)
                    .streaming(!args.agent.no_stream)
                    .model(args.agent.model.as_str());
                request.user_id = args.user_id;
                request.session_id = args.session_id;
                run_agent(&client, args.agent.agent, request).await?;
            }
            Command::Plan(args) => {
                let request = RunRequest::new(QUICK_PLAN_MESSAGE)
                    .streaming(!args.no_stream)
                    .model(args.model.as_str());
                run_agent(&client, args.agent, request).await?;
            }
        }

        Ok(())
    }
}

impl From<AccountArgs> for Credentials {
    fn from(args: AccountArgs) -> Self {
        Self {
            email: args.email,
            password: args.password,
        }
    }
}

async fn run_agent(
    client: &MealwormClient,
    agent: AgentType,
    request: RunRequest,
) -> ClientResult<()> {
    let agents = client.agents();

    if !request.stream {
        if let RunOutcome::Content(content) =
            agents.run(agent.as_str(), &request, |_| async {}).await?
        {
            writeln!(io::stdout(), "{}", content)?;
        }
        return Ok(());
    }

    let (handle, signal) = abort_pair();
    let on_ctrl_c = handle.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.abort();
        }
    });

    let result = stream_to(
        &agents,
        agent.as_str(),
        &request,
        &mut std::io::stdout(),
        handle,
        signal,
    )
    .await;
    ctrl_c.abort();
    result
}

/// Streams a run into `out`. The first failed write aborts the run and is
/// reported in place of the cancellation.
async fn stream_to<W: Write>(
    agents: &AgentsApi,
    agent: &str,
    request: &RunRequest,
    out: &mut W,
    handle: AbortHandle,
    signal: AbortSignal,
) -> ClientResult<()> {
    let mut write_error: Option<io::Error> = None;
    let result = agents
        .run_stream_with_abort(
            agent,
            request,
            |fragment| {
                if write_error.is_none() {
                    let written = out
                        .write_all(fragment.as_bytes())
                        .and_then(|()| out.flush());
                    if let Err(err) = written {
                        debug!(error = %err, "output closed, aborting run");
                        write_error = Some(err);
                        handle.abort();
                    }
                }
                async {}
            },
            signal,
        )
        .await;

    if let Some(err) = write_error {
        return Err(err.into());
    }
    let newline = writeln!(out);
    result?;
    newline?;
    Ok(())
}
