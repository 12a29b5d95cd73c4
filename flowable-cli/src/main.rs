//! Flowable CLI - Command-line interface for a Flowable REST server.

mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowable_client::{Client, ClientConfig, Variable};

/// Flowable - deploy models and drive cases, processes and tasks.
#[derive(Parser)]
#[command(name = "flowable")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Server host
    #[arg(short = 'H', long, global = true, env = "FLOWABLE_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, global = true, env = "FLOWABLE_PORT")]
    port: Option<u16>,

    /// Basic-auth user
    #[arg(short, long, global = true, env = "FLOWABLE_USER")]
    user: Option<String>,

    /// Basic-auth password
    #[arg(long, global = true, env = "FLOWABLE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a .cmmn, .bpmn or .bar file
    Deploy {
        /// Path to the model file
        file: String,

        /// Deployment name
        #[arg(short, long)]
        name: Option<String>,

        /// Tenant id
        #[arg(short, long)]
        tenant: Option<String>,

        /// Use the BPMN engine instead of CMMN
        #[arg(long)]
        bpmn: bool,
    },

    /// List case or process definitions
    Definitions {
        /// Filter by definition key
        #[arg(short, long)]
        key: Option<String>,

        /// Only the latest version of each definition
        #[arg(long)]
        latest: bool,

        /// Use the BPMN engine instead of CMMN
        #[arg(long)]
        bpmn: bool,
    },

    /// Start a case or process instance by definition key
    Start {
        /// Definition key
        key: String,

        /// Business key for the new instance
        #[arg(short, long)]
        business_key: Option<String>,

        /// Variable as name=value (repeatable)
        #[arg(long = "var", value_parser = commands::parse_var)]
        vars: Vec<Variable>,

        /// Use the BPMN engine instead of CMMN
        #[arg(long)]
        bpmn: bool,
    },

    /// List open tasks
    Tasks {
        /// Only tasks of this case or process instance
        #[arg(short, long)]
        instance: Option<String>,

        /// Only tasks assigned to this user
        #[arg(short, long)]
        assignee: Option<String>,

        /// Use the BPMN engine instead of CMMN
        #[arg(long)]
        bpmn: bool,
    },

    /// Complete a task
    Complete {
        /// Task id
        task_id: String,

        /// Variable as name=value (repeatable)
        #[arg(long = "var", value_parser = commands::parse_var)]
        vars: Vec<Variable>,

        /// Outcome recorded on the task
        #[arg(short, long)]
        outcome: Option<String>,

        /// Use the BPMN engine instead of CMMN
        #[arg(long)]
        bpmn: bool,
    },

    /// Claim a task for a user
    Claim {
        /// Task id
        task_id: String,

        /// User to assign
        user: String,

        /// Use the BPMN engine instead of CMMN
        #[arg(long)]
        bpmn: bool,
    },
}

impl Cli {
    /// Flags win over the environment, which wins over defaults.
    fn client_config(&self) -> Result<ClientConfig> {
        let config = ClientConfig::from_lookup(|key| match key {
            "FLOWABLE_HOST" => self.host.clone(),
            "FLOWABLE_PORT" => self.port.map(|p| p.to_string()),
            "FLOWABLE_USER" => self.user.clone(),
            "FLOWABLE_PASSWORD" => self.password.clone(),
            other => std::env::var(other).ok(),
        })?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = cli.client_config()?;
    tracing::debug!(base_url = %config.base_url(), "Connecting");
    let client = Client::new(config).context("Failed to create client")?;

    match cli.command {
        Commands::Deploy {
            file,
            name,
            tenant,
            bpmn,
        } => commands::deploy::run(&client, &file, name, tenant, bpmn).await,
        Commands::Definitions { key, latest, bpmn } => {
            commands::definitions::run(&client, key, latest, bpmn).await
        }
        Commands::Start {
            key,
            business_key,
            vars,
            bpmn,
        } => commands::start::run(&client, &key, business_key.as_deref(), vars, bpmn).await,
        Commands::Tasks {
            instance,
            assignee,
            bpmn,
        } => commands::tasks::list(&client, instance, assignee, bpmn).await,
        Commands::Complete {
            task_id,
            vars,
            outcome,
            bpmn,
        } => commands::tasks::complete(&client, &task_id, vars, outcome.as_deref(), bpmn).await,
        Commands::Claim {
            task_id,
            user,
            bpmn,
        } => commands::tasks::claim(&client, &task_id, &user, bpmn).await,
    }
}
