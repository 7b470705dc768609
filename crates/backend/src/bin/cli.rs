use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use planner_types::{
    resize, validate_layout, ApplyTemplateRequest, BatchRetimeRequest, BlockTiming, Boundary,
    CreateProjectRequest, CreateTimerSessionRequest, CreateWorkspaceRequest, DayBlock, Project,
    TimerSession, UpdateDayBlockRequest, Workspace,
};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "planner-cli")]
#[command(about = "CLI for the day planner backend API")]
#[command(
    long_about = "A command-line interface for the day planner server.\n\n\
    Shows and edits the hourly blocks of a day, and manages workspaces,\n\
    projects and focus timer sessions."
)]
struct Cli {
    /// Backend server URL to connect to.
    #[arg(
        short,
        long,
        default_value = "http://localhost:3000",
        env = "PLANNER_API_URL"
    )]
    base_url: String,

    /// Session token, sent as a bearer token.
    ///
    /// Copy the value of the `dtdt-session` cookie after logging in.
    #[arg(short, long, env = "PLANNER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the hourly blocks of a day
    Blocks {
        #[command(subcommand)]
        action: BlockAction,
    },
    /// Manage workspaces
    Workspaces {
        #[command(subcommand)]
        action: WorkspaceAction,
    },
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Log and review focus timer sessions
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },
}

#[derive(Subcommand)]
enum BlockAction {
    /// List the day's blocks, creating the default layout on first use
    Show {
        #[arg(short, long, value_name = "UUID")]
        workspace: Uuid,

        /// Day to show, as YYYY-MM-DD.
        #[arg(short, long, value_name = "DATE")]
        date: NaiveDate,
    },

    /// Replace the whole day with a template
    ///
    /// Existing blocks of that day, and their project assignments, are discarded.
    Template {
        #[arg(short, long, value_name = "UUID")]
        workspace: Uuid,

        #[arg(short, long, value_name = "DATE")]
        date: NaiveDate,

        /// Use the weekend layout instead of the weekday one.
        #[arg(long)]
        weekend: bool,
    },

    /// Assign a project to a block, or clear it
    Assign {
        /// The UUID of the block. Use 'blocks show' to find it.
        block: Uuid,

        #[arg(short, long, value_name = "UUID", conflicts_with = "clear")]
        project: Option<Uuid>,

        /// Remove the block's project.
        #[arg(long)]
        clear: bool,
    },

    /// Move one edge of a block; the neighbouring block follows
    ///
    /// The first block's start and the last block's end are fixed. The new
    /// layout is checked locally before anything is sent.
    Resize {
        #[arg(short, long, value_name = "UUID")]
        workspace: Uuid,

        #[arg(short, long, value_name = "DATE")]
        date: NaiveDate,

        /// 1-based position of the block within the day, as listed by 'blocks show'.
        #[arg(short, long, value_name = "N")]
        position: usize,

        /// Which edge of the block to move.
        #[arg(short, long, value_enum)]
        edge: Edge,

        /// New hour for that edge (0-24).
        #[arg(long, value_name = "HOUR")]
        hour: i32,
    },
}

#[derive(Subcommand)]
enum WorkspaceAction {
    List,
    Create { name: String },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List projects, optionally only those of one workspace
    List {
        #[arg(short, long, value_name = "UUID")]
        workspace: Option<Uuid>,
    },
    Create {
        name: String,

        #[arg(short, long, value_name = "UUID")]
        workspace: Uuid,

        /// Color in hex format (e.g., "#22c55e").
        #[arg(short, long, value_name = "HEX")]
        color: Option<String>,
    },
}

#[derive(Subcommand)]
enum TimerAction {
    /// Show the most recent sessions
    List,
    /// Record a finished focus session
    Log {
        /// Length of the session in minutes.
        #[arg(short, long, value_name = "MINUTES")]
        minutes: u32,

        #[arg(short, long, value_name = "UUID")]
        task: Option<Uuid>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Edge {
    Start,
    End,
}

impl From<Edge> for Boundary {
    fn from(edge: Edge) -> Self {
        match edge {
            Edge::Start => Boundary::Start,
            Edge::End => Boundary::End,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin wrapper that prefixes paths and attaches the session token.
struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Send the request and decode the body, turning error responses into
    /// their server-provided message.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.context("Request failed")?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            anyhow::bail!("{} ({})", message, status.as_u16());
        }

        response.json().await.context("Unexpected response body")
    }

    async fn day(&self, workspace: Uuid, date: NaiveDate) -> anyhow::Result<Vec<DayBlock>> {
        let request = self
            .client
            .get(self.url("/day-blocks"))
            .query(&[("workspace_id", workspace.to_string()), ("date", date.to_string())]);
        self.send(request).await
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn format_hour(hour: i32) -> String {
    format!("{:02}:00", hour)
}

fn render_block(block: &DayBlock) -> String {
    let project = block.project_name.as_deref().unwrap_or("(unassigned)");
    format!(
        "[{}] {}-{}  {}",
        short_id(block.id),
        format_hour(block.start_hour),
        format_hour(block.end_hour),
        project
    )
}

fn print_day(blocks: &[DayBlock]) {
    if blocks.is_empty() {
        println!("No blocks.");
    }
    for (idx, block) in blocks.iter().enumerate() {
        println!("{:>2}. {}", idx + 1, render_block(block));
    }
}

/// Apply a coupled edge move to the day and check the result.
fn plan_resize(
    blocks: &[DayBlock],
    position: usize,
    edge: Edge,
    hour: i32,
) -> anyhow::Result<Vec<BlockTiming>> {
    let mut timings: Vec<BlockTiming> = blocks.iter().map(BlockTiming::from).collect();
    let index = position
        .checked_sub(1)
        .context("Block positions start at 1")?;

    resize(&mut timings, index, edge.into(), hour)?;
    validate_layout(&timings)?;
    Ok(timings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.base_url, cli.token);

    match cli.command {
        Commands::Blocks { action } => handle_blocks(&api, action).await?,
        Commands::Workspaces { action } => handle_workspaces(&api, action).await?,
        Commands::Projects { action } => handle_projects(&api, action).await?,
        Commands::Timer { action } => handle_timer(&api, action).await?,
    }

    Ok(())
}

async fn handle_blocks(api: &ApiClient, action: BlockAction) -> anyhow::Result<()> {
    match action {
        BlockAction::Show { workspace, date } => {
            let blocks = api.day(workspace, date).await?;
            print_day(&blocks);
        }
        BlockAction::Template {
            workspace,
            date,
            weekend,
        } => {
            let req = ApplyTemplateRequest {
                workspace_id: workspace,
                date,
                template: Some(if weekend { "weekend" } else { "weekday" }.to_string()),
            };
            let blocks: Vec<DayBlock> = api
                .send(api.client.post(api.url("/day-blocks")).json(&req))
                .await?;
            println!("Applied template to {}:", date);
            print_day(&blocks);
        }
        BlockAction::Assign {
            block,
            project,
            clear,
        } => {
            if project.is_none() && !clear {
                anyhow::bail!("Pass --project <UUID> or --clear");
            }
            let req = UpdateDayBlockRequest {
                project_id: Some(project),
                start_hour: None,
                end_hour: None,
            };
            let updated: DayBlock = api
                .send(
                    api.client
                        .put(api.url(&format!("/day-blocks/{}", block)))
                        .json(&req),
                )
                .await?;
            println!("Updated block: {}", render_block(&updated));
        }
        BlockAction::Resize {
            workspace,
            date,
            position,
            edge,
            hour,
        } => {
            let blocks = api.day(workspace, date).await?;
            let timings = plan_resize(&blocks, position, edge, hour)?;

            let req = BatchRetimeRequest {
                workspace_id: workspace,
                date,
                blocks: timings,
            };
            let blocks: Vec<DayBlock> = api
                .send(api.client.patch(api.url("/day-blocks/batch")).json(&req))
                .await?;
            print_day(&blocks);
        }
    }

    Ok(())
}

async fn handle_workspaces(api: &ApiClient, action: WorkspaceAction) -> anyhow::Result<()> {
    match action {
        WorkspaceAction::List => {
            let workspaces: Vec<Workspace> =
                api.send(api.client.get(api.url("/workspaces"))).await?;
            if workspaces.is_empty() {
                println!("No workspaces found.");
            }
            for ws in workspaces {
                println!("[{}] {}  ({})", short_id(ws.id), ws.name, ws.id);
            }
        }
        WorkspaceAction::Create { name } => {
            let req = CreateWorkspaceRequest { name };
            let ws: Workspace = api
                .send(api.client.post(api.url("/workspaces")).json(&req))
                .await?;
            println!("Created workspace: [{}] {}", short_id(ws.id), ws.name);
        }
    }

    Ok(())
}

async fn handle_projects(api: &ApiClient, action: ProjectAction) -> anyhow::Result<()> {
    match action {
        ProjectAction::List { workspace } => {
            let mut request = api.client.get(api.url("/projects"));
            if let Some(ws) = workspace {
                request = request.query(&[("workspace_id", ws.to_string())]);
            }
            let projects: Vec<Project> = api.send(request).await?;
            if projects.is_empty() {
                println!("No projects found.");
            }
            for project in projects {
                println!(
                    "[{}] {} (color: {})",
                    short_id(project.id),
                    project.name,
                    project.color
                );
            }
        }
        ProjectAction::Create {
            name,
            workspace,
            color,
        } => {
            let req = CreateProjectRequest {
                workspace_id: workspace,
                name,
                color,
            };
            let project: Project = api
                .send(api.client.post(api.url("/projects")).json(&req))
                .await?;
            println!(
                "Created project: [{}] {}",
                short_id(project.id),
                project.name
            );
        }
    }

    Ok(())
}

async fn handle_timer(api: &ApiClient, action: TimerAction) -> anyhow::Result<()> {
    match action {
        TimerAction::List => {
            let sessions: Vec<TimerSession> = api.send(api.client.get(api.url("/timer"))).await?;
            if sessions.is_empty() {
                println!("No sessions logged.");
            }
            for session in sessions {
                println!(
                    "{}  {:>3} min{}",
                    session.started_at.format("%Y-%m-%d %H:%M"),
                    session.duration_seconds / 60,
                    session
                        .task_id
                        .map(|id| format!("  task {}", short_id(id)))
                        .unwrap_or_default()
                );
            }
        }
        TimerAction::Log { minutes, task } => {
            let duration_seconds = i32::try_from(u64::from(minutes) * 60)
                .context("Session is too long")?;
            let req = CreateTimerSessionRequest {
                task_id: task,
                duration_seconds,
            };
            let session: TimerSession = api
                .send(api.client.post(api.url("/timer")).json(&req))
                .await?;
            println!("Logged {} min session [{}]", minutes, short_id(session.id));
        }
    }

    Ok(())
}
