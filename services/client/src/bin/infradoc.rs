//! services/client/src/bin/infradoc.rs

use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use client_lib::{
    app::{
        dashboard::{admin_overview, department_overview, AdminOverview, DepartmentOverview},
        AppContext, SessionContext, SharedQueue,
    },
    config::Config,
    error::ClientError,
};
use infradoc_core::{
    dashboard::DocumentStats,
    domain::{DocumentQuery, DocumentSummary, Registration, UserUpdate},
    gate::{Decision, Route},
    library::{high_priority_badge, LibraryView, SortKey, StatusTab},
    ports::{Download, UploadOptions},
    upload::{safe_file_name, TaskState, UploadFile, UploadQueue},
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

//=========================================================================================
// Command Line
//=========================================================================================

/// Command-line client for the InfraDoc document platform.
#[derive(Parser)]
#[command(name = "infradoc", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend is reachable.
    Status,
    /// Sign in and store the session.
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "INFRADOC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "INFRADOC_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        department: String,
    },
    /// Sign out and clear the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami {
        /// Re-read the profile from the backend.
        #[arg(long)]
        refresh: bool,
    },
    /// Show the dashboard for the signed-in role.
    Dashboard,
    /// List departments known to the backend.
    Departments,
    /// List document categories known to the backend.
    Categories,
    /// Browse the document library.
    #[command(subcommand)]
    Docs(DocsCommand),
    /// List AI insights across the library, high priority first.
    Insights,
    /// Upload files for storage and AI processing (admin).
    Upload(UploadArgs),
    /// Manage users (admin).
    #[command(subcommand)]
    Users(UsersCommand),
    /// Inspect and process object-store entries (admin).
    #[command(subcommand)]
    Storage(StorageCommand),
}

#[derive(Subcommand)]
enum DocsCommand {
    /// List documents with local filtering and sorting.
    List(ListArgs),
    /// Show one document with its insights.
    Show { id: String },
    /// Download a document, or print where it can be downloaded from.
    Download {
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ListArgs {
    /// all | processed | processing | high
    #[arg(long, default_value = "all")]
    tab: StatusTab,
    #[arg(long)]
    department: Option<String>,
    /// Filter on document type.
    #[arg(long = "type")]
    category: Option<String>,
    /// Case-insensitive match on name, summary, type and tags.
    #[arg(short, long, default_value = "")]
    search: String,
    /// newest | oldest | name | size
    #[arg(long, default_value = "newest")]
    sort: SortKey,
}

#[derive(Args)]
struct UploadArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Subcommand)]
enum UsersCommand {
    List,
    Update {
        id: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand)]
enum StorageCommand {
    List {
        #[arg(long)]
        department: Option<String>,
    },
    Process { key: String },
}

impl Command {
    /// The screen this command corresponds to, if it is gated.
    fn route(&self) -> Option<Route> {
        match self {
            Command::Status | Command::Departments | Command::Categories => None,
            Command::Login { .. } => Some(Route::Login),
            Command::Register { .. } => Some(Route::Register),
            Command::Logout | Command::Whoami { .. } => None,
            Command::Dashboard => None,
            Command::Docs(_) => Some(Route::Library),
            Command::Insights => Some(Route::Insights),
            Command::Upload(_) => Some(Route::AdminUpload),
            Command::Users(_) => Some(Route::AdminUsers),
            Command::Storage(_) => Some(Route::AdminDashboard),
        }
    }
}

//=========================================================================================
// Entry Point
//=========================================================================================

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(api = %config.api_base_url, "Configuration loaded");

    // --- 2. Wire adapters & hydrate the session ---
    let ctx = AppContext::from_config(config)?;
    let mut session = ctx.session();
    let was_signed_in = session.session().is_some();

    // --- 3. Gate the requested screen ---
    let command = cli.command;
    let command_was_logout = matches!(command, Command::Logout);
    let outcome = match command.route().map(|route| session.resolve(route)) {
        None => run(&ctx, &mut session, command).await,
        Some(Decision::Render(_)) => run(&ctx, &mut session, command).await,
        Some(Decision::Redirect(Route::Login)) => {
            println!("Not signed in. Run `infradoc login` first.");
            Ok(())
        }
        Some(Decision::Redirect(target)) => {
            println!("Redirecting to {}", target.path());
            show_dashboard(&ctx, &mut session).await
        }
    };

    if was_signed_in && session.session().is_none() && !command_was_logout {
        eprintln!("Your session has ended. Please login again.");
    }
    outcome
}

async fn run(
    ctx: &AppContext,
    session: &mut SessionContext,
    command: Command,
) -> Result<(), ClientError> {
    match command {
        Command::Status => {
            let status = ctx.auth.health().await?;
            println!("{} ({})", status, ctx.config.api_base_url);
        }
        Command::Login { username, password } => {
            let landing = session.login(&username, &password).await?;
            if let Some(profile) = session.profile() {
                println!("Welcome back, {}!", profile.display_name);
            }
            println!("Landing on {}", landing.path());
        }
        Command::Register {
            username,
            email,
            password,
            department,
        } => {
            if [&username, &email, &password, &department]
                .iter()
                .any(|v| v.trim().is_empty())
            {
                return Err(ClientError::Validation("Please fill in all fields".to_string()));
            }
            let registration = Registration {
                username,
                email,
                password,
                department: department.to_lowercase(),
                role: None,
            };
            let profile = ctx.auth.register(&registration).await?;
            println!(
                "Registered {} in {}. You can now login.",
                profile.username, profile.department
            );
        }
        Command::Logout => {
            session.logout().await;
            println!("Signed out.");
        }
        Command::Whoami { refresh } => {
            if refresh && session.session().is_some() {
                session.refresh_profile().await?;
            }
            match session.profile() {
                Some(p) => println!(
                    "{} <{}>\n  role: {}\n  department: {}\n  id: {}",
                    p.display_name, p.email, p.role, p.department, p.id
                ),
                None => println!("Not signed in."),
            }
        }
        Command::Dashboard => show_dashboard(ctx, session).await?,
        Command::Departments => {
            for department in ctx.auth.departments().await? {
                println!("{}", department);
            }
        }
        Command::Categories => {
            for category in ctx.auth.categories().await? {
                println!("{}", category);
            }
        }
        Command::Docs(DocsCommand::List(args)) => {
            let query = DocumentQuery {
                department: args.department.clone(),
                ..DocumentQuery::default()
            };
            let documents = ctx.fetcher().fetch(session, &query).await;
            let view = LibraryView {
                tab: args.tab,
                department: args.department,
                category: args.category,
                search: args.search,
                sort: args.sort,
            };
            let shown = view.apply(&documents);
            println!(
                "{} of {} documents  (high-priority insights: {})",
                shown.len(),
                documents.len(),
                high_priority_badge(&documents)
            );
            if shown.is_empty() {
                println!("No documents found. Try adjusting your search or filter criteria.");
            }
            for doc in &shown {
                print_row(doc);
            }
        }
        Command::Docs(DocsCommand::Show { id }) => match ctx.fetcher().detail(session, &id).await {
            Some(doc) => print_detail(&doc),
            None => println!("Document {} not found.", id),
        },
        Command::Docs(DocsCommand::Download { id, output }) => {
            let Some(doc) = ctx.fetcher().detail(session, &id).await else {
                println!("Document {} not found.", id);
                return Ok(());
            };
            match ctx.fetcher().download(session, &doc).await? {
                Download::Redirect { url, .. } => println!("Download from: {}", url),
                Download::Bytes { filename, data } => {
                    let path = download_path(output, filename.as_deref(), &doc.display_name);
                    tokio::fs::write(&path, &data).await?;
                    println!("Saved {} bytes to {}", data.len(), path.display());
                }
            }
        }
        Command::Insights => {
            let documents = ctx.fetcher().fetch(session, &DocumentQuery::default()).await;
            let mut rows: Vec<_> = documents
                .iter()
                .flat_map(|doc| doc.insights.iter().map(move |i| (doc, i)))
                .collect();
            rows.sort_by(|a, b| b.1.priority.cmp(&a.1.priority));
            for (doc, insight) in rows {
                println!(
                    "[{:<6}] {:<12} {}  ({})",
                    insight.priority.as_str(),
                    insight.kind,
                    insight.text,
                    doc.display_name
                );
            }
        }
        Command::Upload(args) => upload(ctx, session, args).await?,
        Command::Users(UsersCommand::List) => {
            let result = ctx.auth.list_users(&session.credential()).await;
            for user in session.observe(result)? {
                println!(
                    "{:<6} {:<16} {:<6} {:<12} {}",
                    user.id, user.username, user.role, user.department, user.email
                );
            }
        }
        Command::Users(UsersCommand::Update {
            id,
            role,
            department,
            active,
        }) => {
            let update = UserUpdate {
                role,
                department,
                is_active: active,
            };
            let result = ctx
                .auth
                .update_user(&session.credential(), &id, &update)
                .await;
            let user = session.observe(result)?;
            println!("Updated {}: role {}, department {}", user.username, user.role, user.department);
        }
        Command::Storage(StorageCommand::List { department }) => {
            let stored = ctx
                .fetcher()
                .fetch_stored(session, department.as_deref())
                .await?;
            for doc in &stored {
                print_row(doc);
            }
        }
        Command::Storage(StorageCommand::Process { key }) => {
            ctx.fetcher().process_stored(session, &key).await?;
            println!("Document sent for processing.");
        }
    }
    Ok(())
}

//=========================================================================================
// Screens
//=========================================================================================

async fn show_dashboard(ctx: &AppContext, session: &mut SessionContext) -> Result<(), ClientError> {
    let Some(role) = session.session().map(|s| s.role) else {
        println!("Not signed in. Run `infradoc login` first.");
        return Ok(());
    };
    match Route::landing(role) {
        Route::AdminDashboard => print_admin(&admin_overview(ctx, session).await),
        _ => print_department(&department_overview(ctx, session).await),
    }
    Ok(())
}

async fn upload(
    ctx: &AppContext,
    session: &mut SessionContext,
    args: UploadArgs,
) -> Result<(), ClientError> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(UploadFile::from_name(name, Bytes::from(data)));
    }

    let mut queue = UploadQueue::new();
    let accepted = queue.add_files(files);
    if accepted < args.files.len() {
        println!("Skipped {} file(s) with unsupported types.", args.files.len() - accepted);
    }
    if accepted == 0 {
        return Ok(());
    }

    let mut progress = queue.subscribe();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = progress.borrow().clone();
            if let Some(current) = &p.current {
                eprint!("\rUploading {} ... {:>3}%   ", current, p.percent);
            }
        }
    });

    let shared: SharedQueue = Arc::new(Mutex::new(queue));
    let options = UploadOptions {
        department: args.department,
        category: args.category,
        description: args.description,
    };
    let outcome = ctx.uploader().run(session, &shared, &options).await;
    printer.abort();
    eprintln!();

    for task in &outcome.tasks {
        match &task.state {
            TaskState::Succeeded => println!("  ok     {}", task.file.name),
            TaskState::Failed(reason) => println!("  error  {}: {}", task.file.name, reason),
            other => println!("  {:?}  {}", other, task.file.name),
        }
    }
    println!("{} uploaded, {} failed.", outcome.succeeded(), outcome.failed());
    match &outcome.processing {
        Some(Ok(report)) => println!("AI processing: {}", report.message),
        Some(Err(reason)) => println!(
            "Upload complete but AI processing failed ({}). Documents are stored but not processed.",
            reason
        ),
        None => {}
    }
    Ok(())
}

/// An explicit `--output` is used as given. Names coming from the backend
/// are reduced to a bare file name in the current directory.
fn download_path(output: Option<PathBuf>, served: Option<&str>, display_name: &str) -> PathBuf {
    output.unwrap_or_else(|| {
        served
            .and_then(safe_file_name)
            .or_else(|| safe_file_name(display_name))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("document.download"))
    })
}

fn print_stats(stats: &DocumentStats) {
    println!("  Total documents:      {}", stats.total);
    println!("  AI processed:         {}", stats.processed);
    println!("  Processing / pending: {} / {}", stats.processing, stats.pending);
    println!(
        "  High priority:        {} documents, {} insights",
        stats.high_priority_documents, stats.high_priority_insights
    );
    println!("  In object storage:    {}", stats.stored);
}

fn print_admin(overview: &AdminOverview) {
    println!("Admin Dashboard");
    print_stats(&overview.documents);
    if let Some(users) = &overview.users {
        println!("  Users:                {} ({} admins)", users.total, users.admins);
    }
    if let Some(summary) = &overview.processing {
        println!(
            "  Backend totals:       {} ({} processed, {} in storage)",
            summary.total_documents, summary.database_documents, summary.s3_documents
        );
        for (department, count) in &summary.by_department {
            println!("    {:<14} {}", department, count);
        }
    }
    println!("Recent documents:");
    for doc in &overview.recent {
        print_row(doc);
    }
}

fn print_department(overview: &DepartmentOverview) {
    let name = overview
        .department
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>() + &overview.department[c.len_utf8()..])
        .unwrap_or_else(|| "Department".to_string());
    println!("{} Department Dashboard", name);
    print_stats(&overview.documents);
    println!("Recent documents:");
    for doc in &overview.recent {
        print_row(doc);
    }
}

fn print_row(doc: &DocumentSummary) {
    println!(
        "{:<10} {:<40} {:<16} {:>10}  {:<10} {}",
        doc.id,
        doc.display_name,
        doc.category,
        doc.size_label,
        doc.status.as_str(),
        doc.uploaded_at.format("%Y-%m-%d")
    );
}

fn print_detail(doc: &DocumentSummary) {
    println!("{}", doc.display_name);
    println!("  id:          {}", doc.id);
    println!("  type:        {}", doc.category);
    println!("  department:  {}", doc.department);
    println!("  status:      {}", doc.status.as_str());
    println!("  size:        {}", doc.size_label);
    println!("  uploaded:    {} by {}", doc.uploaded_at.to_rfc3339(), doc.uploaded_by);
    if let Some(url) = &doc.storage_url {
        println!("  storage:     {}", url);
    }
    if !doc.tags.is_empty() {
        let tags: Vec<&str> = doc.tags.iter().map(String::as_str).collect();
        println!("  tags:        {}", tags.join(", "));
    }
    println!("\n{}\n", doc.summary);
    println!("AI insights:");
    for insight in &doc.insights {
        println!("  [{}] {}: {}", insight.priority.as_str(), insight.kind, insight.text);
    }
}
