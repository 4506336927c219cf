use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{load_config, Config, DEFAULT_CONFIG_FILE};
use core_types::{Auditor, StudentEmail};
use database::{seed_demo_data, AcademicStore, DbRepository, InMemoryRepository};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use web_server::AppState;

mod telemetry;

/// The main entry point for the Academia records service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; DATABASE_URL may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let _log_guard = telemetry::init(&config.logging)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, &config).await,
        Commands::Migrate => handle_migrate(&config).await,
        Commands::Seed => handle_seed(&config).await,
        Commands::Courses(args) => handle_courses(args, &config).await,
        Commands::Enrollments(args) => handle_enrollments(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Academic records service: courses, students and enrollments.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. A missing file means built-in defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Apply the database migrations.
    Migrate,
    /// Insert the demo catalog (professors, students, courses, enrollments).
    Seed,
    /// Print the courses whose name contains a fragment.
    Courses(CoursesArgs),
    /// Print a student's enrollments.
    Enrollments(EnrollmentsArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Listen address, overriding `server.host` and `server.port` (e.g. "127.0.0.1:3000").
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Serve the seeded demo catalog from memory instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
}

#[derive(Parser)]
struct CoursesArgs {
    /// Case-insensitive name fragment. Omit to list every course.
    #[arg(long, default_value = "")]
    name: String,
}

#[derive(Parser)]
struct EnrollmentsArgs {
    /// The student's email address (case-insensitive).
    #[arg(long)]
    email: String,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Connects to PostgreSQL, applying migrations first when configured to.
async fn open_repository(config: &Config) -> anyhow::Result<DbRepository> {
    let pool = database::connect(
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await?;
    if config.database.run_migrations {
        database::run_migrations(&pool).await?;
    }
    Ok(DbRepository::new(pool, Auditor::new(config.audit.actor.clone())))
}

async fn handle_serve(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn AcademicStore> = if args.in_memory {
        let store = InMemoryRepository::new(Auditor::new(config.audit.actor.clone()));
        seed_demo_data(&store).await?;
        tracing::info!("Serving the demo catalog from memory.");
        Arc::new(store)
    } else {
        Arc::new(open_repository(config).await?)
    };

    let addr = match args.addr {
        Some(addr) => addr,
        None => config
            .server
            .address()
            .parse()
            .with_context(|| format!("invalid listen address '{}'", config.server.address()))?,
    };

    let state = AppState::new(store, config.pagination.clone());
    web_server::run_server(addr, state).await
}

async fn handle_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = database::connect(
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await?;
    database::run_migrations(&pool).await?;
    println!("Migrations applied.");
    Ok(())
}

async fn handle_seed(config: &Config) -> anyhow::Result<()> {
    let repo = open_repository(config).await?;
    let summary = seed_demo_data(&repo).await?;
    if summary.is_empty() {
        println!("Demo data already present; nothing inserted.");
    } else {
        println!(
            "Inserted {} professors, {} students, {} courses, {} enrollments.",
            summary.professors, summary.students, summary.courses, summary.enrollments
        );
    }
    Ok(())
}

async fn handle_courses(args: CoursesArgs, config: &Config) -> anyhow::Result<()> {
    let repo = open_repository(config).await?;
    let courses = repo.search_courses_by_name(&args.name).await?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Code", "Name", "Credits", "Professor"]);
    for course in &courses {
        table.add_row(vec![
            course.id.to_string(),
            course.course_code.clone(),
            course.name.clone(),
            course.credit_count.to_string(),
            course
                .professor_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
    println!("{} course(s).", courses.len());
    Ok(())
}

async fn handle_enrollments(args: EnrollmentsArgs, config: &Config) -> anyhow::Result<()> {
    let email = StudentEmail::parse(&args.email)?;
    let repo = open_repository(config).await?;
    let details = repo.enrollment_details_by_student_email(&email).await?;
    let active = repo.count_active_enrollments_by_email(&email).await?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Course", "Name", "Date", "Status", "Grade"]);
    for detail in &details {
        table.add_row(vec![
            detail.id.to_string(),
            detail.course.course_code.clone(),
            detail.course.name.clone(),
            detail.enrollment_date.to_string(),
            detail.status.to_string(),
            detail
                .final_grade
                .map(|grade| grade.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
    println!("{} enrollment(s), {active} active, for {email}.", details.len());
    Ok(())
}
