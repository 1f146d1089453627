use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Input;
use dotenvy::dotenv;
use registrar_cli::admin::{NewAdmin, create_admin};
use registrar_cli::seeder::{self, SeedConfig};
use registrar_config::{DatabaseConfig, IdentityConfig};
use registrar_db::{PgPool, init_db_pool};

#[derive(Parser)]
#[command(name = "registrar-cli")]
#[command(about = "Registrar CLI - Administrative tools for the Registrar API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin account bound to an identity-provider user
    CreateAdmin {
        /// Identity-provider subject (the session token's `sub`)
        #[arg(short = 'x', long)]
        external_id: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// First name
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name
        #[arg(short = 'l', long)]
        last_name: Option<String>,
    },
    /// Sign a session token for local development, using IDENTITY_JWT_SECRET
    MintToken {
        /// Identity-provider subject to put in `sub`
        external_id: String,

        /// Optional email claim
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Lifetime in seconds
        #[arg(long, default_value = "3600")]
        ttl: i64,
    },
    /// Seed the database with demo departments, people, courses and grades
    Seed {
        /// Number of departments
        #[arg(short = 'd', long, default_value = "4")]
        departments: usize,

        /// Teachers per department
        #[arg(long, default_value = "3")]
        teachers: usize,

        /// Students per department
        #[arg(long, default_value = "40")]
        students: usize,

        /// Courses per department
        #[arg(long, default_value = "5")]
        courses: usize,

        /// Courses each student enrolls in
        #[arg(long, default_value = "4")]
        enrollments: usize,

        /// Percentage of enrollments that get a grade
        #[arg(long, default_value = "80", value_parser = clap::value_parser!(u8).range(0..=100))]
        graded: u8,
    },
    /// Remove all seeded data (API-created records are kept)
    ClearSeed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    registrar_observability::init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::MintToken {
            external_id,
            email,
            ttl,
        } => handle_mint_token(&external_id, email.as_deref(), ttl),
        Commands::CreateAdmin {
            external_id,
            email,
            first_name,
            last_name,
        } => {
            let pool = connect().await?;
            handle_create_admin(&pool, external_id, email, first_name, last_name).await
        }
        Commands::Seed {
            departments,
            teachers,
            students,
            courses,
            enrollments,
            graded,
        } => {
            let pool = connect().await?;
            let config = SeedConfig {
                departments,
                teachers_per_department: teachers,
                students_per_department: students,
                courses_per_department: courses,
                courses_per_student: enrollments,
                graded_percent: graded,
            };
            seeder::seed_all(&pool, config)
                .await
                .context("Error seeding database")?;
            Ok(())
        }
        Commands::ClearSeed => {
            let pool = connect().await?;
            seeder::clear_seed(&pool)
                .await
                .context("Error clearing seeded data")?;
            Ok(())
        }
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let mut config = DatabaseConfig::from_env();
    config.max_connections = config.max_connections.min(5);
    init_db_pool(&config).await
}

fn prompt_if_missing(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Input::new()
            .with_prompt(prompt)
            .interact_text()
            .with_context(|| format!("Failed to read {}", prompt.to_lowercase())),
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    external_id: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
) -> anyhow::Result<()> {
    let admin = NewAdmin {
        external_id: prompt_if_missing(external_id, "External id")?,
        email: prompt_if_missing(email, "Email address")?,
        first_name: prompt_if_missing(first_name, "First name")?,
        last_name: prompt_if_missing(last_name, "Last name")?,
    };

    let id = create_admin(pool, &admin)
        .await
        .context("Error creating admin")?;

    println!("\n✅ Admin created successfully!");
    println!("   Id: {id}");
    println!("   External id: {}", admin.external_id);
    println!("   Email: {}", admin.email);
    println!("   Name: {} {}", admin.first_name, admin.last_name);
    Ok(())
}

fn handle_mint_token(external_id: &str, email: Option<&str>, ttl: i64) -> anyhow::Result<()> {
    let config = IdentityConfig::from_env();
    let token = registrar_auth::issue_session_token(external_id, email, ttl, &config)
        .map_err(|e| e.error)?;
    println!("{token}");
    Ok(())
}
