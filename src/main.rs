use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use fleet_admin::models::car::CarFilter;
use fleet_admin::models::rbac::{Role, RoleInfo};
use fleet_admin::{AppError, FleetStore, Session, StoreConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "car rental back office", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the role table
    Roles,
    /// Log in and print the role descriptor and assignable roles
    Whoami {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Log in and print fleet statistics and the car list
    Fleet {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Log in and print the revenue summary
    Revenue {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        password: String,
    },
}

#[derive(Serialize)]
struct WhoAmI<'a> {
    name: &'a str,
    email: &'a str,
    role: Option<&'a RoleInfo>,
    assignable_roles: Vec<Role>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let cli = Cli::parse();
    let config = StoreConfig::from_env().context("invalid store configuration")?;
    let store = FleetStore::with_fixtures(config);

    if let Err(err) = run(cli.command, &store).await {
        // store rejections print as {error, message}
        if let Some(app_err) = err.downcast_ref::<AppError>() {
            print_json(&app_err.to_response())?;
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}

async fn run(command: Commands, store: &FleetStore) -> anyhow::Result<()> {
    match command {
        Commands::Roles => {
            let roles: Vec<&RoleInfo> = store.engine().table().iter().collect();
            print_json(&roles)?;
        }
        Commands::Whoami { email, password } => {
            let session = login(store, &email, &password).await?;
            let actor = session.actor().context("session has no actor after login")?;
            let engine = store.engine();
            print_json(&WhoAmI {
                name: &actor.name,
                email: &actor.email,
                role: engine.user_role(&session),
                assignable_roles: engine.assignable_roles(&session).into_iter().collect(),
            })?;
        }
        Commands::Fleet { email, password } => {
            let session = login(store, &email, &password).await?;
            let cars = store.list_cars(&session, &CarFilter::default()).await?;
            let stats = store.fleet_stats(&session).await?;
            print_json(&json!({ "stats": stats, "cars": cars }))?;
        }
        Commands::Revenue { email, password } => {
            let session = login(store, &email, &password).await?;
            let summary = store.revenue_summary(&session).await?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

async fn login(store: &FleetStore, email: &str, password: &str) -> anyhow::Result<Session> {
    let mut session = Session::new();
    store
        .login(&mut session, email, password)
        .await
        .with_context(|| format!("login failed for {email}"))?;
    Ok(session)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
