use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use shared::types::Role;
use shared::types::server_config::AppConfig;

use crate::auth::hash_password;
use crate::database::{self, NewUser, insert_user};

#[derive(Debug, Parser)]
#[command(name = "campus-server")]
#[command(about = "Campus portal server: public directory API behind an admin login")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "CAMPUS_CONFIG", default_value = "campus.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Create a portal user
    AddUser(AddUserArgs),
}

#[derive(Debug, Args)]
pub struct AddUserArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long, env = "CAMPUS_USER_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    /// admin or editor
    #[arg(long, default_value = "admin")]
    pub role: Role,
}

/// Hash the password and insert the credential record.
pub async fn run_add_user(config: &AppConfig, args: AddUserArgs) -> Result<()> {
    let db = database::connect(&config.database.url, config.database.max_connections).await?;
    let password_hash = hash_password(&args.password).context("Failed to hash password")?;

    let user = insert_user(
        &db,
        NewUser {
            username: args.username.trim().to_string(),
            password_hash,
            name: args.name,
            email: args.email,
            role: args.role,
        },
    )
    .await?;

    info!("User {} ready (id {})", user.username, user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["campus-server"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn config_path_is_overridable() {
        let cli = Cli::try_parse_from(["campus-server", "--config", "/etc/campus.toml", "serve"])
            .unwrap();
        assert_eq!(cli.config, "/etc/campus.toml");
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn add_user_defaults_to_admin() {
        let cli = Cli::try_parse_from([
            "campus-server",
            "add-user",
            "--username",
            "registrar",
            "--password",
            "pw",
            "--name",
            "Registrar",
            "--email",
            "registrar@campus.edu",
        ])
        .unwrap();

        match cli.command {
            Some(Command::AddUser(args)) => {
                assert_eq!(args.username, "registrar");
                assert_eq!(args.role, Role::Admin);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = Cli::try_parse_from([
            "campus-server",
            "add-user",
            "--username",
            "x",
            "--password",
            "pw",
            "--name",
            "X",
            "--email",
            "x@campus.edu",
            "--role",
            "superuser",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn add_user_runs_end_to_end() {
        let config = shared::config::parse_config(
            r#"
            [server]
            bind = "127.0.0.1"

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [auth]
            jwt_secret = "test-secret-key-0123456789abcdef"
            "#,
        )
        .unwrap();

        // In-memory databases are per pool, so this only checks the command
        // completes end to end.
        run_add_user(
            &config,
            AddUserArgs {
                username: " registrar ".into(),
                password: "pw".into(),
                name: "Registrar".into(),
                email: "registrar@campus.edu".into(),
                role: Role::Editor,
            },
        )
        .await
        .unwrap();
    }
}
