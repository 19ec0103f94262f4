pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lui")]
#[command(about = "Operator CLI for the Accesorios LUI catalog")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print an argon2 hash for a password")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
    },

    #[command(about = "Create an admin user (runs migrations first)")]
    CreateAdmin {
        #[arg(long, help = "Login name, stored lowercase")]
        username: String,
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Password (read from LUI_ADMIN_PASSWORD if omitted)")]
        password: Option<String>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::HashPassword { password } => commands::password::handle(&password, output_format),
        Commands::CreateAdmin { username, name, password } => {
            commands::admin::handle(username, name, password, output_format).await
        }
        Commands::Migrate => commands::migrate::handle(output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_admin() {
        let cli = Cli::try_parse_from(["lui", "create-admin", "--username", "Luisa", "--name", "Luisa R"]).unwrap();
        match cli.command {
            Commands::CreateAdmin { username, name, password } => {
                assert_eq!(username, "Luisa");
                assert_eq!(name, "Luisa R");
                assert_eq!(password, None);
            }
            _ => panic!("expected create-admin"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["lui", "hash-password", "x", "--json"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
    }
}
