//! Docshelf Admin CLI
//!
//! Administration tool for roles and users, working directly on the
//! server's database. Use it to bootstrap the administrator role and the
//! first administrator account.
//!
//! # Usage
//!
//! ```bash
//! docshelf-admin role add admin
//! docshelf-admin role list
//! docshelf-admin user add ada@example.com --user-name ada --first Ada --last Lovelace \
//!     --role admin --password 'correct horse'
//! docshelf-admin user list
//! docshelf-admin user remove ada@example.com
//! ```
//!
//! The database path comes from the same configuration the server reads
//! (`DOCSHELF_DATABASE_PATH` overrides it).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use docshelf::config::Config;
use docshelf::credentials::hash_password;
use docshelf::db::{init_db, RoleRepository, UserRepository};
use docshelf::models::{PersonName, Role, User};

#[derive(Parser)]
#[command(name = "docshelf-admin")]
#[command(version)]
#[command(about = "Docshelf server administration tool")]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage roles
    Role(RoleCommand),
    /// Manage users
    User(UserCommand),
}

#[derive(Args)]
struct RoleCommand {
    #[command(subcommand)]
    command: RoleSubcommand,
}

#[derive(Subcommand)]
enum RoleSubcommand {
    /// Add a new role
    Add {
        /// Unique role title
        title: String,
    },
    /// List all roles
    List,
    /// Remove a role that has no members
    Remove {
        /// Role title
        title: String,
    },
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// Add a new user
    Add {
        /// User's email address
        email: String,
        #[arg(long, short)]
        user_name: String,
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        /// Title of the role to assign
        #[arg(long, short)]
        role: String,
        #[arg(long, short)]
        password: String,
    },
    /// List all users
    List,
    /// Remove a user
    Remove {
        /// User's email address
        email: String,
    },
}

struct AddUser {
    email: String,
    user_name: String,
    first: String,
    last: String,
    role: String,
    password: String,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

async fn add_role(roles: &RoleRepository, title: String) -> CliResult {
    let title = title.trim();
    if title.is_empty() {
        return Err("role title must not be empty".into());
    }
    if roles.find_by_title(title).await?.is_some() {
        return Err(format!("Role '{}' already exists", title).into());
    }

    let role = roles.create(&Role::new(title)).await?;
    println!("Added role: {}", role.title);
    println!("  Id: {}", role.id);
    Ok(())
}

async fn list_roles(roles: &RoleRepository) -> CliResult {
    let all = roles.list().await?;

    if all.is_empty() {
        println!("No roles defined.");
        return Ok(());
    }

    println!("{:<40} {:<20} {:<10}", "ID", "TITLE", "MEMBERS");
    println!("{}", "-".repeat(70));

    for role in &all {
        let members = roles.member_count(role.id).await?;
        println!("{:<40} {:<20} {:<10}", role.id, role.title, members);
    }

    println!();
    println!("Total: {} role(s)", all.len());
    Ok(())
}

async fn remove_role(roles: &RoleRepository, title: String) -> CliResult {
    let role = roles
        .find_by_title(&title)
        .await?
        .ok_or_else(|| format!("Role '{}' not found", title))?;

    let members = roles.member_count(role.id).await?;
    if members > 0 {
        return Err(format!("Role '{}' still has {} member(s)", title, members).into());
    }

    roles.delete(role.id).await?;
    println!("Removed role: {}", title);
    Ok(())
}

async fn add_user(users: &UserRepository, roles: &RoleRepository, input: AddUser) -> CliResult {
    let role = roles
        .find_by_title(&input.role)
        .await?
        .ok_or_else(|| format!("Role '{}' not found", input.role))?;

    if users.is_taken(&input.email, &input.user_name).await? {
        return Err(format!("User '{}' already exists", input.email).into());
    }

    let credential_hash = hash_password(&input.password).map_err(|e| e.to_string())?;
    let user = users
        .create(&User {
            id: Uuid::new_v4(),
            name: PersonName {
                first: input.first,
                last: input.last,
            },
            email: input.email,
            user_name: input.user_name,
            credential_hash,
            role: role.id,
        })
        .await?;

    println!("Added user: {}", user.email);
    println!("  User name: {}", user.user_name);
    println!("  Role: {}", role.title);
    Ok(())
}

async fn list_users(users: &UserRepository, roles: &RoleRepository) -> CliResult {
    let all = users.list().await?;

    if all.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<40} {:<20} {:<20}", "EMAIL", "USER NAME", "ROLE");
    println!("{}", "-".repeat(80));

    for user in &all {
        let role = roles
            .find(user.role)
            .await?
            .map(|r| r.title)
            .unwrap_or_default();
        println!("{:<40} {:<20} {:<20}", user.email, user.user_name, role);
    }

    println!();
    println!("Total: {} user(s)", all.len());
    Ok(())
}

async fn remove_user(users: &UserRepository, email: String) -> CliResult {
    if !users.delete_by_email(&email).await? {
        return Err(format!("User '{}' not found", email).into());
    }

    println!("Removed user: {}", email);
    Ok(())
}

async fn run(cli: Cli) -> CliResult {
    let config = Config::load(cli.config)?;
    let pool = init_db(&config.database_path, &config.database).await?;
    let roles = RoleRepository::new(pool.clone());
    let users = UserRepository::new(pool);

    match cli.command {
        Commands::Role(role_cmd) => match role_cmd.command {
            RoleSubcommand::Add { title } => add_role(&roles, title).await,
            RoleSubcommand::List => list_roles(&roles).await,
            RoleSubcommand::Remove { title } => remove_role(&roles, title).await,
        },
        Commands::User(user_cmd) => match user_cmd.command {
            UserSubcommand::Add {
                email,
                user_name,
                first,
                last,
                role,
                password,
            } => {
                let input = AddUser {
                    email,
                    user_name,
                    first,
                    last,
                    role,
                    password,
                };
                add_user(&users, &roles, input).await
            }
            UserSubcommand::List => list_users(&users, &roles).await,
            UserSubcommand::Remove { email } => remove_user(&users, email).await,
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
