//! dynapi CLI - generate API schemas from entity metadata
//!
//! Usage:
//!   dynapi proto [--metadata <entities.json>] [--entity <name>] [--package <pkg>] [--out <file>]
//!   dynapi graphql [--metadata <entities.json>] [--out <file>]
//!   dynapi entities [--metadata <entities.json>]
//!   dynapi check-query <sql> [--policy <policy>] [--role <role>]...
//!
//! Without --metadata, entities come from the provider configured in
//! dynapi.toml (see `Settings::load`).

use clap::{Parser, Subcommand, ValueEnum};
use dynapi::codegen::{ProtoGenerator, ProtoOptions};
use dynapi::config::{ProviderKind, RawQueryPolicyKind, Settings};
use dynapi::loader::Cancellation;
use dynapi::rawquery::{RawQueryContext, RawQueryGate};
use dynapi::runtime::ApiRuntime;
use dynapi::telemetry;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dynapi")]
#[command(about = "dynapi - schema-driven proto and GraphQL generation")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to DYNAPI_CONFIG, ./dynapi.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate proto3 IDL
    Proto {
        /// Entity metadata JSON document
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Generate a single entity
        #[arg(short, long)]
        entity: Option<String>,

        /// Override the proto package
        #[arg(short, long)]
        package: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate GraphQL SDL
    Graphql {
        /// Entity metadata JSON document
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List loaded entities
    Entities {
        /// Entity metadata JSON document
        #[arg(short, long)]
        metadata: Option<PathBuf>,
    },

    /// Check a raw query against the policy
    CheckQuery {
        /// SQL text
        sql: String,

        /// Policy to apply (defaults to the configured one)
        #[arg(long)]
        policy: Option<PolicyArg>,

        /// Caller role, repeatable
        #[arg(long = "role")]
        roles: Vec<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum PolicyArg {
    SelectOnly,
    AllowAll,
    DenyAll,
}

impl From<PolicyArg> for RawQueryPolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::SelectOnly => RawQueryPolicyKind::SelectOnly,
            PolicyArg::AllowAll => RawQueryPolicyKind::AllowAll,
            PolicyArg::DenyAll => RawQueryPolicyKind::DenyAll,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    telemetry::init(&settings.logging);

    match cli.command {
        Commands::Proto {
            metadata,
            entity,
            package,
            out,
        } => cmd_proto(settings, metadata, entity, package, out).await,
        Commands::Graphql { metadata, out } => cmd_graphql(settings, metadata, out).await,
        Commands::Entities { metadata } => cmd_entities(settings, metadata).await,
        Commands::CheckQuery { sql, policy, roles } => {
            cmd_check_query(settings, sql, policy, roles).await
        }
    }
}

/// Build a runtime and run the startup load, reporting failures.
async fn load_runtime(mut settings: Settings, metadata: Option<PathBuf>) -> Option<ApiRuntime> {
    if let Some(path) = metadata {
        settings.loader.enabled = true;
        settings.loader.provider = ProviderKind::File;
        settings.provider.file.path = path.display().to_string();
    }

    let runtime = match ApiRuntime::from_settings(settings).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return None;
        }
    };
    if let Err(e) = runtime.start(&Cancellation::never()).await {
        eprintln!("Error: {}", e);
        return None;
    }
    Some(runtime)
}

fn emit(text: &str, out: Option<PathBuf>) -> ExitCode {
    match out {
        Some(path) => match fs::write(&path, text) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error writing file '{}': {}", path.display(), e);
                ExitCode::FAILURE
            }
        },
        None => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
    }
}

async fn cmd_proto(
    settings: Settings,
    metadata: Option<PathBuf>,
    entity: Option<String>,
    package: Option<String>,
    out: Option<PathBuf>,
) -> ExitCode {
    let mut options = ProtoOptions::from(&settings.generator);
    if let Some(package) = package {
        options.package = package;
    }

    let Some(runtime) = load_runtime(settings, metadata).await else {
        return ExitCode::FAILURE;
    };
    let generator = ProtoGenerator::new(options);
    let snapshot = runtime.snapshot();

    let text = match &entity {
        Some(name) => match snapshot.find_ignore_case(name) {
            Some(entity) => generator.generate(entity),
            None => {
                eprintln!("Unknown entity '{}'", name);
                return ExitCode::FAILURE;
            }
        },
        None => generator.generate_snapshot(&snapshot),
    };
    emit(&text, out)
}

async fn cmd_graphql(settings: Settings, metadata: Option<PathBuf>, out: Option<PathBuf>) -> ExitCode {
    let Some(runtime) = load_runtime(settings, metadata).await else {
        return ExitCode::FAILURE;
    };
    emit(&runtime.graphql_schema(), out)
}

async fn cmd_entities(settings: Settings, metadata: Option<PathBuf>) -> ExitCode {
    let Some(runtime) = load_runtime(settings, metadata).await else {
        return ExitCode::FAILURE;
    };
    let snapshot = runtime.snapshot();

    if snapshot.is_empty() {
        println!("No entities loaded.");
        return ExitCode::SUCCESS;
    }

    println!("Entities (generation {}):", snapshot.generation());
    for entity in snapshot.iter() {
        let key = entity
            .primary_key()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  - {} ({} properties, key: {})",
            entity.qualified_name(),
            entity.properties().len(),
            if key.is_empty() { "none" } else { key.as_str() }
        );
    }
    ExitCode::SUCCESS
}

async fn cmd_check_query(
    mut settings: Settings,
    sql: String,
    policy: Option<PolicyArg>,
    roles: Vec<String>,
) -> ExitCode {
    if let Some(policy) = policy {
        settings.raw_query.policy = policy.into();
    }
    let gate = RawQueryGate::from_settings(&settings.raw_query);
    let ctx = RawQueryContext::new(sql).with_roles(roles);

    let kinds = ctx
        .statement_kinds()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("Statements: {}", if kinds.is_empty() { "none" } else { kinds.as_str() });

    match gate.authorize(&ctx).await {
        Ok(()) => {
            println!("OK: allowed by {} policy", gate.policy_name());
            ExitCode::SUCCESS
        }
        Err(denied) => {
            eprintln!("Denied: {}", denied);
            ExitCode::FAILURE
        }
    }
}
