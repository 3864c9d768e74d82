//! Command-line interface for datamapper

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use datamapper::{ConfigLoader, DocumentTree, OperatorLibrary, Value};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "datamapper")]
#[command(author, version, about = "Schema-to-schema data mapping tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Map a JSON input tree with a mapping configuration
    Map {
        /// Path to the mapping configuration
        #[arg(short, long, value_name = "MAPPING")]
        config: PathBuf,

        /// Path to the JSON input tree
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip input and output shape validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Load and check a mapping configuration
    Check {
        /// Path to the mapping configuration
        #[arg(short, long, value_name = "MAPPING")]
        config: PathBuf,
    },

    /// Invoke a single operator
    Op {
        /// Operator name, e.g. toBoolean
        #[arg(value_name = "NAME")]
        name: String,

        /// Arguments, parsed as JSON when possible, else taken as strings
        #[arg(value_name = "ARGS", allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Map {
            config,
            file,
            pretty,
            output,
            no_validate,
        } => cmd_map(config, file, pretty, output, no_validate),
        Commands::Check { config } => cmd_check(config),
        Commands::Op { name, args } => cmd_op(&name, &args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn cmd_map(
    config: PathBuf,
    file: PathBuf,
    pretty: bool,
    output: Option<PathBuf>,
    no_validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mapper = ConfigLoader::new()
        .load_mapper(&config)?
        .with_input_validation(!no_validate)
        .with_output_validation(!no_validate);

    let content = fs::read_to_string(&file)?;
    let input = DocumentTree::from_json_str(&content)?;
    let mapped = mapper.map(&input)?;
    let json_str = mapped.to_json_string(pretty)?;

    if let Some(output_path) = output {
        fs::write(&output_path, &json_str)?;
        eprintln!("Output written to: {}", output_path.display());
    } else {
        println!("{}", json_str);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_check(config: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mapper = ConfigLoader::new().load_mapper(&config)?;
    let input = mapper.input_schema();
    let output = mapper.output_schema();

    println!("datamapper v{}", datamapper::VERSION);
    println!();
    println!("Mapping: {}", config.display());
    println!("  Input root: {}", input.root().label());
    println!("  Output root: {}", output.root().label());
    println!();
    println!("Statistics:");
    println!("  Input nodes: {}", input.node_count());
    println!("  Output nodes: {}", output.node_count());
    println!("  Namespaces: {}", input.namespaces().len() + output.namespaces().len());
    println!("  Directives: {}", mapper.directives().total_count());
    println!();
    println!("✓ Mapping configuration is valid");

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_op(name: &str, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let values: Vec<Value> = args
        .iter()
        .map(|arg| match serde_json::from_str::<serde_json::Value>(arg) {
            Ok(json) => Value::from(json),
            Err(_) => Value::from(arg.as_str()),
        })
        .collect();

    let result = OperatorLibrary::standard().call(name, &values)?;
    println!("{}", serde_json::to_string(&result.to_json())?);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    std::process::exit(1);
}
