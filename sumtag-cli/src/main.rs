use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sumtag_core::dispatch::Variant;
use sumtag_core::factory::VariantFactory;
use sumtag_core::schema::{PayloadSchema, VariantSchema};
use sumtag_core::value::{Payload, TaggedValue, Wire};

#[derive(Parser)]
#[command(name = "sumtag")]
#[command(about = "Validate and inspect tagged-union wire data")]
#[command(version)]
struct Cli {
    /// Log factory and dispatch decisions (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse wire values against a schema
    Validate {
        /// Wire file: one `{tag, data}` object or an array of them
        #[arg(short, long)]
        data: PathBuf,

        /// Schema file
        #[arg(short, long)]
        schema: PathBuf,

        #[command(flatten)]
        binding: Binding,
    },
    /// Show a schema, and a per-variant count for a wire file
    Info {
        /// Schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Wire file
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[command(flatten)]
        binding: Binding,
    },
    /// Create example schema and wire files
    Example {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct Binding {
    /// Accept any tag (open factory) instead of only declared ones
    #[arg(long, conflicts_with = "bind")]
    dynamic: bool,

    /// Pre-bind only these variants (comma separated)
    #[arg(long, value_delimiter = ',')]
    bind: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Validate {
            data,
            schema,
            binding,
        } => {
            validate_data(data, schema, binding)?;
        }
        Commands::Info {
            schema,
            data,
            binding,
        } => {
            show_info(schema, data.as_deref(), binding)?;
        }
        Commands::Example { output } => {
            create_examples(output)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_schema(path: &Path) -> Result<VariantSchema> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading schema {}", path.display()))?;
    let schema: VariantSchema = serde_json::from_str(&content)
        .wrap_err_with(|| format!("parsing schema {}", path.display()))?;
    debug!(schema = %schema.name, variants = schema.variants.len(), "loaded schema");
    Ok(schema)
}

/// Raw wire entries. Each is parsed separately so one bad entry does not
/// hide the rest.
fn load_wire_values(path: &Path) -> Result<Vec<Payload>> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading data {}", path.display()))?;
    let json: Payload = serde_json::from_str(&content)
        .wrap_err_with(|| format!("parsing data {}", path.display()))?;
    Ok(match json {
        Payload::Array(values) => values,
        single => vec![single],
    })
}

fn build_factory(schema: VariantSchema, binding: &Binding) -> Result<VariantFactory> {
    let factory = if binding.dynamic {
        VariantFactory::dynamic(schema)?
    } else if binding.bind.is_empty() {
        VariantFactory::closed(schema)?
    } else {
        VariantFactory::prebound(schema, &binding.bind)?
    };
    Ok(factory)
}

fn validate_data(data_file: &Path, schema_file: &Path, binding: &Binding) -> Result<()> {
    println!(
        "Validating {} against {}",
        data_file.display(),
        schema_file.display()
    );

    let factory = build_factory(load_schema(schema_file)?, binding)?;
    let values = load_wire_values(data_file)?;

    let mut failures = 0;
    for (i, json) in values.into_iter().enumerate() {
        match factory.parse_value(json) {
            Ok(value) => {
                let back = factory.parse(value.to_wire())?;
                if back == value {
                    println!("Value {}: PASS ({})", i, value.tag());
                } else {
                    failures += 1;
                    println!("Value {}: FAIL - wire round trip changed the value", i);
                }
            }
            Err(e) => {
                failures += 1;
                println!("Value {}: FAIL - {}", i, e);
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{} value(s) failed validation", failures));
    }
    println!("Validation: PASS");
    Ok(())
}

fn show_info(schema_file: &Path, data_file: Option<&Path>, binding: &Binding) -> Result<()> {
    println!("Schema info for: {}", schema_file.display());

    let factory = build_factory(load_schema(schema_file)?, binding)?;
    println!("Union: {}", factory.name());
    println!("Mode: {:?}", factory.mode());
    for def in &factory.schema().variants {
        let bound = factory.variants().contains(&def.name.as_str());
        println!(
            "  {} : {}{}",
            def.name,
            describe(&def.payload),
            if bound { "" } else { " (not bound)" }
        );
    }

    let Some(data_file) = data_file else {
        return Ok(());
    };

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for json in load_wire_values(data_file)? {
        let label = match factory.parse_value(json) {
            Ok(value) => label_for(&factory, &value)?,
            Err(e) => {
                debug!(error = %e, "skipping invalid wire value");
                "<invalid>".to_string()
            }
        };
        *counts.entry(label).or_default() += 1;
    }

    println!("Values in {}:", data_file.display());
    for (label, count) in &counts {
        println!("  {}: {}", label, count);
    }
    Ok(())
}

/// Histogram bucket: declared variants by name, anything else through the
/// fallback arm.
fn label_for(factory: &VariantFactory, value: &TaggedValue) -> Result<String> {
    let mut handlers = TaggedValue::handlers();
    for name in factory.schema().names() {
        let label = name.to_string();
        handlers = handlers.on(name, move |_, _| label);
    }
    let label = value.match_on(handlers.otherwise(|v| format!("{} (undeclared)", v.tag())))?;
    Ok(label)
}

fn describe(schema: &PayloadSchema) -> String {
    match schema {
        PayloadSchema::Array { element } => format!("array<{}>", describe(element)),
        PayloadSchema::Optional { inner } => format!("optional<{}>", describe(inner)),
        PayloadSchema::Struct { fields } => {
            let fields: Vec<String> = fields
                .iter()
                .map(|f| format!("{}: {}", f.name, describe(&f.schema)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        other => other.describe().to_string(),
    }
}

fn create_examples(output_dir: &Path) -> Result<()> {
    println!("Creating example files in: {}", output_dir.display());

    fs::create_dir_all(output_dir)?;

    let schema = VariantSchema::new("Status")
        .unit("Loading")
        .variant(
            "Ready",
            PayloadSchema::record([("finishedAt", PayloadSchema::Timestamp)]),
        )
        .variant("Failed", PayloadSchema::Text);

    let schema_file = output_dir.join("status.schema.json");
    fs::write(&schema_file, serde_json::to_string_pretty(&schema)?)?;
    println!("Created: {}", schema_file.display());

    // The last entry is only accepted by a dynamic factory.
    let values = vec![
        Wire::new("Loading", Payload::Null),
        Wire::new("Ready", serde_json::json!({"finishedAt": 1640995200000i64})),
        Wire::new("Failed", serde_json::json!("disk full")),
        Wire::new("Paused", serde_json::json!({"reason": "maintenance"})),
    ];

    let data_file = output_dir.join("status.json");
    fs::write(&data_file, serde_json::to_string_pretty(&values)?)?;
    println!("Created: {}", data_file.display());

    println!("\nExample usage:");
    println!(
        "  sumtag info --schema {} --data {}",
        schema_file.display(),
        data_file.display()
    );
    println!(
        "  sumtag validate --schema {} --data {} --dynamic",
        schema_file.display(),
        data_file.display()
    );

    Ok(())
}
