use anyhow::{Context, Result};
use fieldspec_core::{CheckRegistry, Signature};
use fieldspec_parser::parse_file;
use std::path::Path;
use tracing::info;

use crate::output::{self, OutputFormat};

/// Parameters of checks registered from the command line.
const CUSTOM_SIGNATURE: Signature = Signature::new(&["value"], &[]);

pub fn execute(file: &str, format: OutputFormat, custom: &[String]) -> Result<()> {
    info!("Compiling field declarations: {}", file);

    let mut registry = CheckRegistry::new();
    for name in custom {
        registry
            .register_signature(name.as_str(), CUSTOM_SIGNATURE)
            .with_context(|| format!("Failed to register custom check: {}", name))?;
    }

    let path = Path::new(file);
    let document = parse_file(path)
        .with_context(|| format!("Failed to parse declaration file: {}", file))?;

    let fields = document
        .compile(&registry)
        .with_context(|| format!("Failed to compile declarations in: {}", file))?;

    output::print_fields(&fields, format)
}
