use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use fieldspec_core::{FieldInfo, FieldName};
use serde_json::json;

/// How compiled fields are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_fields(fields: &[FieldInfo], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json_fields(fields),
        OutputFormat::Text => print_text_fields(fields),
    }
}

fn print_text_fields(fields: &[FieldInfo]) -> Result<()> {
    print_success(&format!("Compiled {} field(s)", fields.len()));

    for field in fields {
        let name = field.name()?;

        println!("\n{} {}", "Field:".bold(), name.to_string().bold());
        if let Some(original) = field.original_name() {
            println!("  Declared as: {}", original);
        }
        println!(
            "  Resolves to: {}",
            match &name {
                FieldName::Plain(_) => "plain name",
                FieldName::Expr(selector) if selector.is_pattern() => "pattern selector",
                FieldName::Expr(_) => "column selector",
            }
        );
        println!("  Nullable:    {}", field.nullable());
        println!("  Unique:      {}", field.unique());
        println!("  Coerce:      {}", field.coerce());

        match field.checks() {
            Some(checks) => {
                println!("  Checks:");
                for (i, check) in checks.iter().enumerate() {
                    let mode = if check.options().raise_warning {
                        "warn".yellow()
                    } else {
                        "fail".red()
                    };
                    println!("    {}. {} [{}]", i + 1, check.error(), mode);
                }
            }
            None => println!("  Checks:      {}", "none".dimmed()),
        }
    }

    Ok(())
}

fn print_json_fields(fields: &[FieldInfo]) -> Result<()> {
    let mut entries = Vec::with_capacity(fields.len());
    for field in fields {
        let name = field.name()?;
        entries.push(json!({
            "name": name.to_string(),
            "expression": name.as_expr().is_some(),
            "original_name": field.original_name(),
            "alias": field.alias(),
            "regex": field.regex(),
            "nullable": field.nullable(),
            "unique": field.unique(),
            "coerce": field.coerce(),
            "checks": field.checks(),
        }));
    }

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}
