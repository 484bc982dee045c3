use anyhow::Context;
use colored::Colorize;
use std::path::Path;

use skylift_templates::TemplateCatalog;

pub fn handle(templates_dir: &Path, long: bool) -> anyhow::Result<()> {
    let catalog = TemplateCatalog::load(templates_dir)
        .with_context(|| format!("loading templates from {}", templates_dir.display()))?;

    if catalog.is_empty() {
        println!("No templates found in {}", templates_dir.display());
        return Ok(());
    }

    if long {
        for template in catalog.templates() {
            println!("{}", template.template_name.cyan().bold());
            if let Some(description) = &template.description {
                println!("  {description}");
            }
            if !template.required_inputs.is_empty() {
                println!("  required: {}", template.required_inputs.join(", "));
            }
            if !template.optional_inputs.is_empty() {
                println!("  optional: {}", template.optional_inputs.join(", "));
            }
            if !template.outputs.is_empty() {
                println!("  outputs:  {}", template.outputs.join(", "));
            }
            if !template.long_description.is_empty() {
                for line in template.long_description.lines() {
                    println!("  {line}");
                }
            }
            println!();
        }
    } else {
        for summary in catalog.summaries() {
            match &summary.description {
                Some(description) => {
                    println!("{}  {}", summary.template_name.cyan(), description)
                }
                None => println!("{}", summary.template_name.cyan()),
            }
        }
    }

    Ok(())
}
