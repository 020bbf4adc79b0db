//! Catalog inspection commands.

use console::style;

use crate::catalog::ALL_CATEGORIES;
use crate::cli::helpers::{load_catalog, truncate};
use crate::config::Settings;

/// List catalog repairs, optionally filtered by category.
pub async fn cmd_catalog_list(settings: &Settings, category: Option<&str>) -> anyhow::Result<()> {
    let path = settings.catalog_path();
    let catalog = load_catalog(&path).await?;
    let category = category.unwrap_or(ALL_CATEGORIES);

    let repairs: Vec<_> = catalog.by_category(category).collect();
    if repairs.is_empty() {
        println!(
            "{} No repairs found in {} for category '{}'",
            style("!").yellow(),
            path.display(),
            category
        );
        return Ok(());
    }

    println!("\n{}", style("Repair Catalog").bold());
    println!("{}", "-".repeat(60));
    println!("{:<18} {:<25} {:<12} Issues", "ID", "Name", "Category");
    println!("{}", "-".repeat(60));

    for (id, repair) in repairs {
        println!(
            "{:<18} {:<25} {:<12} {}",
            truncate(id, 17),
            truncate(&repair.name, 24),
            truncate(&repair.category, 11),
            repair.issues.len()
        );
    }

    if !catalog.categories().is_empty() {
        let names: Vec<_> = catalog.categories().iter().map(|c| c.id.as_str()).collect();
        println!("\n{} {}", style("Categories:").dim(), names.join(", "));
    }

    Ok(())
}
