//! Provider status command.

use console::style;

use crate::analyzer::Provider;
use crate::config::Settings;

/// Show which provider the current configuration resolves to.
pub fn cmd_provider(settings: &Settings) -> anyhow::Result<()> {
    let credentials = settings.provider_credentials();
    let provider = Provider::detect(&credentials);

    let mark = |ok: bool| {
        if ok {
            style("✓").green()
        } else {
            style("✗").red()
        }
    };

    println!("\n{}", style("Analysis Provider").bold());
    println!("{}", "-".repeat(60));
    println!("{:<22} {}", "Active:", style(provider).bold());
    println!(
        "{:<22} {}",
        "OpenAI key:",
        mark(credentials.has_openai_key())
    );
    println!(
        "{:<22} {}",
        "Google credentials:",
        mark(credentials.has_google_credentials())
    );

    match provider {
        Provider::OpenAi => {
            println!("{:<22} {}", "Model:", settings.openai_model);
            println!("{:<22} {}", "Endpoint:", settings.openai_base_url);
        }
        Provider::Google => {
            println!(
                "{} Google Vision is not integrated yet; requests are simulated",
                style("!").yellow()
            );
        }
        Provider::Simulation => {
            println!(
                "{:<22} {}-{} ms",
                "Simulated latency:",
                settings.simulation_min_delay_ms,
                settings.simulation_max_delay_ms
            );
        }
    }
    println!("{:<22} {}", "Catalog:", settings.catalog_path().display());

    Ok(())
}
