//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use pharma_commerce::session::Role;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&redacted(&ctx.config));
        return Ok(());
    }

    let config = redacted(&ctx.config);
    ctx.output.header("Current Configuration");

    ctx.output.info("[api]");
    ctx.output.kv("base_url", &config.api.base_url);
    ctx.output.kv("token", config.api.token.as_deref().unwrap_or("-"));
    ctx.output
        .kv("admin_token", config.api.admin_token.as_deref().unwrap_or("-"));

    ctx.output.info("");
    ctx.output.info("[cart]");
    ctx.output.kv("store_dir", &ctx.cart_dir().display().to_string());
    ctx.output.kv("key", &config.cart.key);
    ctx.output
        .kv("reprice_on_add", &config.cart.reprice_on_add.to_string());

    ctx.output.info("");
    ctx.output.info("[dashboard]");
    ctx.output.kv("ttl_secs", &config.dashboard.ttl_secs.to_string());

    ctx.output.info("");
    ctx.output.info("[session]");
    let session = &config.session;
    for (key, value) in [
        ("user_id", &session.user_id),
        ("admin_id", &session.admin_id),
        ("role", &session.role),
        ("name", &session.name),
        ("phone", &session.phone),
        ("email", &session.email),
    ] {
        ctx.output.kv(key, value.as_deref().unwrap_or("-"));
    }

    Ok(())
}

/// Tokens shortened to their first few characters.
fn redacted(config: &CliConfig) -> CliConfig {
    let hide = |token: &Option<String>| {
        token.as_ref().map(|t| {
            let shown: String = t.chars().take(4).collect();
            format!("{}…", shown)
        })
    };
    let mut shown = config.clone();
    shown.api.token = hide(&config.api.token);
    shown.api.admin_token = hide(&config.api.admin_token);
    shown
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("pharma.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");
    let (errors, warnings) = check(&ctx.config);

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Errors and warnings for a config.
fn check(config: &CliConfig) -> (Vec<String>, Vec<String>) {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let url = &config.api.base_url;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(format!("api.base_url must be an http(s) URL, got '{}'", url));
    }

    if config.cart.key.trim().is_empty() {
        errors.push("cart.key must not be empty".to_string());
    }

    if config.dashboard.ttl_secs == 0 {
        warnings.push("dashboard.ttl_secs is 0, every read goes to the server".to_string());
    }

    if let Some(role) = &config.session.role {
        if role.parse::<Role>().is_err() {
            errors.push(format!("session.role '{}' is not customer or admin", role));
        }
    }

    if config.session.user_id.is_none() {
        warnings.push("session.user_id is not set, checkout and orders need it".to_string());
    }

    if config.session.admin_id.is_some() && config.api.admin_token.is_none() {
        warnings.push("session.admin_id is set but api.admin_token is not".to_string());
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_flags_bad_values() {
        let mut config = CliConfig::default();
        config.api.base_url = "localhost:8080".into();
        config.session.role = Some("pharmacist".into());

        let (errors, warnings) = check(&config);
        assert_eq!(errors.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("user_id")));
    }

    #[test]
    fn test_check_accepts_complete_config() {
        let mut config = CliConfig::default();
        config.session.user_id = Some("7".into());
        config.session.role = Some("customer".into());

        let (errors, warnings) = check(&config);
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_redacted_hides_tokens() {
        let mut config = CliConfig::default();
        config.api.token = Some("eyJhbGciOiJIUzI1NiJ9".into());

        let shown = redacted(&config);
        assert_eq!(shown.api.token.as_deref(), Some("eyJh…"));
        assert_eq!(shown.api.admin_token, None);
    }
}
