use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

const FALLBACK_DIRECTIVES: &str = "info,sqlx=warn";

/// `RUST_LOG` wins over `LOG_LEVEL`; a bad `LOG_LEVEL` fails start-up.
pub(crate) fn init_logging(log_level: &str) -> Result<()> {
    let filter = build_filter(std::env::var("RUST_LOG").ok(), log_level)?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}

fn build_filter(rust_log: Option<String>, log_level: &str) -> Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|raw| !raw.trim().is_empty()) {
        return EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid RUST_LOG directives: {directives}"));
    }

    let level = log_level.trim();
    if level.is_empty() {
        return Ok(EnvFilter::new(FALLBACK_DIRECTIVES));
    }
    // sqlx logs every statement at info
    EnvFilter::try_new(format!("{level},sqlx=warn"))
        .with_context(|| format!("invalid LOG_LEVEL: {level}"))
}

#[cfg(test)]
mod tests {
    use super::build_filter;

    #[test]
    fn rust_log_overrides_level() {
        let filter = build_filter(Some("debug".to_string()), "warn").expect("filter");
        let rendered = filter.to_string();
        assert!(rendered.contains("debug"));
        assert!(!rendered.contains("sqlx"));
    }

    #[test]
    fn level_keeps_sqlx_quiet() {
        let filter = build_filter(None, "debug").expect("filter");
        let rendered = filter.to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("sqlx=warn"));
    }

    #[test]
    fn blank_inputs_fall_back() {
        let filter = build_filter(Some("  ".to_string()), "").expect("filter");
        assert!(filter.to_string().contains("sqlx=warn"));
    }

    #[test]
    fn malformed_level_is_rejected() {
        assert!(build_filter(None, "social_server=loud").is_err());
    }
}
