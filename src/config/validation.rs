use crate::config::types::{Config, CrawlerConfig, OutputConfig, SearchConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_search_config(&config.search)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch_size must be >= 1".to_string(),
        ));
    }

    if config.time_budget_ms <= config.safety_margin_ms {
        return Err(ConfigError::Validation(format!(
            "time_budget_ms ({}) must exceed safety_margin_ms ({})",
            config.time_budget_ms, config.safety_margin_ms
        )));
    }

    if config.politeness_delay_ms.saturating_add(config.safety_margin_ms) > config.time_budget_ms {
        return Err(ConfigError::Validation(format!(
            "politeness_delay_ms ({}) plus safety_margin_ms ({}) cannot exceed time_budget_ms ({})",
            config.politeness_delay_ms, config.safety_margin_ms, config.time_budget_ms
        )));
    }

    if config.max_crawl_delay_ms.saturating_add(config.safety_margin_ms) > config.time_budget_ms {
        return Err(ConfigError::Validation(format!(
            "max_crawl_delay_ms ({}) plus safety_margin_ms ({}) cannot exceed time_budget_ms ({})",
            config.max_crawl_delay_ms, config.safety_margin_ms, config.time_budget_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.frontier_cap < 1 || config.fanout_cap < 1 {
        return Err(ConfigError::Validation(format!(
            "frontier_cap and fanout_cap must be >= 1, got {} and {}",
            config.frontier_cap, config.fanout_cap
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if !config.contact_url.is_empty() {
        Url::parse(&config.contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if !config.contact_email.is_empty() {
        validate_email(&config.contact_email)?;
    }

    Ok(())
}

/// Validates query-time defaults
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("alpha", config.alpha),
        ("beta", config.beta),
        ("title_boost", config.title_boost),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    if config.k < 1 {
        return Err(ConfigError::Validation("k must be >= 1".to_string()));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
