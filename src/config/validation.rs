use crate::config::types::{
    CategoryEntry, Config, CrawlerConfig, ExtractionConfig, OutputConfig, PacingConfig,
};
use crate::asset::KNOWN_EXTENSIONS;
use crate::crawler::DelayRange;
use crate::{ConfigError, ConfigResult};
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_pacing_config(&config.pacing)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates scan loop limits
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.max_assets_per_category < 1 {
        return Err(ConfigError::Validation(
            "max_assets_per_category must be >= 1".to_string(),
        ));
    }

    if config.page_load_timeout < 1 {
        return Err(ConfigError::Validation(
            "page_load_timeout must be >= 1s".to_string(),
        ));
    }

    if config.content_wait_timeout < 1 {
        return Err(ConfigError::Validation(
            "content_wait_timeout must be >= 1s".to_string(),
        ));
    }

    for (name, value) in [
        ("stall_limit", config.stall_limit),
        ("consecutive_error_limit", config.consecutive_error_limit),
        ("large_scroll_every", config.large_scroll_every),
        ("navigation_attempts", config.navigation_attempts),
        ("script_attempts", config.script_attempts),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    if config.scroll_distance.min > config.scroll_distance.max {
        return Err(ConfigError::Validation(format!(
            "scroll_distance min {} exceeds max {}",
            config.scroll_distance.min, config.scroll_distance.max
        )));
    }

    Ok(())
}

/// Validates that every delay range is ordered
fn validate_pacing_config(config: &PacingConfig) -> ConfigResult<()> {
    let ranges: [(&str, &DelayRange); 9] = [
        ("after_load", &config.after_load),
        ("load_retry", &config.load_retry),
        ("content_fallback", &config.content_fallback),
        ("settle", &config.settle),
        ("scan", &config.scan),
        ("large_scroll", &config.large_scroll),
        ("recovery", &config.recovery),
        ("between_categories", &config.between_categories),
        ("script_retry_backoff", &config.script_retry_backoff),
    ];

    for (name, range) in ranges {
        if range.min_ms > range.max_ms {
            return Err(ConfigError::Validation(format!(
                "pacing.{}: min {}ms exceeds max {}ms",
                name, range.min_ms, range.max_ms
            )));
        }
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> ConfigResult<()> {
    let ext = &config.media_extension;
    if ext.len() < 2
        || !ext.starts_with('.')
        || ext[1..].contains(|c: char| matches!(c, '.' | '/' | '\'' | '"'))
    {
        return Err(ConfigError::Validation(format!(
            "media_extension must look like '.mp4', got '{}'",
            ext
        )));
    }

    // Identities are only derived correctly for extensions the resolver strips
    if !KNOWN_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
    {
        return Err(ConfigError::Validation(format!(
            "media_extension '{}' is not one of {}",
            ext,
            KNOWN_EXTENSIONS.join(", ")
        )));
    }

    if config.content_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "content_selector cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.history_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "history_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates category entries: names unique and well-formed, URLs http(s)
fn validate_categories(categories: &[CategoryEntry]) -> ConfigResult<()> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[category]] is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for entry in categories {
        validate_category_name(&entry.name)?;

        if !names.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "category '{}' is declared more than once",
                entry.name
            )));
        }

        let url = Url::parse(&entry.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid URL for category '{}': {}", entry.name, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::InvalidUrl(format!(
                "Category '{}' URL must use http or https, got '{}'",
                entry.name,
                url.scheme()
            )));
        }
    }

    Ok(())
}

fn validate_category_name(name: &str) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "category name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "category name must contain only alphanumerics, '-' or '_', got '{}'",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, url: &str) -> CategoryEntry {
        CategoryEntry {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    fn valid_config() -> Config {
        Config {
            categories: vec![category("anime", "https://9gag.com/interest/anime")],
            ..Config::default()
        }
    }

    #[test]
    fn test_default_with_category_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_requires_a_category() {
        let config = Config::default();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let mut config = valid_config();
        config
            .categories
            .push(category("anime", "https://9gag.com/interest/anime2"));
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_category_url_validation() {
        assert!(validate_categories(&[category("a", "not a url")]).is_err());
        assert!(validate_categories(&[category("a", "ftp://example.com/feed")]).is_err());
        assert!(validate_categories(&[category("a", "http://example.com/feed")]).is_ok());
    }

    #[test]
    fn test_category_name_validation() {
        assert!(validate_category_name("motor-vehicles").is_ok());
        assert!(validate_category_name("old_meme").is_ok());

        assert!(validate_category_name("").is_err());
        assert!(validate_category_name("two words").is_err());
        assert!(validate_category_name("a/b").is_err());
    }

    #[test]
    fn test_limits_must_be_positive() {
        let mut config = valid_config();
        config.crawler.stall_limit = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.crawler.navigation_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_ranges_rejected() {
        let mut config = valid_config();
        config.pacing.scan = DelayRange::new(2_000, 1_000);
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.crawler.scroll_distance.min = 900;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_media_extension_validation() {
        let mut config = valid_config();
        config.extraction.media_extension = "mp4".to_string();
        assert!(validate(&config).is_err());

        config.extraction.media_extension = ".".to_string();
        assert!(validate(&config).is_err());

        config.extraction.media_extension = ".webm".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_media_extension_must_be_resolvable() {
        let mut config = valid_config();
        config.extraction.media_extension = ".mov".to_string();
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains(".mov")));

        config.extraction.media_extension = ".MP4".to_string();
        assert!(validate(&config).is_ok());
    }
}
