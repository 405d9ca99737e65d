//! Integration tests for config

#[cfg(test)]
mod tests {
    use pk_config::*;
    use pk_types::OutputFormat;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 4] = [
        "PK_OUTPUT",
        "PK_POLL_INTERVAL_MS",
        "PK_CACHE_ENABLED",
        "PK_CACHE_PATH",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "json"

[worker]
poll_interval_ms = 25

[cache]
enabled = false
path = "/tmp/pk-cache.txt"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.worker.poll_interval(), Duration::from_millis(25));
        assert_eq!(config.worker.thread_name_prefix, "pk-worker");
        assert!(!config.cache.enabled);
        assert_eq!(
            config.cache_path().unwrap(),
            PathBuf::from("/tmp/pk-cache.txt")
        );
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = Config::load_from_file(std::path::Path::new("/nonexistent/pk.toml")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_rejects_zero_interval() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[worker]\npoll_interval_ms = 0").unwrap();
        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[test]
    fn test_env_interval_out_of_range() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PK_POLL_INTERVAL_MS", u64::MAX.to_string());
        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        std::env::set_var("PK_POLL_INTERVAL_MS", MAX_POLL_INTERVAL_MS.to_string());
        let mut config = Config::default();
        assert!(config.merge_env().is_ok());

        clear_env();
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.worker.poll_interval_ms, 100);
        assert!(config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PK_OUTPUT", "json");
        std::env::set_var("PK_POLL_INTERVAL_MS", "10");
        std::env::set_var("PK_CACHE_ENABLED", "no");
        std::env::set_var("PK_CACHE_PATH", "/var/tmp/cache.txt");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.worker.poll_interval_ms, 10);
        assert!(!config.cache.enabled);
        assert_eq!(
            config.cache.path.as_deref(),
            Some(std::path::Path::new("/var/tmp/cache.txt"))
        );

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PK_POLL_INTERVAL_MS", "soon");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }
}
