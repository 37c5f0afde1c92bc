//! Loader for pipeline settings with YAML + environment overlays.
//!
//! Sources are merged in the order they are added, with `RADAR__`-prefixed
//! environment variables applied last (`RADAR__INGEST__CONCURRENCY=8`
//! overrides `ingest.concurrency`). String values may reference other
//! environment variables as `${VAR}`; references are expanded recursively up
//! to [`MAXIMUM_ENV_EXPANSION_DEPTH`] hops and unknown names are left intact.
use config::{Config, ConfigError, Environment, File, FileFormat};
use radar_common::RadarError;
use radar_common::settings::RadarSettings;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
pub const DEFAULT_CONFIG_FILE: &str = "radar.yaml";

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            let mut cur = std::mem::take(s);
            for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                let expanded = shellexpand::env(&cur)
                    .map(|cow| cow.into_owned())
                    .unwrap_or_else(|_| cur.clone());
                if expanded == cur {
                    break;
                }
                cur = expanded;
            }
            *s = cur;
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// `./radar.yaml` when present, else `<config_dir>/radar/radar.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|d| d.join("radar").join(DEFAULT_CONFIG_FILE))
        .filter(|p| p.is_file())
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct RadarConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for RadarConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RadarConfigLoader {
    /// Start with no files; env overrides are attached at [`RadarConfigLoader::load`].
    ///
    /// ```
    /// use radar_config::RadarConfigLoader;
    ///
    /// let settings = RadarConfigLoader::new()
    ///     .with_yaml_str("version: '1'\ningest:\n  concurrency: 2")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(settings.version.as_deref(), Some("1"));
    /// assert_eq!(settings.ingest.concurrency, 2);
    /// assert_eq!(settings.ingest.staleness_days, 7);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be missing (headless deployments run on env alone).
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use radar_config::RadarConfigLoader;
    ///
    /// let cfg = RadarConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// ingest:
    ///   whitelist: ["tax.gov.ua"]
    /// preview:
    ///   link_label: "детальніше"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.ingest.whitelist, vec!["tax.gov.ua".to_string()]);
    /// assert_eq!(cfg.preview.link_label, "детальніше");
    /// assert_eq!(cfg.preview.with_image_limit, 1024);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and materialise [`RadarSettings`].
    /// Every failure comes back as [`RadarError::Config`].
    ///
    /// ```
    /// use radar_config::RadarConfigLoader;
    ///
    /// unsafe { std::env::set_var("RADAR_DOC_WEBDRIVER", "http://chromedriver:9515"); }
    ///
    /// let cfg = RadarConfigLoader::new()
    ///     .with_yaml_str("fetch:\n  webdriver_url: \"${RADAR_DOC_WEBDRIVER}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(cfg.fetch.webdriver_url, "http://chromedriver:9515");
    ///
    /// unsafe { std::env::remove_var("RADAR_DOC_WEBDRIVER"); }
    /// ```
    pub fn load(self) -> radar_common::Result<RadarSettings> {
        let settings = self.merge().map_err(|e| RadarError::Config(e.to_string()))?;
        validate(&settings)?;
        Ok(settings)
    }

    fn merge(self) -> Result<RadarSettings, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("RADAR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ingest.whitelist")
                    .with_list_parse_key("ingest.critical_domains")
                    .with_list_parse_key("extract.stop_phrases"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

fn validate(settings: &RadarSettings) -> radar_common::Result<()> {
    if settings.ingest.concurrency == 0 {
        return Err(RadarError::Config(
            "ingest.concurrency must be at least 1".into(),
        ));
    }
    if settings.preview.with_image_limit == 0 || settings.preview.without_image_limit == 0 {
        return Err(RadarError::Config(
            "preview limits must be positive".into(),
        ));
    }
    Ok(())
}
