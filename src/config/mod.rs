use std::{collections::HashSet, fs, str::FromStr};

use log::{debug, trace, LevelFilter};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    config_error,
    core::{ConfigProvider, DispatchResult},
    dispatch::FALLBACK_PAGE,
};

/// Page and module names follow identifier rules.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Whether `name` can be used as a page or module name
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[derive(Default, Debug, Serialize, Deserialize, Validate)]
pub struct Config {
    #[serde(default)]
    pub use_modules: bool,

    #[serde(default)]
    #[validate(custom(function = "Config::validate_modules"))]
    pub modules: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    pub display: Display,

    #[validate(nested)]
    pub log: Option<Log>,

    #[validate(nested)]
    pub admin: Option<Admin>,
}

// Config file load and validation
impl Config {
    pub fn load_from_yaml<P>(path: P) -> DispatchResult<Self>
    where
        P: AsRef<std::path::Path> + std::fmt::Display,
    {
        let conf_str = fs::read_to_string(&path)
            .map_err(|e| config_error!("Unable to read conf file from {}: {}", path, e))?;
        debug!("Conf file read from {path}");
        Self::from_yaml(&conf_str)
    }

    pub fn from_yaml(conf_str: &str) -> DispatchResult<Self> {
        trace!("Read conf file: {conf_str}");
        let conf: Config = serde_yaml::from_str(conf_str)
            .map_err(|e| config_error!("Unable to parse yaml conf: {}", e))?;

        trace!("Loaded conf: {conf:?}");

        // use validator to validate conf file
        conf.validate()
            .map_err(|e| config_error!("Conf file validation failed: {}", e))?;

        Ok(conf)
    }

    pub fn to_yaml(&self) -> DispatchResult<String> {
        serde_yaml::to_string(self).map_err(|e| config_error!("Unable to serialize conf: {}", e))
    }

    fn validate_modules(modules: &Vec<String>) -> Result<(), ValidationError> {
        validate_identifiers(modules)?;

        let mut seen = HashSet::new();
        for module in modules {
            if !seen.insert(module.as_str()) {
                let mut err = ValidationError::new("duplicate_module");
                err.add_param("module".into(), module);
                return Err(err);
            }
        }
        Ok(())
    }
}

impl ConfigProvider for Config {
    fn use_modules(&self) -> bool {
        self.use_modules
    }

    fn modules(&self) -> Vec<String> {
        self.modules.clone()
    }

    fn pages_without_login(&self) -> Vec<String> {
        self.display.pages_without_login.clone()
    }

    fn unallowed_pages(&self) -> Vec<String> {
        self.display.unallowed_pages.clone()
    }
}

/// Page access settings.
#[derive(Clone, Default, Debug, Serialize, Deserialize, Validate)]
pub struct Display {
    #[serde(default)]
    #[validate(custom(function = "validate_identifiers"))]
    pub pages_without_login: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = "Display::validate_unallowed_pages"))]
    pub unallowed_pages: Vec<String>,
}

impl Display {
    fn validate_unallowed_pages(pages: &Vec<String>) -> Result<(), ValidationError> {
        validate_identifiers(pages)?;

        if pages.iter().any(|p| p == FALLBACK_PAGE) {
            return Err(ValidationError::new("fallback_page_unallowed"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Log {
    #[serde(default = "Log::default_level")]
    #[validate(custom(function = "Log::validate_level"))]
    pub level: String,
    pub path: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            path: None,
        }
    }
}

impl Log {
    fn default_level() -> String {
        "info".to_string()
    }

    fn validate_level(level: &String) -> Result<(), ValidationError> {
        LevelFilter::from_str(level)
            .map(|_| ())
            .map_err(|_| ValidationError::new("invalid_log_level"))
    }

    /// The configured level, `Info` if it does not parse
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.level).unwrap_or(LevelFilter::Info)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Admin {
    #[validate(length(min = 1))]
    pub api_key: String,
}

fn validate_identifiers(names: &Vec<String>) -> Result<(), ValidationError> {
    for name in names {
        if !is_valid_identifier(name) {
            let mut err = ValidationError::new("invalid_identifier");
            err.add_param("name".into(), name);
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::core::DispatchError;

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_load_file() {
        init_log();
        let conf_str = r#"
---
use_modules: true
modules:
  - UserSystem
  - Shop
  - Blog

display:
  pages_without_login: [About, Contact]
  unallowed_pages: [Secret]

log:
  level: debug

admin:
  api_key: edd1c9f034335f136f87ad84b625c8f1
        "#;
        let conf = Config::from_yaml(conf_str).unwrap();
        assert!(conf.use_modules);
        assert_eq!(3, conf.modules.len());
        assert_eq!(2, conf.display.pages_without_login.len());
        assert_eq!(vec!["Secret".to_string()], conf.unallowed_pages());
        assert_eq!(LevelFilter::Debug, conf.log.as_ref().unwrap().level_filter());
        print!("{}", conf.to_yaml().unwrap());
    }

    #[test]
    fn test_defaults() {
        init_log();
        let conf = Config::from_yaml("modules: []").unwrap();
        assert!(!conf.use_modules());
        assert!(conf.modules().is_empty());
        assert!(conf.pages_without_login().is_empty());
        assert!(conf.log.is_none());
        assert!(conf.admin.is_none());
    }

    #[test]
    fn test_load_from_yaml_file() {
        init_log();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "use_modules: true\nmodules: [Shop]").unwrap();

        let path = file.path().display().to_string();
        let conf = Config::load_from_yaml(path).unwrap();
        assert_eq!(vec!["Shop".to_string()], conf.modules());
    }

    #[test]
    fn test_missing_file() {
        init_log();
        let conf = Config::load_from_yaml("/nonexistent/pagegate.yaml");
        assert!(conf.is_err());
    }

    #[test]
    fn test_valid_fallback_page_not_unallowed() {
        init_log();
        let conf_str = r#"
---
display:
  unallowed_pages: [Secret, Index]
        "#;
        let err = Config::from_yaml(conf_str).unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
    }

    #[test]
    fn test_valid_duplicate_modules() {
        init_log();
        let conf_str = r#"
---
use_modules: true
modules: [Shop, Blog, Shop]
        "#;
        let err = Config::from_yaml(conf_str).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn test_valid_identifiers() {
        init_log();
        let conf_str = r#"
---
display:
  pages_without_login: ["../etc"]
        "#;
        assert!(Config::from_yaml(conf_str).is_err());

        assert!(is_valid_identifier("LostPassword"));
        assert!(is_valid_identifier("_internal2"));
        assert!(!is_valid_identifier("2fa"));
        assert!(!is_valid_identifier("Shop::Cart"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_valid_log_level() {
        init_log();
        let conf_str = r#"
---
log:
  level: loud
        "#;
        assert!(Config::from_yaml(conf_str).is_err());
    }

    #[test]
    fn test_valid_admin_api_key() {
        init_log();
        let conf_str = r#"
---
admin:
  api_key: ""
        "#;
        assert!(Config::from_yaml(conf_str).is_err());
    }
}
