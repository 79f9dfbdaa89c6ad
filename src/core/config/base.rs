use super::{constant::*, ConfigEntity};
use crate::{logging, utils, Error, Result};
use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

/// `load_config` resolves the engine configurations.
/// Priority: system environment > YAML file > default config.
/// If `config_path` is blank, the path is resolved from `MESHGUARD_CONFIG_FILE_PATH`,
/// and the default config is used when the variable is absent as well.
pub fn load_config(config_path: &str) -> Result<ConfigEntity> {
    let path = if utils::is_blank(config_path) {
        env::var(CONF_FILE_PATH_ENV_KEY).unwrap_or_else(|_| CONFIG_FILENAME.into())
    } else {
        config_path.to_owned()
    };
    let mut entity = if path == CONFIG_FILENAME {
        ConfigEntity::default()
    } else {
        load_config_from_yaml_file(&path)?
    };
    override_items_from_system_env(&mut entity)?;
    entity.check()?;
    Ok(entity)
}

pub fn load_config_from_yaml_file(path_str: &str) -> Result<ConfigEntity> {
    let path = Path::new(path_str);
    if !path.exists() {
        return Err(Error::msg(format!(
            "meshguard YAML configuration file {} does not exist!",
            path_str
        )));
    }
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let entity: ConfigEntity = serde_yaml::from_str(&content)?;
    entity.check()?;
    logging::info!("[Config] Resolving config from file, file {}", path_str);
    Ok(entity)
}

fn override_items_from_system_env(entity: &mut ConfigEntity) -> Result<()> {
    if let Ok(enable) = env::var(CB_ENABLE_ENV_KEY) {
        entity.config.enable = enable.trim().parse::<bool>().map_err(|_| {
            Error::msg(format!("invalid {}: {}", CB_ENABLE_ENV_KEY, enable))
        })?;
    }
    if let Ok(interval) = env::var(CB_EXPIRE_INTERVAL_ENV_KEY) {
        entity.config.counters_expire_interval_ms =
            interval.trim().parse::<u64>().map_err(|_| {
                Error::msg(format!("invalid {}: {}", CB_EXPIRE_INTERVAL_ENV_KEY, interval))
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file() {
        assert!(load_config("testdata/config/not-exist.yaml").is_err());
    }

    #[test]
    fn from_yaml_file() {
        let dir = env::temp_dir();
        let path = dir.join(format!("meshguard-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            "version: v1\nconfig:\n  enable: true\n  check_period_ms: 200\n  max_half_open_requests: 5"
        )
        .unwrap();
        let entity = load_config_from_yaml_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(entity.config.check_period_ms, 200);
        assert_eq!(entity.config.max_half_open_requests, 5);
    }

    // every variable is touched by this single test, the environment is shared by the test threads
    #[test]
    fn env_overrides_file() {
        let dir = env::temp_dir();
        let path = dir.join(format!("meshguard-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            "version: v1\nconfig:\n  enable: true\n  check_period_ms: 200\n  counters_expire_interval_ms: 5000"
        )
        .unwrap();
        let path_str = path.to_str().unwrap().to_owned();

        let entity = load_config(&path_str).unwrap();
        assert!(entity.config.enable);
        assert_eq!(entity.config.counters_expire_interval_ms, 5000);

        env::set_var(CB_ENABLE_ENV_KEY, "false");
        env::set_var(CB_EXPIRE_INTERVAL_ENV_KEY, " 1234 ");
        let entity = load_config(&path_str).unwrap();
        assert!(!entity.config.enable);
        assert_eq!(entity.config.counters_expire_interval_ms, 1234);
        // untouched by the environment
        assert_eq!(entity.config.check_period_ms, 200);

        env::set_var(CB_EXPIRE_INTERVAL_ENV_KEY, "1s");
        assert!(load_config(&path_str).is_err());
        env::set_var(CB_EXPIRE_INTERVAL_ENV_KEY, "0");
        assert!(load_config(&path_str).is_err());
        env::remove_var(CB_EXPIRE_INTERVAL_ENV_KEY);
        env::set_var(CB_ENABLE_ENV_KEY, "yes");
        assert!(load_config(&path_str).is_err());

        env::remove_var(CB_ENABLE_ENV_KEY);
        std::fs::remove_file(&path).unwrap();
        assert!(load_config(&path_str).is_err());
    }

    #[test]
    fn invalid_yaml_content() {
        let dir = env::temp_dir();
        let path = dir.join(format!("meshguard-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = File::create(&path).unwrap();
        writeln!(file, "version: v1\nconfig:\n  bucket_count: 0").unwrap();
        let res = load_config_from_yaml_file(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert!(res.is_err());
    }
}
