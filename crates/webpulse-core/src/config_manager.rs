//! JSON 설정 파일.
//!
//! 파일이 없으면 기본값으로 만들어 두고, 있으면 읽어서 검증한다.
//! 빠진 필드는 기본값으로 채워지므로 일부 키만 적은 파일도 유효하다.

use crate::config::AppConfig;
use crate::error::CoreError;
use directories::ProjectDirs;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.json";

/// 설정 파일과 메모리 사본을 함께 관리
#[derive(Debug, Clone)]
pub struct ConfigManager {
    current: Arc<RwLock<AppConfig>>,
    path: PathBuf,
}

fn project_dirs() -> Result<ProjectDirs, CoreError> {
    ProjectDirs::from("dev", "webpulse", "webpulse")
        .ok_or_else(|| CoreError::Config("플랫폼 사용자 디렉토리를 확인할 수 없음".to_string()))
}

impl ConfigManager {
    /// 플랫폼 설정 디렉토리의 `config.json` 사용
    pub fn new() -> Result<Self, CoreError> {
        Self::with_path(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// 지정 경로 사용. 파일이 없으면 기본 설정을 기록한다.
    pub fn with_path(path: PathBuf) -> Result<Self, CoreError> {
        let config = if path.exists() {
            read_config(&path)?
        } else {
            let defaults = AppConfig::default_config();
            write_config(&path, &defaults)?;
            info!("기본 설정 기록: {}", path.display());
            defaults
        };

        Ok(Self {
            current: Arc::new(RwLock::new(config)),
            path,
        })
    }

    /// 현재 설정 사본
    pub fn get(&self) -> AppConfig {
        self.current.read().clone()
    }

    /// 검증을 통과한 설정만 파일과 메모리에 반영
    pub fn update(&self, config: AppConfig) -> Result<(), CoreError> {
        config.validate()?;
        write_config(&self.path, &config)?;
        *self.current.write() = config;
        debug!("설정 갱신: {}", self.path.display());
        Ok(())
    }

    /// 현재 설정을 수정해 반영하고 반영된 설정을 돌려준다
    pub fn update_with<F>(&self, edit: F) -> Result<AppConfig, CoreError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut next = self.get();
        edit(&mut next);
        self.update(next.clone())?;
        Ok(next)
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// 파일을 다시 읽는다. 실패하면 기존 설정을 유지한다.
    pub fn reload(&self) -> Result<(), CoreError> {
        let config = read_config(&self.path)?;
        *self.current.write() = config;
        info!("설정 다시 읽음: {}", self.path.display());
        Ok(())
    }

    /// 플랫폼 설정 디렉토리
    ///
    /// - Linux: `~/.config/webpulse/`
    /// - macOS: `~/Library/Application Support/dev.webpulse.webpulse/`
    /// - Windows: `%APPDATA%\webpulse\webpulse\config\`
    pub fn config_dir() -> Result<PathBuf, CoreError> {
        Ok(project_dirs()?.config_dir().to_path_buf())
    }

    /// 플랫폼 데이터 디렉토리 (영속 사용자 ID 등)
    pub fn data_dir() -> Result<PathBuf, CoreError> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

fn read_config(path: &Path) -> Result<AppConfig, CoreError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CoreError::Config(format!("{} 읽기 실패: {e}", path.display())))?;
    let config: AppConfig = serde_json::from_str(&text)
        .map_err(|e| CoreError::Config(format!("{} 형식 오류: {e}", path.display())))?;
    config.validate()?;
    debug!("설정 읽음: {}", path.display());
    Ok(config)
}

/// 임시 파일에 쓴 뒤 교체
fn write_config(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|e| CoreError::Config(format!("{} 생성 실패: {e}", dir.display())))?;
    }

    let json = serde_json::to_string_pretty(config)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, json)
        .and_then(|_| fs::rename(&staging, path))
        .map_err(|e| CoreError::Config(format!("{} 쓰기 실패: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let manager = ConfigManager::with_path(path.clone()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(manager.get().telemetry.max_batch_size, 50);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "telemetry": { "sampleRate": 1.0 } }"#).unwrap();

        let config = ConfigManager::with_path(path).unwrap().get();
        assert_eq!(config.telemetry.sample_rate, 1.0);
        assert_eq!(config.telemetry.max_batch_size, 50);
        assert_eq!(config.cache.worker_url, "/sw.js");
    }

    #[test]
    fn updates_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let manager = ConfigManager::with_path(path.clone()).unwrap();
        manager
            .update_with(|c| {
                c.telemetry.sample_rate = 1.0;
                c.preload.max_concurrent = 6;
            })
            .unwrap();

        let config = ConfigManager::with_path(path).unwrap().get();
        assert_eq!(config.telemetry.sample_rate, 1.0);
        assert_eq!(config.preload.max_concurrent, 6);
    }

    #[test]
    fn invalid_update_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let manager = ConfigManager::with_path(path.clone()).unwrap();

        let result = manager.update_with(|c| c.telemetry.sample_rate = -0.5);
        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(manager.get().telemetry.sample_rate, 0.1);
        assert_eq!(
            ConfigManager::with_path(path).unwrap().get().telemetry.sample_rate,
            0.1
        );
    }

    #[test]
    fn reload_picks_up_external_edit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let manager = ConfigManager::with_path(path.clone()).unwrap();

        let mut edited = manager.get();
        edited.telemetry.endpoint = "https://rum.example.com".to_string();
        fs::write(&path, serde_json::to_string_pretty(&edited).unwrap()).unwrap();

        manager.reload().unwrap();
        assert_eq!(manager.get().telemetry.endpoint, "https://rum.example.com");
    }

    #[test]
    fn failed_reload_keeps_current_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let manager = ConfigManager::with_path(path.clone()).unwrap();

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(manager.reload(), Err(CoreError::Config(_))));
        assert_eq!(manager.get().telemetry.max_batch_size, 50);
    }
}
