//! 설정 로드.
//!
//! `<설정 디렉토리>/newrelic.json`(필수) → `plugin.json`(선택) → `PUBLISH_*` 환경변수
//! 순으로 병합한다. 중첩 키는 `__`로 구분한다 (`PUBLISH_PROXY__HOST`).

use config::{Config, Environment, File, FileFormat};
use publish_core::config::PublishConfig;
use publish_core::error::CoreError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// SDK 설정 파일 이름
pub const SDK_CONFIG_FILE: &str = "newrelic.json";
/// 플러그인(에이전트 목록) 설정 파일 이름
pub const PLUGIN_CONFIG_FILE: &str = "plugin.json";
/// 환경변수 접두사
pub const ENV_PREFIX: &str = "PUBLISH";
/// 설정 디렉토리 환경변수
pub const CONFIG_DIR_ENV: &str = "PUBLISH_CONFIG_DIR";

const DEFAULT_CONFIG_DIR: &str = "config";

/// 설정 디렉토리 결정: CLI 인자 → `PUBLISH_CONFIG_DIR` → `./config`
pub fn resolve_config_dir(cli: Option<&Path>) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".").join(DEFAULT_CONFIG_DIR))
}

/// 프로세스 환경변수를 적용해 로드
pub fn load(dir: &Path) -> Result<PublishConfig, CoreError> {
    load_with_env(dir, None)
}

/// 환경변수 소스를 지정해 로드 (`None`이면 프로세스 환경)
pub fn load_with_env(
    dir: &Path,
    env: Option<HashMap<String, String>>,
) -> Result<PublishConfig, CoreError> {
    let sdk_file = dir.join(SDK_CONFIG_FILE);
    if !sdk_file.is_file() {
        return Err(CoreError::Config(format!(
            "설정 파일이 없습니다: {}",
            sdk_file.display()
        )));
    }
    let plugin_file = dir.join(PLUGIN_CONFIG_FILE);

    let config = Config::builder()
        .add_source(File::from(sdk_file.as_path()).format(FileFormat::Json))
        .add_source(
            File::from(plugin_file.as_path())
                .format(FileFormat::Json)
                .required(false),
        )
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env),
        )
        .build()
        .map_err(|e| CoreError::Config(format!("설정 읽기 실패: {e}")))?;

    let parsed: PublishConfig = config
        .try_deserialize()
        .map_err(|e| CoreError::Config(format!("설정 파싱 실패: {e}")))?;

    debug!("설정 로드 완료: {}", dir.display());
    Ok(parsed)
}
