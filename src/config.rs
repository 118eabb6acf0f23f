use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v9";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const APP_DIR: &str = "toggl-duplicator";
const TOKEN_FILE: &str = "api_token";

/// Toggl APIと通信するための設定。
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_token: String,
    pub api_url: String,
    /// 1リクエストあたりのタイムアウト。
    pub timeout: Duration,
}

impl Config {
    /// 環境変数と設定ディレクトリから設定を読み込む。
    ///
    /// 環境変数`TOGGL_API_TOKEN`が設定されていない場合は、
    /// `<config_dir>/toggl-duplicator/api_token`からトークンを読み込む。
    pub fn load() -> Result<Self, ConfigError> {
        let token_path = dirs::config_dir().map(|dir| dir.join(APP_DIR).join(TOKEN_FILE));
        Self::from_lookup(|key| env::var(key).ok(), token_path)
    }

    /// 値の取得方法を指定して設定を読み込む。
    fn from_lookup<F>(lookup: F, token_path: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = match lookup("TOGGL_API_TOKEN").filter(|token| !token.trim().is_empty()) {
            Some(token) => token.trim().to_string(),
            None => read_token_file(token_path)?,
        };
        let api_url = lookup("TOGGL_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_secs = match lookup("TOGGL_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "TOGGL_TIMEOUT_SECS".to_string(),
                    value,
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_token,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// トークンファイルからAPIトークンを読み込む。
fn read_token_file(path: Option<PathBuf>) -> Result<String, ConfigError> {
    let Some(path) = path else {
        return Err(ConfigError::MissingToken { path: None });
    };
    let display_path = path.display().to_string();

    match fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => Ok(content.trim().to_string()),
        Ok(_) => Err(ConfigError::MissingToken {
            path: Some(display_path),
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::MissingToken {
            path: Some(display_path),
        }),
        Err(original) => Err(ConfigError::TokenFile {
            path: display_path,
            original,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

    use rstest::rstest;

    use super::{Config, DEFAULT_API_URL};
    use crate::error::ConfigError;

    /// テスト用の環境変数を返す関数を作成する。
    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    /// テスト用の一時ファイルパスを作成する。
    fn temp_token_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("toggl-duplicator-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_defaults_with_token() {
        let config = Config::from_lookup(lookup(&[("TOGGL_API_TOKEN", "abc")]), None).unwrap();

        assert_eq!(
            config,
            Config {
                api_token: "abc".to_string(),
                api_url: DEFAULT_API_URL.to_string(),
                timeout: Duration::from_secs(30),
            }
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(
            lookup(&[
                ("TOGGL_API_TOKEN", " abc \n"),
                ("TOGGL_API_URL", "http://localhost:1234/"),
                ("TOGGL_TIMEOUT_SECS", "5"),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.api_token, "abc");
        assert_eq!(config.api_url, "http://localhost:1234");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[rstest]
    #[case::no_config_dir(None)]
    #[case::no_file(Some(temp_token_path("missing")))]
    fn test_missing_token(#[case] path: Option<PathBuf>) {
        let result = Config::from_lookup(lookup(&[]), path);

        assert!(matches!(result, Err(ConfigError::MissingToken { .. })));
    }

    #[test]
    fn test_empty_env_token_falls_back_to_file() {
        let path = temp_token_path("api_token_fallback");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "from-file\n").unwrap();

        let config =
            Config::from_lookup(lookup(&[("TOGGL_API_TOKEN", "")]), Some(path.clone())).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.api_token, "from-file");
    }

    /// トークンファイルを読めない場合は原因となったI/Oエラーを保持する。
    #[test]
    fn test_unreadable_token_file_keeps_source() {
        let path = temp_token_path("api_token_dir");
        fs::create_dir_all(&path).unwrap();

        let err = Config::from_lookup(lookup(&[]), Some(path.clone())).unwrap_err();
        fs::remove_dir(&path).unwrap();

        assert!(matches!(err, ConfigError::TokenFile { .. }));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn test_invalid_timeout() {
        let result = Config::from_lookup(
            lookup(&[("TOGGL_API_TOKEN", "abc"), ("TOGGL_TIMEOUT_SECS", "soon")]),
            None,
        );

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key, value }) if key == "TOGGL_TIMEOUT_SECS" && value == "soon"
        ));
    }
}
