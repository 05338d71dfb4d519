//! Settings storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The home directory could not be determined.
    #[error("ホームディレクトリが見つかりません")]
    HomeDirNotFound,

    /// The settings file could not be read.
    #[error("設定ファイルの読み込みに失敗しました ({path}): {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file could not be written.
    #[error("設定ファイルの書き込みに失敗しました ({path}): {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file exists but is not valid JSON.
    #[error("設定ファイルの形式が不正です ({path}): {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The settings could not be serialized.
    #[error("設定のシリアライズに失敗しました: {0}")]
    Serialize(#[from] serde_json::Error),
}
