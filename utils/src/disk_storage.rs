//! Utilities for storing a struct in a file on the disk.
//! The struct should implement Serialize and Deserialize from serde.
//! Supported file formats are TOML and YAML.
//!
//! Files live in `~/.hb`, or in the directory named by `HB_HOME` if set.

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use serde::{de::DeserializeOwned, Serialize};

pub const HOME_ENV_VAR: &str = "HB_HOME";

pub enum FileFormat {
    TOML,
    YAML,
}

impl FileFormat {
    fn extension(&self) -> &'static str {
        match self {
            FileFormat::TOML => "toml",
            FileFormat::YAML => "yaml",
        }
    }
}

/// Directory holding all files of the app.
pub fn base_dir() -> crate::Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV_VAR) {
        return Ok(PathBuf::from(dir));
    }

    let dirs = BaseDirs::new().ok_or(crate::Error::BaseDirsFailed)?;
    Ok(dirs.home_dir().join(".hb"))
}

pub trait DiskStorageInterface
where
    Self: Sized + Debug + Default + Serialize + DeserializeOwned,
{
    const FILE_NAME: &'static str;
    const FORMAT: FileFormat;

    /// Get the path to the file
    fn path() -> crate::Result<PathBuf> {
        Ok(base_dir()?
            .join(Self::FILE_NAME)
            .with_extension(Self::FORMAT.extension()))
    }

    fn load() -> crate::Result<Self> {
        Self::load_from(&Self::path()?)
    }

    fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Load the content from the file if it exists otherwise return the default value
    fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| crate::Error::FileReadFailed(path.to_path_buf(), e))?;

        match Self::FORMAT {
            FileFormat::TOML => toml::from_str(&content)
                .map_err(|e| crate::Error::TomlParsingFailed(path.to_path_buf(), e)),
            FileFormat::YAML => serde_yaml::from_str(&content)
                .map_err(|e| crate::Error::YamlParsingFailed(path.to_path_buf(), e)),
        }
    }

    /// Save content to a file, creating the directories and file as necessary
    fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| crate::Error::CreateDirAllFailed(parent.to_path_buf(), e))?;
        }

        let content = match Self::FORMAT {
            FileFormat::TOML => toml::to_string_pretty(self)
                .map_err(|e| crate::Error::TomlFormattingFailed(format!("{self:?}"), e))?,
            FileFormat::YAML => serde_yaml::to_string(self)
                .map_err(|e| crate::Error::YamlFormattingFailed(format!("{self:?}"), e))?,
        };

        fs::write(path, content).map_err(|e| crate::Error::FileWriteFailed(path.to_path_buf(), e))
    }
}
