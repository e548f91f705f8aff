use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Catalog of well-known banks offered as corrections alongside stored names.
    #[serde(default = "default_known_banks")]
    pub known_banks: Vec<String>,
    /// Category that applies to every purchase, searched when nothing else matches.
    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,
    #[serde(default = "default_list_count")]
    pub list_default_count: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_known_banks() -> Vec<String> {
    [
        "Тинькофф",
        "Сбер",
        "Сбербанк",
        "Альфа-Банк",
        "Альфа",
        "ВТБ",
        "Райффайзен",
        "Газпромбанк",
        "Открытие",
        "Росбанк",
        "МТС Банк",
        "Совкомбанк",
        "Ак Барс",
        "Уралсиб",
        "Промсвязьбанк",
        "Банк Санкт-Петербург",
        "Хоум Кредит",
        "Русский Стандарт",
        "Почта Банк",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_fallback_category() -> String {
    "Все покупки".to_string()
}

fn default_list_count() -> usize {
    5
}

fn default_page_size() -> usize {
    10
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            known_banks: default_known_banks(),
            fallback_category: default_fallback_category(),
            list_default_count: default_list_count(),
            page_size: default_page_size(),
            log_filter: default_log_filter(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cashback-advisor")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("cashback-advisor")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AdvisorError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
