//! Configuração do hirepath carregada a partir de `hirepath.toml`.
//!
//! A struct [`HiringConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `HIREPATH_API_TOKEN` e `HIREPATH_API_URL` têm
//! precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::pipeline::{PagingConfig, PipelineSettings};

/// Nome do arquivo procurado no diretório atual.
pub const CONFIG_FILE: &str = "hirepath.toml";

/// Configuração de nível superior carregada de `hirepath.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct HiringConfig {
    /// URL base da API de recrutamento.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Token bearer usado nas requisições.
    #[serde(default)]
    pub api_token: String,

    /// Valor gravado em `created_by` nos registros criados na progressão.
    #[serde(default = "default_created_by")]
    pub created_by: String,

    /// Registros por página na listagem de candidatos.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Páginas buscadas em paralelo por lote.
    #[serde(default = "default_page_concurrency")]
    pub page_concurrency: usize,

    /// Validade das listagens em cache, em segundos.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Pausa entre avaliações consecutivas, em milissegundos.
    #[serde(default = "default_evaluation_delay_ms")]
    pub evaluation_delay_ms: u64,

    /// Filtro de log usado quando `RUST_LOG` não está definido.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_created_by() -> String {
    "hirepath".to_string()
}

fn default_page_size() -> u32 {
    50
}

// Três requisições simultâneas por lote.
fn default_page_concurrency() -> usize {
    3
}

// 30 minutos.
fn default_cache_ttl_secs() -> u64 {
    30 * 60
}

fn default_evaluation_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HiringConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: String::new(),
            created_by: default_created_by(),
            page_size: default_page_size(),
            page_concurrency: default_page_concurrency(),
            cache_ttl_secs: default_cache_ttl_secs(),
            evaluation_delay_ms: default_evaluation_delay_ms(),
            log_level: default_log_level(),
        }
    }
}

impl HiringConfig {
    /// Carrega `hirepath.toml` do diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<HiringConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    // Variáveis de ambiente têm precedência sobre o arquivo.
    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = lookup("HIREPATH_API_TOKEN").filter(|v| !v.is_empty()) {
            self.api_token = token;
        }
        if let Some(url) = lookup("HIREPATH_API_URL").filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn evaluation_delay(&self) -> Duration {
        Duration::from_millis(self.evaluation_delay_ms)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            cache_ttl: self.cache_ttl(),
            paging: PagingConfig {
                page_size: self.page_size.max(1),
                page_concurrency: self.page_concurrency.max(1),
            },
            created_by: self.created_by.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = HiringConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000/api/v1");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.page_concurrency, 3);
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.evaluation_delay(), Duration::from_secs(1));
        assert!(config.api_token.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            api_url = "https://ats.example.com/api/v1"
            page_concurrency = 5
        "#;
        let config: HiringConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_url, "https://ats.example.com/api/v1");
        assert_eq!(config.page_concurrency, 5);
        assert_eq!(config.created_by, "hirepath");
        assert_eq!(config.cache_ttl_secs, 1800);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "created_by = \"recruiter-7\"\ncache_ttl_secs = 60").unwrap();

        let config = HiringConfig::load_from(file.path()).unwrap();
        assert_eq!(config.created_by, "recruiter-7");
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_size = \"many\"").unwrap();
        assert!(HiringConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HiringConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn env_overrides_take_precedence() {
        let config = HiringConfig {
            api_token: "from-file".into(),
            ..HiringConfig::default()
        }
        .with_env_overrides(|key| match key {
            "HIREPATH_API_TOKEN" => Some("from-env".into()),
            "HIREPATH_API_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api_token, "from-env");
        assert_eq!(config.api_url, "http://localhost:8000/api/v1");
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let config = HiringConfig {
            page_concurrency: 0,
            ..HiringConfig::default()
        };
        assert_eq!(config.pipeline_settings().paging.page_concurrency, 1);
    }
}
