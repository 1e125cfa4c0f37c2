use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Configuração do programa
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL do banco SQLite
    pub database_url: String,
    /// URL do formulário de consulta do portal
    pub portal_url: String,
    /// Fragmento que a URL da página de resultado contém
    pub result_url_fragment: String,
    /// Caminho do executável do Chrome (vazio = autodetectar)
    pub chrome_executable: String,
    /// Quantos segundos esperar por elementos do formulário
    pub element_wait_secs: u64,
    /// Quantos segundos esperar pelo cabeçalho da página de resultado
    pub banner_wait_secs: u64,
    /// Pausa entre consultas, em milissegundos
    pub item_delay_ms: u64,
    /// Intervalo de sondagem do progresso, em milissegundos
    pub progress_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:consultas.db".to_string(),
            portal_url: "https://portal.sefaz.ba.gov.br/scripts/cadastro/cadastroBa/consultaBa.asp".to_string(),
            result_url_fragment: "result.asp".to_string(),
            chrome_executable: String::new(),
            element_wait_secs: 10,
            banner_wait_secs: 5,
            item_delay_ms: 1000,
            progress_poll_ms: 1000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(default.database_url),
            portal_url: std::env::var("PORTAL_URL").unwrap_or(default.portal_url),
            result_url_fragment: std::env::var("RESULT_URL_FRAGMENT").unwrap_or(default.result_url_fragment),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").unwrap_or(default.chrome_executable),
            element_wait_secs: std::env::var("ELEMENT_WAIT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.element_wait_secs),
            banner_wait_secs: std::env::var("BANNER_WAIT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.banner_wait_secs),
            item_delay_ms: std::env::var("ITEM_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.item_delay_ms),
            progress_poll_ms: std::env::var("PROGRESS_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.progress_poll_ms),
        }
    }

    /// Carrega a configuração de um arquivo TOML; campos ausentes ficam com o padrão.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conteudo = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Falha ao ler arquivo de configuração: {}", path.display()))?;
        let config: Config = toml::from_str(&conteudo)
            .with_context(|| format!("Arquivo de configuração inválido: {}", path.display()))?;
        Ok(config)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn banner_wait(&self) -> Duration {
        Duration::from_secs(self.banner_wait_secs)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn progress_poll(&self) -> Duration {
        Duration::from_millis(self.progress_poll_ms)
    }
}
