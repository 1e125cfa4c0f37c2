//! Sessão de consulta no portal da SEFAZ.
//!
//! Responsabilidades:
//! - Submeter o formulário de consulta por IE
//! - Esperar e capturar a página de resultado
//! - Encerrar o navegador ao fim do lote

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Browser;
use tracing::{debug, warn};

use crate::browser::launch_portal_browser;
use crate::config::Config;
use crate::error::PortalError;
use crate::infrastructure::PortalNavigator;
use crate::services::parser::CABECALHO_RESULTADO;

/// Campo do formulário onde a IE é digitada.
pub const CAMPO_IE: &str = r#"input[name="IE"]"#;

/// Botão que dispara a consulta por inscrição estadual.
pub const BOTAO_CONSULTA: &str = r#"input[type="submit"][name="B2"][value*="IE"]"#;

/// Uma sessão aberta no portal, capaz de consultar IEs em sequência
#[async_trait]
pub trait PortalClient: Send + Sync {
    /// Volta ao formulário, digita a IE e submete a consulta.
    async fn consultar(&self, ie: &str) -> Result<(), PortalError>;

    /// Espera a página de resultado carregar e devolve o HTML dela.
    async fn pagina_resultado(&self) -> Result<String, PortalError>;

    /// Encerra a sessão e libera o navegador.
    async fn encerrar(&mut self);
}

/// Fábrica de sessões; cada lote abre e encerra a sua
#[async_trait]
pub trait PortalFactory: Send + Sync {
    async fn abrir_sessao(&self) -> Result<Box<dyn PortalClient>, PortalError>;
}

/// Sessão real sobre um Chrome sem interface
pub struct SefazPortal {
    browser: Browser,
    navigator: PortalNavigator,
    portal_url: String,
    result_url_fragment: String,
    banner_wait: Duration,
}

impl SefazPortal {
    pub async fn abrir(config: &Config) -> Result<Self, PortalError> {
        let (browser, page) = launch_portal_browser(config)
            .await
            .map_err(|e| PortalError::Sessao { causa: e.to_string() })?;
        Ok(Self {
            browser,
            navigator: PortalNavigator::new(page, config.element_wait()),
            portal_url: config.portal_url.clone(),
            result_url_fragment: config.result_url_fragment.clone(),
            banner_wait: config.banner_wait(),
        })
    }
}

#[async_trait]
impl PortalClient for SefazPortal {
    async fn consultar(&self, ie: &str) -> Result<(), PortalError> {
        debug!("Consultando IE {} no portal", ie);
        self.navigator.abrir(&self.portal_url).await?;
        self.navigator.preencher(CAMPO_IE, ie).await?;
        self.navigator.clicar(BOTAO_CONSULTA).await?;
        self.navigator
            .esperar_url_contendo(&self.result_url_fragment)
            .await?;
        Ok(())
    }

    async fn pagina_resultado(&self) -> Result<String, PortalError> {
        self.navigator
            .esperar_texto(CABECALHO_RESULTADO, self.banner_wait)
            .await?;
        self.navigator.html().await
    }

    async fn encerrar(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Falha ao fechar o navegador: {}", e);
        }
        let _ = self.browser.wait().await;
    }
}

/// Abre sessões reais no portal configurado
pub struct SefazPortalFactory {
    config: Config,
}

impl SefazPortalFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PortalFactory for SefazPortalFactory {
    async fn abrir_sessao(&self) -> Result<Box<dyn PortalClient>, PortalError> {
        let portal = SefazPortal::abrir(&self.config).await?;
        Ok(Box::new(portal))
    }
}
