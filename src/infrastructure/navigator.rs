//! Navegação de baixo nível no portal - camada de infraestrutura
//!
//! Responsabilidades:
//! - Deter o recurso `Page` da sessão
//! - Expor esperas e ações sobre o DOM (abrir, preencher, clicar)
//! - Não conhecer IE, lote nem o formato da página de resultado

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use tokio::time::sleep;

use crate::error::PortalError;

/// Intervalo entre sondagens do DOM durante uma espera.
const INTERVALO_SONDAGEM: Duration = Duration::from_millis(500);

/// Executor de ações sobre a página do portal
pub struct PortalNavigator {
    page: Page,
    element_wait: Duration,
}

impl PortalNavigator {
    pub fn new(page: Page, element_wait: Duration) -> Self {
        Self { page, element_wait }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navega para uma URL.
    pub async fn abrir(&self, url: &str) -> Result<(), PortalError> {
        self.page.goto(url).await?;
        Ok(())
    }

    /// Espera um elemento existir no DOM.
    pub async fn esperar_elemento(&self, seletor: &str) -> Result<(), PortalError> {
        let js = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(seletor)?
        );
        if self.sondar(&js, self.element_wait).await? {
            Ok(())
        } else {
            Err(PortalError::ElementoAusente {
                seletor: seletor.to_string(),
                limite: self.element_wait,
            })
        }
    }

    /// Limpa um campo do formulário e digita o valor.
    pub async fn preencher(&self, seletor: &str, valor: &str) -> Result<(), PortalError> {
        self.esperar_elemento(seletor).await?;
        let js = format!(
            "(() => {{ const campo = document.querySelector({sel}); campo.value = ''; campo.value = {val}; return true; }})()",
            sel = serde_json::to_string(seletor)?,
            val = serde_json::to_string(valor)?,
        );
        self.avaliar_bool(&js).await?;
        Ok(())
    }

    /// Clica em um elemento; num botão de submit isso envia o formulário.
    pub async fn clicar(&self, seletor: &str) -> Result<(), PortalError> {
        self.esperar_elemento(seletor).await?;
        let js = format!(
            "(() => {{ document.querySelector({}).click(); return true; }})()",
            serde_json::to_string(seletor)?
        );
        self.avaliar_bool(&js).await?;
        Ok(())
    }

    /// Espera a URL da página conter o fragmento dado.
    pub async fn esperar_url_contendo(&self, fragmento: &str) -> Result<(), PortalError> {
        let inicio = Instant::now();
        let mut ultima = String::new();
        loop {
            if let Some(url) = self.page.url().await? {
                if url.contains(fragmento) {
                    return Ok(());
                }
                ultima = url;
            }
            if inicio.elapsed() >= self.element_wait {
                return Err(PortalError::ResultadoNaoCarregou { url: ultima });
            }
            sleep(INTERVALO_SONDAGEM).await;
        }
    }

    /// Espera um texto aparecer no corpo renderizado da página.
    pub async fn esperar_texto(&self, texto: &str, limite: Duration) -> Result<(), PortalError> {
        let js = format!(
            "document.body !== null && document.body.innerText.includes({})",
            serde_json::to_string(texto)?
        );
        if self.sondar(&js, limite).await? {
            Ok(())
        } else {
            Err(PortalError::TextoAusente {
                texto: texto.to_string(),
                limite,
            })
        }
    }

    /// HTML completo do documento atual.
    pub async fn html(&self) -> Result<String, PortalError> {
        let js = "document.documentElement ? document.documentElement.outerHTML : ''";
        let html: String = self.page.evaluate(js).await?.into_value()?;
        Ok(html)
    }

    /// Reavalia `js` até devolver `true` ou o prazo estourar.
    async fn sondar(&self, js: &str, limite: Duration) -> Result<bool, PortalError> {
        let inicio = Instant::now();
        loop {
            match self.avaliar_bool(js).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                // o contexto JS some durante uma troca de página; dentro do
                // prazo isso só adia a próxima sondagem
                Err(PortalError::Navegador(_)) => {}
                Err(e) => return Err(e),
            }
            if inicio.elapsed() >= limite {
                return Ok(false);
            }
            sleep(INTERVALO_SONDAGEM).await;
        }
    }

    async fn avaliar_bool(&self, js: &str) -> Result<bool, PortalError> {
        let valor: bool = self.page.evaluate(js).await?.into_value()?;
        Ok(valor)
    }
}
