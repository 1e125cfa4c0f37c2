//! Fluxo de consulta de uma IE - camada de fluxo
//!
//! Responsabilidade central: definir o caminho completo de UMA inscrição
//!
//! Ordem das fases:
//! 1. consultar → submeter o formulário e esperar a página de resultado
//! 2. capturar → esperar o cabeçalho e baixar o HTML
//! 3. interpretar → transformar a página em dados cadastrais
//!
//! A fase em que a falha aconteceu determina o desfecho; nenhuma falha
//! individual derruba o lote.

use tracing::{error, info, warn};

use crate::models::DadosCadastrais;
use crate::services::{PortalClient, ResultPageParser};
use crate::workflow::ie_ctx::IeCtx;

/// Desfecho da consulta de uma IE
#[derive(Debug, Clone, PartialEq)]
pub enum Desfecho {
    /// Página de resultado interpretada com sucesso
    Sucesso(DadosCadastrais),
    /// O portal não chegou à página de resultado
    FalhaNavegacao(String),
    /// A página chegou, mas não pôde ser interpretada
    FalhaParse(String),
}

impl Desfecho {
    /// Texto gravado na coluna `status` da linha de resultado.
    pub fn status_persistido(&self) -> String {
        match self {
            Desfecho::Sucesso(_) => "Sucesso".to_string(),
            Desfecho::FalhaNavegacao(_) => "Erro: Navegação".to_string(),
            Desfecho::FalhaParse(causa) => format!("Erro: {causa}"),
        }
    }
}

/// Fluxo de consulta
///
/// - Orquestra as fases de uma consulta individual
/// - Não detém recursos (a sessão chega emprestada)
/// - Depende só das capacidades de portal e de parse
pub struct IeFlow {
    parser: ResultPageParser,
}

impl IeFlow {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            parser: ResultPageParser::new()?,
        })
    }

    /// Consulta uma IE na sessão dada e devolve o desfecho.
    pub async fn run(&self, portal: &dyn PortalClient, ie: &str, ctx: &IeCtx) -> Desfecho {
        info!("{} 🔍 Consultando IE {}...", ctx, ie);

        // ========== Fase 1: navegação ==========
        if let Err(e) = portal.consultar(ie).await {
            warn!("Falha na navegação IE {}: {}", ie, e);
            return Desfecho::FalhaNavegacao(e.to_string());
        }

        // ========== Fase 2: captura da página ==========
        let html = match portal.pagina_resultado().await {
            Ok(html) => html,
            Err(e) => {
                error!("Erro parser HTML: {}", e);
                return Desfecho::FalhaParse(e.to_string());
            }
        };

        // ========== Fase 3: interpretação ==========
        match self.parser.parse(&html) {
            Ok(dados) => {
                info!("{} ✓ IE {} consultada com sucesso", ctx, ie);
                Desfecho::Sucesso(dados)
            }
            Err(e) => {
                error!("Erro parser HTML: {}", e);
                Desfecho::FalhaParse(e.to_string())
            }
        }
    }
}
