//! Processamento de um lote de consultas - camada de orquestração
//!
//! ## Responsabilidades
//!
//! 1. **Origem das IEs**: PDF na primeira rodada, banco no reprocessamento
//! 2. **Sessão do portal**: uma por lote, aberta no início e encerrada no fim
//! 3. **Sequência**: consulta as IEs uma a uma, com pausa entre elas
//! 4. **Persistência**: grava cada desfecho e avança o contador do lote
//! 5. **Cancelamento**: interrompe entre uma IE e outra quando solicitado
//!
//! ## Características
//!
//! - Falha de uma IE não derruba o lote
//! - O status final do lote (`completed` ou `error`) sai deste módulo

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{CampaignStatus, DadosCadastrais, StatusConsulta};
use crate::services::{IeExtractor, PortalFactory};
use crate::storage::ConsultaStore;
use crate::workflow::{Desfecho, IeCtx, IeFlow};

/// De onde vêm as IEs de uma rodada
#[derive(Debug, Clone)]
pub enum ModoExecucao {
    /// Primeira rodada: extrai as IEs do PDF e insere as linhas de resultado
    Inicial { pdf: PathBuf },
    /// Rodada nova sobre as IEs já gravadas; só a situação cadastral muda
    Reprocessamento,
}

impl ModoExecucao {
    fn reprocesso(&self) -> bool {
        matches!(self, ModoExecucao::Reprocessamento)
    }
}

/// Executor de um lote
pub struct BatchRunner {
    store: ConsultaStore,
    portal_factory: Arc<dyn PortalFactory>,
    config: Arc<Config>,
    extractor: IeExtractor,
    flow: IeFlow,
}

impl BatchRunner {
    pub fn new(
        store: ConsultaStore,
        portal_factory: Arc<dyn PortalFactory>,
        config: Arc<Config>,
    ) -> Result<Self> {
        Ok(Self {
            store,
            portal_factory,
            config,
            extractor: IeExtractor::new()?,
            flow: IeFlow::new()?,
        })
    }

    /// Roda um lote do início ao fim; o status final fica no banco.
    pub async fn run(
        &self,
        consulta_id: &str,
        modo: ModoExecucao,
        cancelamento: CancellationToken,
    ) -> Result<()> {
        let consulta = match self.store.buscar_consulta(consulta_id).await? {
            Some(consulta) => consulta,
            None => {
                warn!("⚠️ Lote {} não existe no banco, nada a fazer", consulta_id);
                return Ok(());
            }
        };

        log_inicio(consulta_id, &modo, &consulta.filename);

        // ========== IEs da rodada ==========
        let ies = match &modo {
            ModoExecucao::Inicial { pdf } => self.extractor.extrair_de_pdf(pdf),
            ModoExecucao::Reprocessamento => {
                let ies = self.store.listar_ies(consulta_id).await?;
                info!("Reprocessando {} IEs do lote {}", ies.len(), consulta_id);
                ies
            }
        };

        if ies.is_empty() {
            warn!("⚠️ Nenhuma IE para consultar no lote {}", consulta_id);
            self.store.concluir(consulta_id, StatusConsulta::Completed).await?;
            return Ok(());
        }

        self.store.definir_total(consulta_id, ies.len() as i64).await?;

        // ========== Sessão do portal ==========
        let mut portal = match self.portal_factory.abrir_sessao().await {
            Ok(portal) => portal,
            Err(e) => {
                error!("Erro ao configurar navegador: {}", e);
                self.store.concluir(consulta_id, StatusConsulta::Error).await?;
                return Err(e).context("Sessão do portal não abriu");
            }
        };

        // ========== Consulta sequencial ==========
        let mut stats = BatchStats::default();
        for (indice, ie) in ies.iter().enumerate() {
            if cancelamento.is_cancelled() {
                warn!(
                    "⚠️ Lote {} cancelado após {} de {} IEs",
                    consulta_id,
                    indice,
                    ies.len()
                );
                portal.encerrar().await;
                self.store.concluir(consulta_id, StatusConsulta::Error).await?;
                return Ok(());
            }

            let ctx = IeCtx::new(consulta_id.to_string(), indice + 1, ies.len());
            let desfecho = self.flow.run(portal.as_ref(), ie, &ctx).await;
            stats.registrar(&desfecho);

            // a falha de gravação não interrompe as IEs seguintes
            if let Err(e) = self
                .persistir(consulta_id, ie, &desfecho, modo.reprocesso())
                .await
            {
                error!("Erro item {}: {}", ie, e);
            }
            if let Err(e) = self
                .store
                .atualizar_processado(consulta_id, (indice + 1) as i64)
                .await
            {
                error!("Erro item {}: {}", ie, e);
            }

            sleep(self.config.item_delay()).await;
        }

        portal.encerrar().await;
        self.store.concluir(consulta_id, StatusConsulta::Completed).await?;
        log_fim(consulta_id, &stats, ies.len());
        Ok(())
    }

    /// Grava o desfecho de uma IE conforme o modo da rodada.
    async fn persistir(
        &self,
        consulta_id: &str,
        ie: &str,
        desfecho: &Desfecho,
        reprocesso: bool,
    ) -> Result<()> {
        if reprocesso {
            match desfecho {
                Desfecho::Sucesso(dados) => {
                    self.store
                        .atualizar_apos_reprocesso(
                            consulta_id,
                            ie,
                            dados,
                            &desfecho.status_persistido(),
                        )
                        .await
                }
                outro => {
                    // a rodada que falhou não apaga o que a primeira gravou
                    warn!(
                        "IE {} manteve os dados anteriores ({})",
                        ie,
                        outro.status_persistido()
                    );
                    Ok(())
                }
            }
        } else {
            let vazio = DadosCadastrais::default();
            let (dados, campanha) = match desfecho {
                Desfecho::Sucesso(dados) => (dados, CampaignStatus::Pending),
                Desfecho::FalhaParse(_) => (&vazio, CampaignStatus::Pending),
                Desfecho::FalhaNavegacao(_) => (&vazio, CampaignStatus::Error),
            };
            self.store
                .inserir_resultado(consulta_id, ie, dados, &desfecho.status_persistido(), campanha)
                .await
        }
    }
}

/// Contagem dos desfechos de um lote
#[derive(Debug, Default)]
struct BatchStats {
    sucesso: usize,
    falha_navegacao: usize,
    falha_parse: usize,
}

impl BatchStats {
    fn registrar(&mut self, desfecho: &Desfecho) {
        match desfecho {
            Desfecho::Sucesso(_) => self.sucesso += 1,
            Desfecho::FalhaNavegacao(_) => self.falha_navegacao += 1,
            Desfecho::FalhaParse(_) => self.falha_parse += 1,
        }
    }
}

// ========== Funções auxiliares de log ==========

fn log_inicio(consulta_id: &str, modo: &ModoExecucao, filename: &str) {
    info!("{}", "=".repeat(60));
    match modo {
        ModoExecucao::Inicial { pdf } => {
            info!("🚀 Lote {} iniciado - arquivo {}", consulta_id, pdf.display());
        }
        ModoExecucao::Reprocessamento => {
            info!("🚀 Lote {} reaberto para reprocessamento ({})", consulta_id, filename);
        }
    }
    info!("{}", "=".repeat(60));
}

fn log_fim(consulta_id: &str, stats: &BatchStats, total: usize) {
    info!("{}", "=".repeat(60));
    info!("📊 Lote {} concluído", consulta_id);
    info!("✅ Sucesso: {}/{}", stats.sucesso, total);
    info!("❌ Falhas de navegação: {}", stats.falha_navegacao);
    info!("⚠️ Falhas de leitura da página: {}", stats.falha_parse);
    info!("{}", "=".repeat(60));
}
