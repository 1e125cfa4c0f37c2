//! Fachada do aplicativo
//!
//! Monta banco, fábrica de sessões e o registro de lotes em andamento;
//! é a porta de entrada tanto do binário quanto dos testes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::orchestrator::{BatchRunner, ModoExecucao, ProgressEvent, ProgressNotifier};
use crate::services::{PortalFactory, SefazPortalFactory};
use crate::storage::{ConsultaStore, Database};

/// Resposta ao pedido de reprocessamento de um lote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reprocesso {
    /// Uma nova rodada foi disparada
    Iniciado,
    /// O lote pedido não existe
    NaoEncontrado,
    /// O lote ainda está rodando; nada foi disparado
    EmAndamento,
}

struct BatchTask {
    handle: JoinHandle<Result<()>>,
    cancelamento: CancellationToken,
}

/// Aplicativo montado
pub struct App {
    config: Arc<Config>,
    store: ConsultaStore,
    portal_factory: Arc<dyn PortalFactory>,
    tarefas: Arc<RwLock<HashMap<String, BatchTask>>>,
}

impl App {
    /// Abre o banco, garante o esquema e monta o aplicativo.
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let database = Database::new(&config.database_url).await?;
        database.migrate().await?;
        let store = ConsultaStore::new(Arc::new(database.pool().clone()));
        let portal_factory: Arc<dyn PortalFactory> =
            Arc::new(SefazPortalFactory::new(config.clone()));

        Ok(Self {
            config: Arc::new(config),
            store,
            portal_factory,
            tarefas: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Troca a fábrica de sessões; os testes entram aqui com um portal simulado.
    pub fn with_portal_factory(mut self, factory: Arc<dyn PortalFactory>) -> Self {
        self.portal_factory = factory;
        self
    }

    pub fn store(&self) -> &ConsultaStore {
        &self.store
    }

    /// Registra um lote novo e dispara o processamento do PDF em segundo plano.
    ///
    /// Devolve o identificador do lote; o andamento sai por `stream_progress`.
    pub async fn start_batch(&self, pdf: PathBuf, nome_arquivo: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.store.criar_consulta(&id, nome_arquivo).await?;
        self.disparar(&id, ModoExecucao::Inicial { pdf }).await?;
        Ok(id)
    }

    /// Dispara uma nova rodada sobre as IEs já gravadas de um lote.
    pub async fn reprocess_batch(&self, consulta_id: &str) -> Result<Reprocesso> {
        if self.rodando(consulta_id).await {
            return Ok(Reprocesso::EmAndamento);
        }
        if self.store.buscar_consulta(consulta_id).await?.is_none() {
            return Ok(Reprocesso::NaoEncontrado);
        }
        self.store.preparar_reprocessamento(consulta_id).await?;
        self.disparar(consulta_id, ModoExecucao::Reprocessamento).await?;
        Ok(Reprocesso::Iniciado)
    }

    /// Fluxo de eventos de progresso de um lote.
    pub fn stream_progress(&self, consulta_id: &str) -> mpsc::Receiver<ProgressEvent> {
        let notifier = ProgressNotifier::new(self.store.clone(), self.config.progress_poll());
        notifier.stream(consulta_id)
    }

    /// Pede o cancelamento de um lote; devolve se havia algo rodando.
    pub async fn cancel_batch(&self, consulta_id: &str) -> bool {
        let tarefas = self.tarefas.read().await;
        match tarefas.get(consulta_id) {
            Some(tarefa) if !tarefa.handle.is_finished() => {
                tarefa.cancelamento.cancel();
                true
            }
            _ => false,
        }
    }

    /// Espera o processamento de um lote terminar.
    pub async fn wait_batch(&self, consulta_id: &str) -> Result<()> {
        let tarefa = {
            let mut tarefas = self.tarefas.write().await;
            tarefas.remove(consulta_id)
        };
        match tarefa {
            Some(tarefa) => {
                tarefa.handle.await.context("Tarefa do lote abortada")??;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn rodando(&self, consulta_id: &str) -> bool {
        let tarefas = self.tarefas.read().await;
        tarefas
            .get(consulta_id)
            .map(|t| !t.handle.is_finished())
            .unwrap_or(false)
    }

    async fn disparar(&self, consulta_id: &str, modo: ModoExecucao) -> Result<()> {
        let runner = BatchRunner::new(
            self.store.clone(),
            self.portal_factory.clone(),
            self.config.clone(),
        )?;
        let cancelamento = CancellationToken::new();
        let token = cancelamento.clone();
        let id = consulta_id.to_string();

        let handle = tokio::spawn(async move { runner.run(&id, modo, token).await });

        let mut tarefas = self.tarefas.write().await;
        tarefas.insert(
            consulta_id.to_string(),
            BatchTask {
                handle,
                cancelamento,
            },
        );
        Ok(())
    }
}

// ========== Funções auxiliares de log ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 Consulta SEFAZ-BA - processamento de lotes");
    info!("📊 Banco: {}", config.database_url);
    info!("{}", "=".repeat(60));
}
