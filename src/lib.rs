//! # Consulta SEFAZ
//!
//! Pipeline de consulta em lote ao cadastro do ICMS da Bahia: lê um PDF
//! com inscrições estaduais, consulta cada uma no portal da SEFAZ com um
//! Chrome sem interface e persiste os dados cadastrais em SQLite.
//!
//! ## Arquitetura
//!
//! O sistema segue quatro camadas estritas:
//!
//! ### ① Camada de infraestrutura (Infrastructure)
//! - `infrastructure/` - detém o recurso escasso (a `Page`), só expõe capacidades
//! - `PortalNavigator` - único dono da página, oferece esperas e ações no DOM
//!
//! ### ② Camada de capacidades (Services)
//! - `services/` - descreve "o que sei fazer", sempre sobre uma IE
//! - `IeExtractor` - extrair IEs de um PDF
//! - `PortalClient` / `SefazPortal` - consultar uma IE no portal
//! - `ResultPageParser` - interpretar a página de resultado
//!
//! ### ③ Camada de fluxo (Workflow)
//! - `workflow/` - define o caminho completo de UMA inscrição
//! - `IeCtx` - contexto (lote + posição)
//! - `IeFlow` - fases (consultar → capturar → interpretar) e o `Desfecho`
//!
//! ### ④ Camada de orquestração (Orchestration)
//! - `orchestrator/batch_runner` - processa um lote inteiro e grava tudo
//! - `orchestrator/progress` - sonda o banco e emite eventos de progresso
//!
//! A fachada `App` amarra as camadas e registra os lotes em andamento.
//!
//! ## Estrutura de módulos

pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod storage;
pub mod workflow;

// Reexporta os tipos mais usados
pub use app::{App, Reprocesso};
pub use config::Config;
pub use error::{ParseError, PortalError};
pub use infrastructure::PortalNavigator;
pub use models::{CampaignStatus, Consulta, DadosCadastrais, Resultado, StatusConsulta};
pub use orchestrator::{BatchRunner, ModoExecucao, ProgressEvent, ProgressNotifier};
pub use services::{IeExtractor, PortalClient, PortalFactory, ResultPageParser, SefazPortalFactory};
pub use storage::{CampoFiltro, ConsultaStore, Database};
pub use workflow::{Desfecho, IeCtx, IeFlow};
