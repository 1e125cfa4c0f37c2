//! Camada de orquestração
//!
//! ## Responsabilidade
//!
//! Esta camada dispara lotes de consulta e acompanha o andamento deles.
//!
//! ## Módulos
//!
//! ### `batch_runner` - execução de um lote
//! - Decide a origem das IEs (PDF na primeira rodada, banco depois)
//! - Abre e encerra a sessão do portal
//! - Grava cada desfecho e o status final do lote
//!
//! ### `progress` - acompanhamento
//! - Sonda o banco em intervalo fixo
//! - Transforma avanços do lote em eventos para a interface
//!
//! ## Hierarquia
//!
//! ```text
//! batch_runner (processa um lote de IEs)
//!     ↓
//! workflow::IeFlow (consulta uma IE)
//!     ↓
//! services (capacidades: portal / parser / extractor)
//!     ↓
//! infrastructure (PortalNavigator)
//! ```

pub mod batch_runner;
pub mod progress;

pub use batch_runner::{BatchRunner, ModoExecucao};
pub use progress::{ProgressEvent, ProgressNotifier};
