//! Acompanhamento do progresso de um lote.
//!
//! A interface acompanha o lote por um fluxo de eventos; aqui o banco é
//! sondado em intervalo fixo e cada avanço vira um quadro no canal.

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::warn;

use crate::models::StatusConsulta;
use crate::storage::ConsultaStore;

/// Um quadro do acompanhamento de um lote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Estado atual do lote
    Snapshot {
        total: i64,
        processed: i64,
        status: StatusConsulta,
    },
    /// O lote pedido não existe
    NaoEncontrado,
}

impl ProgressEvent {
    /// Corpo JSON de um quadro, no formato que a interface espera.
    pub fn como_json(&self) -> String {
        match self {
            ProgressEvent::Snapshot {
                total,
                processed,
                status,
            } => json!({ "total": total, "processed": processed, "status": status }).to_string(),
            ProgressEvent::NaoEncontrado => json!({ "status": "not_found" }).to_string(),
        }
    }
}

/// Observador de um lote: transforma o estado no banco em eventos
pub struct ProgressNotifier {
    store: ConsultaStore,
    intervalo: Duration,
}

impl ProgressNotifier {
    pub fn new(store: ConsultaStore, intervalo: Duration) -> Self {
        Self { store, intervalo }
    }

    /// Sonda o lote até ele chegar a um estado terminal; o canal fecha junto.
    ///
    /// Sai um quadro sempre que `processed` muda e um último quando o
    /// status vira terminal; lote inexistente rende um único `NaoEncontrado`.
    pub fn stream(&self, consulta_id: &str) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(16);
        let store = self.store.clone();
        let consulta_id = consulta_id.to_string();
        let intervalo = self.intervalo;

        tokio::spawn(async move {
            let mut ultimo_processado: i64 = -1;
            loop {
                let consulta = match store.buscar_consulta(&consulta_id).await {
                    Ok(Some(consulta)) => consulta,
                    Ok(None) => {
                        let _ = tx.send(ProgressEvent::NaoEncontrado).await;
                        break;
                    }
                    Err(e) => {
                        warn!("Falha ao sondar o lote {}: {}", consulta_id, e);
                        break;
                    }
                };

                let terminal = consulta.status.terminal();
                if consulta.processed != ultimo_processado || terminal {
                    ultimo_processado = consulta.processed;
                    let quadro = ProgressEvent::Snapshot {
                        total: consulta.total,
                        processed: consulta.processed,
                        status: consulta.status,
                    };
                    // receptor desligado encerra a sondagem
                    if tx.send(quadro).await.is_err() {
                        break;
                    }
                }
                if terminal {
                    break;
                }
                sleep(intervalo).await;
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadro_segue_o_formato_da_interface() {
        let quadro = ProgressEvent::Snapshot {
            total: 5,
            processed: 2,
            status: StatusConsulta::Processing,
        };
        assert_eq!(
            quadro.como_json(),
            r#"{"processed":2,"status":"processing","total":5}"#
        );
        assert_eq!(
            ProgressEvent::NaoEncontrado.como_json(),
            r#"{"status":"not_found"}"#
        );
    }
}
