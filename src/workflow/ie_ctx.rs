//! Contexto da consulta em andamento
//!
//! Diz "qual posição de qual lote está sendo consultada agora"

use std::fmt::Display;

/// Posição de uma IE dentro do processamento de um lote
#[derive(Debug, Clone)]
pub struct IeCtx {
    /// Identificador do lote
    pub consulta_id: String,

    /// Posição da IE no lote (a partir de 1, só para log)
    pub indice: usize,

    /// Quantas IEs o lote tem
    pub total: usize,
}

impl IeCtx {
    pub fn new(consulta_id: String, indice: usize, total: usize) -> Self {
        Self {
            consulta_id,
            indice,
            total,
        }
    }
}

impl Display for IeCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[lote {} IE {}/{}]", self.consulta_id, self.indice, self.total)
    }
}
