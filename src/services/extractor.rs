//! Extração de inscrições estaduais a partir de arquivos PDF.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use lopdf::Document;
use regex::Regex;
use tracing::{error, info, warn};

/// Padrão das IEs impressas nos relatórios: três grupos de dígitos
/// separados por ponto, seguidos de hífen.
const PADRAO_IE: &str = r"(\d{1,3}\.\d{1,3}\.\d{1,3})\s*-";

/// Quantos dígitos uma inscrição estadual da Bahia tem.
const DIGITOS_IE: usize = 9;

pub struct IeExtractor {
    padrao: Regex,
}

impl IeExtractor {
    pub fn new() -> Result<Self> {
        let padrao = Regex::new(PADRAO_IE).context("Padrão de IE inválido")?;
        Ok(Self { padrao })
    }

    /// Lê o PDF e devolve as IEs encontradas, sem repetição e na ordem em
    /// que aparecem. Um arquivo ilegível conta como nenhuma IE.
    pub fn extrair_de_pdf(&self, caminho: &Path) -> Vec<String> {
        info!("Lendo PDF: {}", caminho.display());
        match self.texto_do_documento(caminho) {
            Ok(texto) => {
                let ies = self.extrair_do_texto(&texto);
                info!("✓ {} IEs encontradas em {}", ies.len(), caminho.display());
                ies
            }
            Err(e) => {
                error!("Erro ao ler PDF {}: {}", caminho.display(), e);
                Vec::new()
            }
        }
    }

    /// Aplica o padrão ao texto e guarda só os candidatos com nove dígitos.
    pub fn extrair_do_texto(&self, texto: &str) -> Vec<String> {
        let mut vistas = HashSet::new();
        let mut ies = Vec::new();
        for captura in self.padrao.captures_iter(texto) {
            let digitos: String = captura[1].chars().filter(|c| c.is_ascii_digit()).collect();
            if digitos.len() == DIGITOS_IE && vistas.insert(digitos.clone()) {
                ies.push(digitos);
            }
        }
        ies
    }

    fn texto_do_documento(&self, caminho: &Path) -> Result<String> {
        let documento = Document::load(caminho)
            .with_context(|| format!("Falha ao abrir {}", caminho.display()))?;

        let mut paginas = Vec::new();
        for (numero, _) in documento.get_pages() {
            // uma página sem texto extraível não derruba o resto do arquivo
            if let Ok(texto) = documento.extract_text(&[numero]) {
                paginas.push(texto);
            } else {
                warn!("⚠ Página {} sem texto extraível em {}", numero, caminho.display());
            }
        }
        Ok(paginas.join("\n"))
    }
}
