//! Interpretação do HTML da página de resultado do portal.
//!
//! A página é uma tabela antiga de rótulos em negrito seguidos do valor no
//! mesmo nó de texto, então a extração anda pela árvore em vez de usar
//! seletores por campo.

use anyhow::Result;
use scraper::{ElementRef, Html, Selector};

use crate::error::ParseError;
use crate::models::DadosCadastrais;

/// Cabeçalho que identifica a página de consulta básica.
pub const CABECALHO_RESULTADO: &str = "Consulta Básica ao Cadastro do ICMS da Bahia";

/// Rótulo da seção cujo valor fica na linha seguinte da tabela.
const ROTULO_ATIVIDADE: &str = "Atividade Econômica";

/// Valor gravado quando a página não informa o motivo da situação.
const MOTIVO_PADRAO: &str = "Não informado";

pub struct ResultPageParser {
    sel_b: Selector,
}

impl ResultPageParser {
    pub fn new() -> Result<Self> {
        let sel_b = Selector::parse("b").map_err(|e| anyhow::anyhow!("seletor inválido: {e}"))?;
        Ok(Self { sel_b })
    }

    /// Extrai os dados cadastrais da página de resultado.
    ///
    /// Campos que a página omite ficam `None`; só o motivo da situação
    /// ganha um valor padrão, porque a interface sempre o exibe.
    pub fn parse(&self, html: &str) -> Result<DadosCadastrais, ParseError> {
        let doc = Html::parse_document(html);
        if !Self::contem_cabecalho(&doc) {
            return Err(ParseError::CabecalhoAusente(CABECALHO_RESULTADO.to_string()));
        }

        let mut dados = DadosCadastrais {
            cnpj: self.valor_do_rotulo(&doc, "CNPJ:"),
            razao_social: self.valor_do_rotulo(&doc, "Razão Social:"),
            nome_fantasia: self.valor_do_rotulo(&doc, "Nome Fantasia:"),
            unidade_fiscalizacao: self.valor_do_rotulo(&doc, "Unidade de Fiscalização:"),
            logradouro: self.valor_do_rotulo(&doc, "Logradouro:"),
            bairro_distrito: self.valor_do_rotulo(&doc, "Bairro/Distrito:"),
            municipio: self.valor_do_rotulo(&doc, "Município:"),
            uf: self.valor_do_rotulo(&doc, "UF:"),
            cep: self.valor_do_rotulo(&doc, "CEP:"),
            telefone: self.valor_do_rotulo(&doc, "Telefone:"),
            email: self.valor_do_rotulo(&doc, "E-mail:"),
            atividade_economica_principal: self.atividade_economica(&doc),
            condicao: self.valor_do_rotulo(&doc, "Condição:"),
            forma_pagamento: self.valor_do_rotulo(&doc, "Forma de pagamento:"),
            situacao_cadastral: self.valor_do_rotulo(&doc, "Situação Cadastral Vigente:"),
            data_situacao_cadastral: self.valor_do_rotulo(&doc, "Data desta Situação Cadastral:"),
            motivo_situacao_cadastral: self.valor_do_rotulo(&doc, "Motivo desta Situação Cadastral:"),
            nome_contador: self.valor_do_rotulo(&doc, "Nome:"),
        };
        if dados.motivo_situacao_cadastral.is_none() {
            dados.motivo_situacao_cadastral = Some(MOTIVO_PADRAO.to_string());
        }
        Ok(dados)
    }

    fn contem_cabecalho(doc: &Html) -> bool {
        let texto: String = doc.root_element().text().collect();
        texto.replace('\u{a0}', " ").contains(CABECALHO_RESULTADO)
    }

    /// Valor é o nó de texto imediatamente após o `<b>` do rótulo.
    fn valor_do_rotulo(&self, doc: &Html, rotulo: &str) -> Option<String> {
        let b = doc
            .select(&self.sel_b)
            .find(|b| Self::texto_normalizado(b).contains(rotulo))?;
        let valor = b.next_sibling()?.value().as_text()?.to_string();
        Self::limpar_texto(&valor)
    }

    /// O valor da atividade econômica fica na linha seguinte da tabela.
    fn atividade_economica(&self, doc: &Html) -> Option<String> {
        let b = doc
            .select(&self.sel_b)
            .find(|b| Self::texto_normalizado(b).contains(ROTULO_ATIVIDADE))?;
        let linha = Self::linha_da_tabela(&b)?;
        let proxima = linha
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "tr")?;
        Self::limpar_texto(&proxima.text().collect::<String>())
    }

    fn linha_da_tabela<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        let mut atual = el.parent();
        while let Some(no) = atual {
            if let Some(pai) = ElementRef::wrap(no) {
                if pai.value().name() == "tr" {
                    return Some(pai);
                }
            }
            atual = no.parent();
        }
        None
    }

    fn texto_normalizado(el: &ElementRef) -> String {
        let texto: String = el.text().collect();
        texto.replace('\u{a0}', " ")
    }

    fn limpar_texto(texto: &str) -> Option<String> {
        let sem_nbsp = texto.replace('\u{a0}', " ");
        let limpo = sem_nbsp.trim();
        if limpo.is_empty() {
            None
        } else {
            Some(limpo.to_string())
        }
    }
}
