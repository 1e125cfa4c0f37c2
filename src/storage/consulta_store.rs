//! Leitura e escrita das tabelas `consulta` e `resultado`.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{CampaignStatus, Consulta, DadosCadastrais, Resultado, StatusConsulta};

/// Colunas pelas quais a interface filtra as empresas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampoFiltro {
    Municipio,
    Motivo,
}

impl CampoFiltro {
    fn coluna(&self) -> &'static str {
        match self {
            CampoFiltro::Municipio => "municipio",
            CampoFiltro::Motivo => "motivo_situacao_cadastral",
        }
    }
}

/// Acesso às tabelas de lotes e de resultados
#[derive(Clone)]
pub struct ConsultaStore {
    pool: Arc<SqlitePool>,
}

impl ConsultaStore {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    // ========== Lotes ==========

    /// Registra um lote recém-criado, ainda sem total conhecido.
    pub async fn criar_consulta(&self, id: &str, filename: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO consulta (id, filename, total, processed, status, start_time) \
             VALUES (?, ?, 0, 0, ?, ?)",
        )
        .bind(id)
        .bind(filename)
        .bind(StatusConsulta::Processing)
        .bind(Utc::now())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    pub async fn buscar_consulta(&self, id: &str) -> Result<Option<Consulta>> {
        let linha = sqlx::query("SELECT * FROM consulta WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        linha.map(|l| Self::linha_para_consulta(&l)).transpose()
    }

    /// Lotes mais recentes primeiro.
    pub async fn listar_consultas(&self) -> Result<Vec<Consulta>> {
        let linhas = sqlx::query("SELECT * FROM consulta ORDER BY start_time DESC")
            .fetch_all(self.pool.as_ref())
            .await?;
        linhas.iter().map(Self::linha_para_consulta).collect()
    }

    /// Grava quantas IEs o PDF rendeu e zera o contador de processadas.
    pub async fn definir_total(&self, id: &str, total: i64) -> Result<()> {
        sqlx::query("UPDATE consulta SET total = ?, processed = 0 WHERE id = ?")
            .bind(total)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn atualizar_processado(&self, id: &str, processed: i64) -> Result<()> {
        sqlx::query("UPDATE consulta SET processed = ? WHERE id = ?")
            .bind(processed)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Encerra o lote com o status final e carimba `end_time`.
    pub async fn concluir(&self, id: &str, status: StatusConsulta) -> Result<()> {
        sqlx::query("UPDATE consulta SET status = ?, end_time = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Reabre um lote para nova rodada: volta a `processing` com contador zerado.
    pub async fn preparar_reprocessamento(&self, id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE consulta SET status = ?, processed = 0, start_time = ?, end_time = NULL \
             WHERE id = ?",
        )
        .bind(StatusConsulta::Processing)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    // ========== Resultados ==========

    pub async fn inserir_resultado(
        &self,
        consulta_id: &str,
        inscricao_estadual: &str,
        dados: &DadosCadastrais,
        status: &str,
        campanha: CampaignStatus,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO resultado (\
                consulta_id, inscricao_estadual, cnpj, razao_social, nome_fantasia, \
                unidade_fiscalizacao, logradouro, bairro_distrito, municipio, uf, cep, \
                telefone, email, atividade_economica_principal, condicao, forma_pagamento, \
                situacao_cadastral, data_situacao_cadastral, motivo_situacao_cadastral, \
                nome_contador, status, campaign_status\
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(consulta_id)
        .bind(inscricao_estadual)
        .bind(&dados.cnpj)
        .bind(&dados.razao_social)
        .bind(&dados.nome_fantasia)
        .bind(&dados.unidade_fiscalizacao)
        .bind(&dados.logradouro)
        .bind(&dados.bairro_distrito)
        .bind(&dados.municipio)
        .bind(&dados.uf)
        .bind(&dados.cep)
        .bind(&dados.telefone)
        .bind(&dados.email)
        .bind(&dados.atividade_economica_principal)
        .bind(&dados.condicao)
        .bind(&dados.forma_pagamento)
        .bind(&dados.situacao_cadastral)
        .bind(&dados.data_situacao_cadastral)
        .bind(&dados.motivo_situacao_cadastral)
        .bind(&dados.nome_contador)
        .bind(status)
        .bind(campanha)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    /// Sobrescreve apenas os campos de situação cadastral de uma linha já
    /// existente; os demais dados da primeira consulta ficam como estavam.
    pub async fn atualizar_apos_reprocesso(
        &self,
        consulta_id: &str,
        inscricao_estadual: &str,
        dados: &DadosCadastrais,
        status: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE resultado SET \
                situacao_cadastral = ?, \
                motivo_situacao_cadastral = ?, \
                data_situacao_cadastral = ?, \
                status = ? \
             WHERE consulta_id = ? AND inscricao_estadual = ?",
        )
        .bind(&dados.situacao_cadastral)
        .bind(&dados.motivo_situacao_cadastral)
        .bind(&dados.data_situacao_cadastral)
        .bind(status)
        .bind(consulta_id)
        .bind(inscricao_estadual)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    /// IEs do lote na ordem em que foram consultadas da primeira vez.
    pub async fn listar_ies(&self, consulta_id: &str) -> Result<Vec<String>> {
        let linhas =
            sqlx::query("SELECT inscricao_estadual FROM resultado WHERE consulta_id = ? ORDER BY id")
                .bind(consulta_id)
                .fetch_all(self.pool.as_ref())
                .await?;
        linhas
            .iter()
            .map(|l| l.try_get::<String, _>("inscricao_estadual").map_err(Into::into))
            .collect()
    }

    pub async fn listar_resultados(&self, consulta_id: &str) -> Result<Vec<Resultado>> {
        let linhas = sqlx::query("SELECT * FROM resultado WHERE consulta_id = ? ORDER BY id")
            .bind(consulta_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        linhas.iter().map(Self::linha_para_resultado).collect()
    }

    /// Todas as empresas já consultadas, das mais novas para as mais velhas.
    pub async fn listar_todos_resultados(&self) -> Result<Vec<Resultado>> {
        let linhas = sqlx::query("SELECT * FROM resultado ORDER BY id DESC")
            .fetch_all(self.pool.as_ref())
            .await?;
        linhas.iter().map(Self::linha_para_resultado).collect()
    }

    /// Valores únicos e não vazios de uma coluna de filtro.
    pub async fn valores_distintos(&self, campo: CampoFiltro) -> Result<Vec<String>> {
        let coluna = campo.coluna();
        let sql = format!(
            "SELECT DISTINCT {coluna} AS valor FROM resultado \
             WHERE {coluna} IS NOT NULL AND {coluna} != '' ORDER BY valor",
        );
        let linhas = sqlx::query(&sql).fetch_all(self.pool.as_ref()).await?;
        linhas
            .iter()
            .map(|l| l.try_get::<String, _>("valor").map_err(Into::into))
            .collect()
    }

    /// Localiza uma empresa pelos últimos oito dígitos do telefone.
    ///
    /// Números chegam em formatos variados (com DDI, com máscara); o sufixo
    /// de oito dígitos é o que sobrevive a todos eles. A comparação é com o
    /// texto gravado na coluna, e a linha mais recente vence.
    pub async fn buscar_por_sufixo_telefone(&self, telefone: &str) -> Result<Option<Resultado>> {
        let digitos: String = telefone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digitos.is_empty() {
            return Ok(None);
        }
        let sufixo = if digitos.len() > 8 {
            &digitos[digitos.len() - 8..]
        } else {
            &digitos[..]
        };

        let linha = sqlx::query(
            "SELECT * FROM resultado WHERE telefone LIKE ? ORDER BY id DESC LIMIT 1",
        )
        .bind(format!("%{sufixo}"))
        .fetch_optional(self.pool.as_ref())
        .await?;
        linha.map(|l| Self::linha_para_resultado(&l)).transpose()
    }

    /// Muda a etapa de campanha de uma empresa; devolve `false` se o id não existe.
    pub async fn atualizar_campanha(
        &self,
        id: i64,
        status: CampaignStatus,
        last_contacted: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let resultado = sqlx::query(
            "UPDATE resultado SET campaign_status = ?, \
             last_contacted = COALESCE(?, last_contacted) WHERE id = ?",
        )
        .bind(status)
        .bind(last_contacted)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(resultado.rows_affected() > 0)
    }

    // ========== Conversão de linhas ==========

    fn linha_para_consulta(linha: &SqliteRow) -> Result<Consulta> {
        Ok(Consulta {
            id: linha.try_get("id")?,
            filename: linha.try_get("filename")?,
            total: linha.try_get("total")?,
            processed: linha.try_get("processed")?,
            status: linha.try_get("status")?,
            start_time: linha.try_get("start_time")?,
            end_time: linha.try_get("end_time")?,
        })
    }

    fn linha_para_resultado(linha: &SqliteRow) -> Result<Resultado> {
        Ok(Resultado {
            id: linha.try_get("id")?,
            consulta_id: linha.try_get("consulta_id")?,
            inscricao_estadual: linha.try_get("inscricao_estadual")?,
            dados: DadosCadastrais {
                cnpj: linha.try_get("cnpj")?,
                razao_social: linha.try_get("razao_social")?,
                nome_fantasia: linha.try_get("nome_fantasia")?,
                unidade_fiscalizacao: linha.try_get("unidade_fiscalizacao")?,
                logradouro: linha.try_get("logradouro")?,
                bairro_distrito: linha.try_get("bairro_distrito")?,
                municipio: linha.try_get("municipio")?,
                uf: linha.try_get("uf")?,
                cep: linha.try_get("cep")?,
                telefone: linha.try_get("telefone")?,
                email: linha.try_get("email")?,
                atividade_economica_principal: linha.try_get("atividade_economica_principal")?,
                condicao: linha.try_get("condicao")?,
                forma_pagamento: linha.try_get("forma_pagamento")?,
                situacao_cadastral: linha.try_get("situacao_cadastral")?,
                data_situacao_cadastral: linha.try_get("data_situacao_cadastral")?,
                motivo_situacao_cadastral: linha.try_get("motivo_situacao_cadastral")?,
                nome_contador: linha.try_get("nome_contador")?,
            },
            status: linha.try_get("status")?,
            campaign_status: linha.try_get("campaign_status")?,
            last_contacted: linha.try_get("last_contacted")?,
            notes: linha.try_get("notes")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    async fn banco_teste() -> (tempfile::TempDir, ConsultaStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("teste.db").display());
        let db = Database::new(&url).await.unwrap();
        db.migrate().await.unwrap();
        let store = ConsultaStore::new(Arc::new(db.pool().clone()));
        (dir, store)
    }

    fn dados_exemplo() -> DadosCadastrais {
        DadosCadastrais {
            cnpj: Some("12.345.678/0001-90".to_string()),
            razao_social: Some("PADARIA CENTRAL LTDA".to_string()),
            municipio: Some("SALVADOR".to_string()),
            uf: Some("BA".to_string()),
            telefone: Some("7133334444".to_string()),
            situacao_cadastral: Some("ATIVO".to_string()),
            motivo_situacao_cadastral: Some("Não informado".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn lote_vai_e_volta_do_banco() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "empresas.pdf").await.unwrap();

        let consulta = store.buscar_consulta("lote-1").await.unwrap().unwrap();
        assert_eq!(consulta.filename, "empresas.pdf");
        assert_eq!(consulta.total, 0);
        assert_eq!(consulta.processed, 0);
        assert_eq!(consulta.status, StatusConsulta::Processing);
        assert!(consulta.end_time.is_none());

        assert!(store.buscar_consulta("inexistente").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concluir_carimba_status_e_end_time() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "a.pdf").await.unwrap();
        store.definir_total("lote-1", 3).await.unwrap();
        store.atualizar_processado("lote-1", 3).await.unwrap();
        store.concluir("lote-1", StatusConsulta::Completed).await.unwrap();

        let consulta = store.buscar_consulta("lote-1").await.unwrap().unwrap();
        assert_eq!(consulta.total, 3);
        assert_eq!(consulta.processed, 3);
        assert_eq!(consulta.status, StatusConsulta::Completed);
        assert!(consulta.end_time.is_some());
    }

    #[tokio::test]
    async fn preparar_reprocessamento_reabre_o_lote() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "a.pdf").await.unwrap();
        store.definir_total("lote-1", 2).await.unwrap();
        store.atualizar_processado("lote-1", 2).await.unwrap();
        store.concluir("lote-1", StatusConsulta::Completed).await.unwrap();

        store.preparar_reprocessamento("lote-1").await.unwrap();

        let consulta = store.buscar_consulta("lote-1").await.unwrap().unwrap();
        assert_eq!(consulta.status, StatusConsulta::Processing);
        assert_eq!(consulta.processed, 0);
        assert!(consulta.end_time.is_none());
    }

    #[tokio::test]
    async fn resultados_mantem_a_ordem_de_consulta() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "a.pdf").await.unwrap();
        for ie in ["111222333", "444555666", "777888999"] {
            store
                .inserir_resultado("lote-1", ie, &DadosCadastrais::default(), "Sucesso", CampaignStatus::Pending)
                .await
                .unwrap();
        }

        let ies = store.listar_ies("lote-1").await.unwrap();
        assert_eq!(ies, vec!["111222333", "444555666", "777888999"]);
    }

    #[tokio::test]
    async fn resultado_preserva_todos_os_campos() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "a.pdf").await.unwrap();
        let dados = dados_exemplo();
        store
            .inserir_resultado("lote-1", "111222333", &dados, "Sucesso", CampaignStatus::Pending)
            .await
            .unwrap();

        let resultados = store.listar_resultados("lote-1").await.unwrap();
        assert_eq!(resultados.len(), 1);
        let resultado = &resultados[0];
        assert_eq!(resultado.inscricao_estadual, "111222333");
        assert_eq!(resultado.dados, dados);
        assert_eq!(resultado.status, "Sucesso");
        assert_eq!(resultado.campaign_status, CampaignStatus::Pending);
        assert!(resultado.last_contacted.is_none());
        assert!(resultado.notes.is_none());
    }

    #[tokio::test]
    async fn reprocesso_so_mexe_na_situacao_cadastral() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "a.pdf").await.unwrap();
        store
            .inserir_resultado("lote-1", "111222333", &dados_exemplo(), "Sucesso", CampaignStatus::Pending)
            .await
            .unwrap();

        let novos = DadosCadastrais {
            situacao_cadastral: Some("BAIXADO".to_string()),
            data_situacao_cadastral: Some("01/07/2026".to_string()),
            motivo_situacao_cadastral: Some("BAIXA VOLUNTÁRIA".to_string()),
            // o parser devolve a página inteira, mas só a situação entra
            razao_social: Some("OUTRO NOME QUALQUER".to_string()),
            ..Default::default()
        };
        store
            .atualizar_apos_reprocesso("lote-1", "111222333", &novos, "Sucesso")
            .await
            .unwrap();

        let resultado = &store.listar_resultados("lote-1").await.unwrap()[0];
        assert_eq!(resultado.dados.situacao_cadastral.as_deref(), Some("BAIXADO"));
        assert_eq!(resultado.dados.data_situacao_cadastral.as_deref(), Some("01/07/2026"));
        assert_eq!(resultado.dados.motivo_situacao_cadastral.as_deref(), Some("BAIXA VOLUNTÁRIA"));
        assert_eq!(resultado.dados.razao_social.as_deref(), Some("PADARIA CENTRAL LTDA"));
        assert_eq!(resultado.dados.telefone.as_deref(), Some("7133334444"));
    }

    #[tokio::test]
    async fn valores_distintos_ignoram_nulos_e_vazios() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "a.pdf").await.unwrap();
        for municipio in [Some("SALVADOR"), Some("ILHÉUS"), Some("SALVADOR"), Some(""), None] {
            let dados = DadosCadastrais {
                municipio: municipio.map(str::to_string),
                motivo_situacao_cadastral: Some("Não informado".to_string()),
                ..Default::default()
            };
            store
                .inserir_resultado("lote-1", "111222333", &dados, "Sucesso", CampaignStatus::Pending)
                .await
                .unwrap();
        }

        let municipios = store.valores_distintos(CampoFiltro::Municipio).await.unwrap();
        assert_eq!(municipios, vec!["ILHÉUS", "SALVADOR"]);

        let motivos = store.valores_distintos(CampoFiltro::Motivo).await.unwrap();
        assert_eq!(motivos, vec!["Não informado"]);
    }

    #[tokio::test]
    async fn listagens_vem_das_mais_novas_para_as_mais_velhas() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "primeiro.pdf").await.unwrap();
        store.criar_consulta("lote-2", "segundo.pdf").await.unwrap();
        // fixa os instantes para a ordenação não depender do relógio
        for (id, inicio) in [("lote-1", "2026-08-20 10:00:00"), ("lote-2", "2026-08-20 11:00:00")] {
            sqlx::query("UPDATE consulta SET start_time = ? WHERE id = ?")
                .bind(inicio)
                .bind(id)
                .execute(store.pool.as_ref())
                .await
                .unwrap();
        }

        let consultas = store.listar_consultas().await.unwrap();
        let ids: Vec<&str> = consultas.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["lote-2", "lote-1"]);

        for (lote, ie) in [("lote-1", "111222333"), ("lote-2", "444555666")] {
            store
                .inserir_resultado(lote, ie, &DadosCadastrais::default(), "Sucesso", CampaignStatus::Pending)
                .await
                .unwrap();
        }
        let todos = store.listar_todos_resultados().await.unwrap();
        let ies: Vec<&str> = todos.iter().map(|r| r.inscricao_estadual.as_str()).collect();
        assert_eq!(ies, vec!["444555666", "111222333"]);
    }

    #[tokio::test]
    async fn telefone_e_encontrado_pelo_sufixo() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "a.pdf").await.unwrap();
        store
            .inserir_resultado("lote-1", "111222333", &dados_exemplo(), "Sucesso", CampaignStatus::Pending)
            .await
            .unwrap();

        // mesmo número com DDI e sem máscara
        let achado = store.buscar_por_sufixo_telefone("+55 71 3333-4444").await.unwrap();
        assert!(achado.is_some());
        assert_eq!(achado.unwrap().inscricao_estadual, "111222333");

        assert!(store.buscar_por_sufixo_telefone("9999-0000").await.unwrap().is_none());
        assert!(store.buscar_por_sufixo_telefone("sem dígito").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn atualizar_campanha_informa_se_a_linha_existe() {
        let (_dir, store) = banco_teste().await;
        store.criar_consulta("lote-1", "a.pdf").await.unwrap();
        store
            .inserir_resultado("lote-1", "111222333", &dados_exemplo(), "Sucesso", CampaignStatus::Pending)
            .await
            .unwrap();
        let id = store.listar_resultados("lote-1").await.unwrap()[0].id;

        let agora = Utc::now();
        assert!(store.atualizar_campanha(id, CampaignStatus::Sent, Some(agora)).await.unwrap());
        assert!(!store.atualizar_campanha(id + 100, CampaignStatus::Sent, None).await.unwrap());

        let resultado = &store.listar_resultados("lote-1").await.unwrap()[0];
        assert_eq!(resultado.campaign_status, CampaignStatus::Sent);
        assert!(resultado.last_contacted.is_some());
        // os dados cadastrais não entram na atualização de campanha
        assert_eq!(resultado.dados, dados_exemplo());

        // mudança de etapa sem timestamp não apaga o contato anterior
        assert!(store.atualizar_campanha(id, CampaignStatus::Replied, None).await.unwrap());
        let resultado = &store.listar_resultados("lote-1").await.unwrap()[0];
        assert_eq!(resultado.campaign_status, CampaignStatus::Replied);
        assert!(resultado.last_contacted.is_some());
    }
}
