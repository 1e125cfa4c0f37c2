//! Conexão com o banco SQLite e criação do esquema.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

/// Pool de conexões com o banco de consultas
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Abre (e cria, se preciso) o banco apontado por `database_url`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let caminho = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        // Bancos em memória não têm arquivo para preparar.
        if !caminho.contains(":memory:") {
            if let Some(pai) = std::path::Path::new(caminho).parent() {
                std::fs::create_dir_all(pai)
                    .with_context(|| format!("Falha ao criar diretório do banco: {}", pai.display()))?;
            }
            if !std::path::Path::new(caminho).exists() {
                std::fs::File::create(caminho)
                    .with_context(|| format!("Falha ao criar arquivo do banco: {caminho}"))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .with_context(|| format!("Falha ao conectar em {database_url}"))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cria as tabelas do esquema quando ainda não existem.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS consulta (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                total INTEGER NOT NULL DEFAULT 0,
                processed INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'processing',
                start_time TEXT NOT NULL,
                end_time TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resultado (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                consulta_id TEXT NOT NULL,
                inscricao_estadual TEXT NOT NULL,
                cnpj TEXT,
                razao_social TEXT,
                nome_fantasia TEXT,
                unidade_fiscalizacao TEXT,
                logradouro TEXT,
                bairro_distrito TEXT,
                municipio TEXT,
                uf TEXT,
                cep TEXT,
                telefone TEXT,
                email TEXT,
                atividade_economica_principal TEXT,
                condicao TEXT,
                forma_pagamento TEXT,
                situacao_cadastral TEXT,
                data_situacao_cadastral TEXT,
                motivo_situacao_cadastral TEXT,
                nome_contador TEXT,
                status TEXT NOT NULL,
                campaign_status TEXT NOT NULL DEFAULT 'pending',
                last_contacted TEXT,
                notes TEXT,
                FOREIGN KEY (consulta_id) REFERENCES consulta (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_resultado_consulta ON resultado (consulta_id)",
        )
        .execute(&self.pool)
        .await?;

        info!("✓ Esquema do banco pronto");
        Ok(())
    }
}
