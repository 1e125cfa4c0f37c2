use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};

/// Linha persistida para cada IE consultada dentro de um lote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resultado {
    pub id: i64,
    pub consulta_id: String,
    pub inscricao_estadual: String,
    #[serde(flatten)]
    pub dados: DadosCadastrais,
    /// `Sucesso` ou `Erro: {causa}`, o texto que a consulta deixou
    pub status: String,
    pub campaign_status: CampaignStatus,
    pub last_contacted: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Campos cadastrais extraídos da página de resultado do portal
///
/// Todo campo é opcional: a página omite rótulos conforme a situação do
/// contribuinte, e uma consulta que falhou não preenche nada.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DadosCadastrais {
    pub cnpj: Option<String>,
    pub razao_social: Option<String>,
    pub nome_fantasia: Option<String>,
    pub unidade_fiscalizacao: Option<String>,
    pub logradouro: Option<String>,
    pub bairro_distrito: Option<String>,
    pub municipio: Option<String>,
    pub uf: Option<String>,
    pub cep: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub atividade_economica_principal: Option<String>,
    pub condicao: Option<String>,
    pub forma_pagamento: Option<String>,
    pub situacao_cadastral: Option<String>,
    pub data_situacao_cadastral: Option<String>,
    pub motivo_situacao_cadastral: Option<String>,
    pub nome_contador: Option<String>,
}

/// Etapa da empresa dentro da campanha de contato
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Pending,
    Sent,
    Replied,
    Error,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Sent => "sent",
            CampaignStatus::Replied => "replied",
            CampaignStatus::Error => "error",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CampaignStatus::Pending),
            "sent" => Ok(CampaignStatus::Sent),
            "replied" => Ok(CampaignStatus::Replied),
            "error" => Ok(CampaignStatus::Error),
            outro => Err(format!("status de campanha inválido: '{outro}'")),
        }
    }
}

impl Type<Sqlite> for CampaignStatus {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }
}

impl<'q> Encode<'q, Sqlite> for CampaignStatus {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> Result<IsNull, BoxDynError> {
        buf.push(SqliteArgumentValue::Text(Cow::Borrowed(self.as_str())));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, Sqlite> for CampaignStatus {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let texto = <&str as Decode<Sqlite>>::decode(value)?;
        texto.parse().map_err(|e: String| e.into())
    }
}
