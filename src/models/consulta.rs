use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};

/// Lote de consultas disparado a partir de um PDF
///
/// Cada linha acompanha um processamento: quantas IEs o PDF rendeu,
/// quantas já foram consultadas e em que situação o lote está.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consulta {
    pub id: String,
    pub filename: String,
    pub total: i64,
    pub processed: i64,
    pub status: StatusConsulta,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Situação do lote, persistida na coluna `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusConsulta {
    Processing,
    Completed,
    Error,
}

impl StatusConsulta {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusConsulta::Processing => "processing",
            StatusConsulta::Completed => "completed",
            StatusConsulta::Error => "error",
        }
    }

    /// Um lote terminal não volta a mudar de estado.
    pub fn terminal(&self) -> bool {
        !matches!(self, StatusConsulta::Processing)
    }
}

impl fmt::Display for StatusConsulta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatusConsulta {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(StatusConsulta::Processing),
            "completed" => Ok(StatusConsulta::Completed),
            "error" => Ok(StatusConsulta::Error),
            outro => Err(format!("status de consulta inválido: '{outro}'")),
        }
    }
}

// Persistido como TEXT, igual ao restante do esquema.
impl Type<Sqlite> for StatusConsulta {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }
}

impl<'q> Encode<'q, Sqlite> for StatusConsulta {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> Result<IsNull, BoxDynError> {
        buf.push(SqliteArgumentValue::Text(Cow::Borrowed(self.as_str())));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, Sqlite> for StatusConsulta {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let texto = <&str as Decode<Sqlite>>::decode(value)?;
        texto.parse().map_err(|e: String| e.into())
    }
}
