use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Pendente,
    Quitado,
    Atrasado,
    Cancelado,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pendente => "Pendente",
            InvoiceStatus::Quitado => "Quitado",
            InvoiceStatus::Atrasado => "Atrasado",
            InvoiceStatus::Cancelado => "Cancelado",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id_cobranca: i64,
    pub valor_fatura: f64,
    pub status: InvoiceStatus,
    pub transacao_id: Option<i64>,
    pub usuario_id: Option<i64>,
    pub conta_id: Option<i64>,
    pub sub_conta_id: Option<i64>,
    pub vencimento_fatura: Option<NaiveDate>,
    pub referencia: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(range(min = 0.0, message = "O valor da fatura não pode ser negativo."))]
    pub valor_fatura: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    pub transacao_id: Option<i64>,
    pub usuario_id: Option<i64>,
    pub conta_id: Option<i64>,
    pub sub_conta_id: Option<i64>,
    pub vencimento_fatura: Option<NaiveDate>,
    pub referencia: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "O valor da fatura não pode ser negativo."))]
    pub valor_fatura: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transacao_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conta_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_conta_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vencimento_fatura: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referencia: Option<String>,
}

/// Latest due date among a user's invoices and the invoices that share it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextInvoice {
    pub proxima_fatura: Option<NaiveDate>,
    pub cobrancas: Vec<Invoice>,
}

impl NextInvoice {
    /// `None` when there are no invoices. Invoices without a due date are ignored for the date.
    pub fn from_invoices(invoices: Vec<Invoice>) -> Option<Self> {
        if invoices.is_empty() {
            return None;
        }
        let latest = invoices.iter().filter_map(|c| c.vencimento_fatura).max();
        let cobrancas = invoices
            .into_iter()
            .filter(|c| c.vencimento_fatura == latest)
            .collect();
        Some(NextInvoice {
            proxima_fatura: latest,
            cobrancas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(id: i64, due: Option<&str>) -> Invoice {
        Invoice {
            id_cobranca: id,
            valor_fatura: 10.0,
            status: InvoiceStatus::Pendente,
            transacao_id: None,
            usuario_id: Some(1),
            conta_id: None,
            sub_conta_id: None,
            vencimento_fatura: due.map(|d| d.parse().unwrap()),
            referencia: None,
        }
    }

    #[test]
    fn next_invoice_groups_latest_due_date() {
        let next = NextInvoice::from_invoices(vec![
            invoice(1, Some("2024-01-10")),
            invoice(2, Some("2024-03-10")),
            invoice(3, None),
            invoice(4, Some("2024-03-10")),
        ])
        .unwrap();
        assert_eq!(next.proxima_fatura, Some("2024-03-10".parse().unwrap()));
        let ids: Vec<i64> = next.cobrancas.iter().map(|c| c.id_cobranca).collect();
        assert_eq!(ids, vec![2, 4]);
        assert!(NextInvoice::from_invoices(Vec::new()).is_none());
    }

    #[test]
    fn status_wire_names() {
        let v = serde_json::to_value(InvoiceStatus::Quitado).unwrap();
        assert_eq!(v, "Quitado");
        assert!(serde_json::from_value::<InvoiceStatus>(serde_json::json!("Pago")).is_err());
        assert_eq!(InvoiceStatus::Atrasado.as_str(), "Atrasado");
    }

    #[test]
    fn dates_serialize_as_iso_days() {
        let row = crate::store::to_row(&invoice(1, Some("2024-05-02"))).unwrap();
        assert_eq!(row["vencimentoFatura"], "2024-05-02");
    }
}
