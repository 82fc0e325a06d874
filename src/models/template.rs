// src/models/template.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::settings::TenantSettings;

// Template de entrega vinculado a produtos digitais.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentTemplate {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Entrega padrão de gift card")]
    pub name: String,
    #[schema(example = "Ative em até {processing_time}. Dúvidas: {contact_email}")]
    pub body: String,
    // false = os códigos chegam por fora (um humano informa na ativação manual)
    pub auto_generated: bool,
    #[schema(example = 30)]
    pub validity_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FulfillmentTemplate {
    /// Renderiza as instruções interpolando as configurações da loja.
    /// Placeholder sem valor configurado vira string vazia.
    pub fn render(&self, settings: &TenantSettings) -> String {
        self.body
            .replace(
                "{processing_time}",
                settings.processing_time_text.as_deref().unwrap_or(""),
            )
            .replace(
                "{contact_email}",
                settings.contact_email.as_deref().unwrap_or(""),
            )
            .replace("{validity_days}", &self.validity_days.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn template(body: &str) -> FulfillmentTemplate {
        FulfillmentTemplate {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "t".into(),
            body: body.into(),
            auto_generated: true,
            validity_days: 14,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn settings() -> TenantSettings {
        TenantSettings {
            tenant_id: Uuid::new_v4(),
            campaign_id: None,
            api_token: None,
            auto_activation_enabled: true,
            sync_enabled: true,
            processing_time_text: Some("24h".into()),
            contact_email: Some("suporte@loja.com".into()),
            updated_at: None,
        }
    }

    #[test]
    fn interpola_configuracoes_da_loja() {
        let corpo = "Prazo: {processing_time}. Contato: {contact_email}. Validade: {validity_days} dias.";
        let texto = template(corpo).render(&settings());
        assert_eq!(
            texto,
            "Prazo: 24h. Contato: suporte@loja.com. Validade: 14 dias."
        );
    }

    #[test]
    fn placeholder_sem_valor_vira_vazio() {
        let mut cfg = settings();
        cfg.contact_email = None;
        let texto = template("Contato: {contact_email}").render(&cfg);
        assert_eq!(texto, "Contato: ");
    }
}
