use crate::entities::PaymentMethod;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddPaymentAccountRequest {
    pub payment_method: PaymentMethod,
    #[schema(example = "0712345678")]
    pub account_number: String,
    #[schema(example = "Wanjiku Kamau")]
    pub account_name: String,
    #[serde(default)]
    pub is_primary: bool,
}
