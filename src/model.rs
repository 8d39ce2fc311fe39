use serde::{Deserialize, Serialize};

/// One employee, normalized from whatever spelling the directory upstream
/// used for its keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub branch: String,
    pub department: String,
}

/// Wire payload for a payment request, as the payment backend expects it.
///
/// The account holder name collected by the form is deliberately absent:
/// the backend has no slot for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentPaymentPayload {
    pub fullname: String,
    pub branch: String,
    pub department: String,
    pub equipment_name: String,
    pub link: String,
    pub bank_name: String,
    pub bank_branch: String,
    pub bank_account_number: String,
    /// Fixed two-decimal string, `"0.00"` when no price was entered.
    pub amount: String,
    /// `DD/MM/YY`, empty when the date input was missing or malformed.
    pub date: String,
    pub detail: String,
}
