use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use equipment_portal::error::{Error, Result};
use equipment_portal::form::{FormController, FormField, NotificationKind, SubmitOutcome};
use equipment_portal::hris::DirectoryService;
use equipment_portal::model::EquipmentPaymentPayload;
use equipment_portal::payment::PaymentService;

#[derive(Clone, Default)]
struct RecordingPayments {
    responses: Arc<Mutex<VecDeque<Result<Value>>>>,
    calls: Arc<Mutex<Vec<EquipmentPaymentPayload>>>,
    resets: Arc<Mutex<usize>>,
}

impl RecordingPayments {
    fn with_responses(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<EquipmentPaymentPayload> {
        self.calls.lock().unwrap().clone()
    }

    fn resets(&self) -> usize {
        *self.resets.lock().unwrap()
    }
}

#[async_trait]
impl PaymentService for RecordingPayments {
    async fn create_payment(&self, payload: &EquipmentPaymentPayload) -> Result<Value> {
        self.calls.lock().unwrap().push(payload.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "id": "req-1" })))
    }

    fn reset(&self) {
        *self.resets.lock().unwrap() += 1;
    }
}

struct StaticDirectory {
    payload: Value,
}

#[async_trait]
impl DirectoryService for StaticDirectory {
    async fn fetch_employees(&self) -> Result<Value> {
        Ok(self.payload.clone())
    }
}

struct FailingDirectory;

#[async_trait]
impl DirectoryService for FailingDirectory {
    async fn fetch_employees(&self) -> Result<Value> {
        Err(Error::network("connection refused"))
    }
}

fn fill_form(form: &mut FormController) {
    form.input_full_name("Ada Lovelace");
    form.input_branch("HQ");
    form.input_department("IT");
    form.set_field(FormField::EquipmentName, "Laptop");
    form.set_field(FormField::OnlineStoreLink, "https://store.example.com/laptop");
    form.set_field(FormField::BankName, "BCA");
    form.set_field(FormField::BankBranch, "Sudirman");
    form.set_field(FormField::BankAccountNumber, "1234567890");
    form.set_field(FormField::BankAccountName, "Ada Lovelace");
    form.input_price("Rp 1.500.000");
    form.set_field(FormField::DateNeeded, "2025-09-05");
    form.set_field(FormField::Details, "16GB RAM, 14 inch");
}

#[tokio::test]
async fn successful_submission_resets_form_and_notifies() {
    let payments = RecordingPayments::with_responses(vec![Ok(json!({ "id": "req-9" }))]);
    let mut form = FormController::new();
    fill_form(&mut form);

    let outcome = form.submit(&payments).await;
    assert_eq!(outcome, SubmitOutcome::Submitted);

    let calls = payments.calls();
    assert_eq!(calls.len(), 1);
    let payload = &calls[0];
    assert_eq!(payload.fullname, "Ada Lovelace");
    assert_eq!(payload.branch, "HQ");
    assert_eq!(payload.department, "IT");
    assert_eq!(payload.amount, "1500000.00");
    assert_eq!(payload.date, "05/09/25");
    assert_eq!(payload.link, "https://store.example.com/laptop");
    assert_eq!(payload.detail, "16GB RAM, 14 inch");

    assert_eq!(form.fields().full_name, "");
    assert_eq!(form.fields().details, "");
    assert_eq!(form.price_display(), "");
    assert_eq!(form.price_raw(), None);
    assert_eq!(payments.resets(), 1);

    let notif = form.notification();
    assert!(notif.open);
    assert_eq!(notif.kind, NotificationKind::Success);
    assert!(notif.message.contains("submitted successfully"));
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn failed_submission_preserves_fields() {
    let payments =
        RecordingPayments::with_responses(vec![Err(Error::upstream(422, "insufficient budget"))]);
    let mut form = FormController::new();
    fill_form(&mut form);

    let outcome = form.submit(&payments).await;
    assert_eq!(outcome, SubmitOutcome::Failed);

    assert_eq!(form.fields().full_name, "Ada Lovelace");
    assert_eq!(form.fields().bank_account_number, "1234567890");
    assert_eq!(form.price_display(), "1.500.000");
    assert_eq!(payments.resets(), 0);

    let notif = form.notification();
    assert!(notif.open);
    assert_eq!(notif.kind, NotificationKind::Error);
    assert!(notif
        .message
        .starts_with("We couldn't submit your request."));
    assert!(notif.message.contains("insufficient budget"));
}

#[tokio::test]
async fn network_failure_keeps_fields_for_retry() {
    let payments =
        RecordingPayments::with_responses(vec![Err(Error::network("connection reset by peer"))]);
    let mut form = FormController::new();
    fill_form(&mut form);

    assert_eq!(form.submit(&payments).await, SubmitOutcome::Failed);
    assert_eq!(form.fields().equipment_name, "Laptop");
    assert!(form
        .notification()
        .message
        .contains("connection reset by peer"));
}

#[tokio::test]
async fn every_required_field_blocks_submission() {
    let required = [
        FormField::FullName,
        FormField::Branch,
        FormField::Department,
        FormField::EquipmentName,
        FormField::OnlineStoreLink,
        FormField::BankName,
        FormField::BankBranch,
        FormField::BankAccountNumber,
        FormField::BankAccountName,
        FormField::Price,
        FormField::DateNeeded,
        FormField::Details,
    ];
    for field in required {
        let payments = RecordingPayments::default();
        let mut form = FormController::new();
        fill_form(&mut form);
        form.set_field(field, "");

        let outcome = form.submit(&payments).await;
        assert_eq!(outcome, SubmitOutcome::Rejected(field));
        assert!(payments.calls().is_empty(), "no call expected for {field:?}");
        assert!(!form.notification().open);
    }
}

#[tokio::test]
async fn directory_records_feed_autocomplete() {
    let directory = StaticDirectory {
        payload: json!({
            "data": [
                { "id": 1, "fullname": "Ada Lovelace", "Branch": "HQ", "Department": "IT" },
                { "employeeId": "2", "name": "Alan Turing", "branch": "HQ", "department": "Research" },
            ]
        }),
    };
    let mut form = FormController::new();
    form.load_directory(&directory).await;
    assert_eq!(form.employees().len(), 2);
    assert!(!form.is_loading_employees());

    form.input_full_name("ada");
    assert_eq!(form.name_suggestions().len(), 1);
    let picked = form.name_suggestions()[0].clone();
    assert_eq!(picked.id, 1);

    form.pick_employee(&picked);
    assert_eq!(form.fields().full_name, "Ada Lovelace");
    assert_eq!(form.fields().branch, "HQ");
    assert_eq!(form.fields().department, "IT");
}

#[tokio::test]
async fn directory_failure_degrades_to_empty_list() {
    let mut form = FormController::new();
    form.load_directory(&FailingDirectory).await;
    assert!(form.employees().is_empty());
    assert!(!form.is_loading_employees());

    form.input_full_name("ada");
    assert!(form.name_suggestions().is_empty());
    assert!(form.branch_suggestions().is_empty());
}

#[tokio::test]
async fn unexpected_directory_shape_degrades_to_empty_list() {
    let directory = StaticDirectory {
        payload: json!({ "items": [{ "id": 1, "name": "Ada" }] }),
    };
    let mut form = FormController::new();
    form.load_directory(&directory).await;
    assert!(form.employees().is_empty());
}

#[tokio::test]
async fn resubmission_after_failure_succeeds() {
    let payments = RecordingPayments::with_responses(vec![
        Err(Error::upstream(500, "boom")),
        Ok(json!({ "id": "req-2" })),
    ]);
    let mut form = FormController::new();
    fill_form(&mut form);

    assert_eq!(form.submit(&payments).await, SubmitOutcome::Failed);
    // Fields survived the failure, so an immediate retry needs no re-entry.
    assert_eq!(form.submit(&payments).await, SubmitOutcome::Submitted);

    let calls = payments.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(payments.resets(), 1);
}
