//! Submission form controller: field state, employee autocomplete, input
//! formatting, and the submit pipeline.
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::hris::{self, DirectoryService};
use crate::model::{Employee, EquipmentPaymentPayload};
use crate::payment::PaymentService;

/// How long a notification stays open before dismissing itself.
pub const AUTO_DISMISS: Duration = Duration::from_millis(2000);

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient outcome banner. Opens when a submit attempt completes; closes
/// on explicit dismissal or [`AUTO_DISMISS`] after opening, whichever comes
/// first.
#[derive(Debug, Clone)]
pub struct Notification {
    pub open: bool,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    opened_at: Option<Instant>,
}

impl Default for Notification {
    fn default() -> Self {
        Notification {
            open: false,
            kind: NotificationKind::Success,
            title: String::new(),
            message: String::new(),
            opened_at: None,
        }
    }
}

/// The form's inputs, in the order they appear on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FullName,
    Branch,
    Department,
    EquipmentName,
    OnlineStoreLink,
    BankName,
    BankBranch,
    BankAccountNumber,
    BankAccountName,
    Price,
    DateNeeded,
    Details,
}

impl FormField {
    /// Human-readable form label.
    pub fn label(self) -> &'static str {
        match self {
            FormField::FullName => "Full Name",
            FormField::Branch => "Branch",
            FormField::Department => "Department",
            FormField::EquipmentName => "Equipment Name",
            FormField::OnlineStoreLink => "Link to Online Store",
            FormField::BankName => "Bank Name",
            FormField::BankBranch => "Bank Branch",
            FormField::BankAccountNumber => "Bank Account Number",
            FormField::BankAccountName => "Bank Account Name",
            FormField::Price => "Price",
            FormField::DateNeeded => "Date Needed",
            FormField::Details => "Details / Specifications",
        }
    }
}

/// Raw values of the form's text inputs. The price pair lives on the
/// controller because display and raw value are derived together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub full_name: String,
    pub branch: String,
    pub department: String,
    pub equipment_name: String,
    pub online_store_link: String,
    pub bank_name: String,
    pub bank_branch: String,
    pub bank_account_number: String,
    pub bank_account_name: String,
    pub date_needed: String,
    pub details: String,
}

/// Result of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Payload accepted by the payment service; the form was reset.
    Submitted,
    /// Payment service rejected the request or was unreachable; every field
    /// keeps its value so the user can retry.
    Failed,
    /// A required field was empty; nothing was sent.
    Rejected(FormField),
}

#[derive(Debug, Default)]
pub struct FormController {
    fields: FormState,
    price_display: String,
    price_raw: Option<u64>,
    employees: Vec<Employee>,
    loading_employees: bool,
    unique_branches: Vec<String>,
    unique_departments: Vec<String>,
    name_suggestions: Vec<Employee>,
    show_name_suggestions: bool,
    branch_suggestions: Vec<String>,
    show_branch_suggestions: bool,
    department_suggestions: Vec<String>,
    show_department_suggestions: bool,
    notification: Notification,
    submitting: bool,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &FormState {
        &self.fields
    }

    pub fn price_display(&self) -> &str {
        &self.price_display
    }

    pub fn price_raw(&self) -> Option<u64> {
        self.price_raw
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn is_loading_employees(&self) -> bool {
        self.loading_employees
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn notification(&self) -> &Notification {
        &self.notification
    }

    pub fn name_suggestions(&self) -> &[Employee] {
        &self.name_suggestions
    }

    pub fn show_name_suggestions(&self) -> bool {
        self.show_name_suggestions
    }

    pub fn branch_suggestions(&self) -> &[String] {
        &self.branch_suggestions
    }

    pub fn show_branch_suggestions(&self) -> bool {
        self.show_branch_suggestions
    }

    pub fn department_suggestions(&self) -> &[String] {
        &self.department_suggestions
    }

    pub fn show_department_suggestions(&self) -> bool {
        self.show_department_suggestions
    }

    /// Fetch and normalize the employee directory. Failure never surfaces
    /// to the user: the list degrades to empty and autocomplete stays dark.
    pub async fn load_directory(&mut self, directory: &dyn DirectoryService) {
        self.loading_employees = true;
        self.employees = match directory.fetch_employees().await {
            Ok(json) => match hris::employee_records(&json) {
                Some(records) => hris::normalize_employees(records),
                None => {
                    warn!("unexpected employees payload shape");
                    Vec::new()
                }
            },
            Err(err) => {
                warn!(%err, "failed to fetch employees");
                Vec::new()
            }
        };
        self.unique_branches =
            distinct_non_empty(self.employees.iter().map(|emp| emp.branch.as_str()));
        self.unique_departments =
            distinct_non_empty(self.employees.iter().map(|emp| emp.department.as_str()));
        self.loading_employees = false;
    }

    /// Route one input edit to the right transition.
    pub fn set_field(&mut self, field: FormField, value: &str) {
        match field {
            FormField::FullName => self.input_full_name(value),
            FormField::Branch => self.input_branch(value),
            FormField::Department => self.input_department(value),
            FormField::Price => self.input_price(value),
            FormField::EquipmentName => self.fields.equipment_name = value.to_string(),
            FormField::OnlineStoreLink => self.fields.online_store_link = value.to_string(),
            FormField::BankName => self.fields.bank_name = value.to_string(),
            FormField::BankBranch => self.fields.bank_branch = value.to_string(),
            FormField::BankAccountNumber => self.fields.bank_account_number = value.to_string(),
            FormField::BankAccountName => self.fields.bank_account_name = value.to_string(),
            FormField::DateNeeded => self.fields.date_needed = value.to_string(),
            FormField::Details => self.fields.details = value.to_string(),
        }
    }

    /// Update the name field and recompute suggestions: case-insensitive
    /// prefix matches over the directory, source order preserved. Empty
    /// input clears and hides the list.
    pub fn input_full_name(&mut self, value: &str) {
        self.fields.full_name = value.to_string();
        if value.is_empty() {
            self.name_suggestions.clear();
            self.show_name_suggestions = false;
        } else {
            let needle = value.to_lowercase();
            self.name_suggestions = self
                .employees
                .iter()
                .filter(|emp| emp.name.to_lowercase().starts_with(&needle))
                .cloned()
                .collect();
            self.show_name_suggestions = true;
        }
    }

    pub fn input_branch(&mut self, value: &str) {
        self.fields.branch = value.to_string();
        if value.is_empty() {
            self.branch_suggestions.clear();
            self.show_branch_suggestions = false;
        } else {
            self.branch_suggestions = prefix_matches(&self.unique_branches, value);
            self.show_branch_suggestions = true;
        }
    }

    pub fn input_department(&mut self, value: &str) {
        self.fields.department = value.to_string();
        if value.is_empty() {
            self.department_suggestions.clear();
            self.show_department_suggestions = false;
        } else {
            self.department_suggestions = prefix_matches(&self.unique_departments, value);
            self.show_department_suggestions = true;
        }
    }

    /// Accept a name suggestion: fills name, branch, and department from
    /// the directory record in one step.
    pub fn pick_employee(&mut self, employee: &Employee) {
        self.fields.full_name = employee.name.clone();
        self.fields.branch = employee.branch.clone();
        self.fields.department = employee.department.clone();
        self.show_name_suggestions = false;
    }

    pub fn pick_branch(&mut self, branch: &str) {
        self.fields.branch = branch.to_string();
        self.show_branch_suggestions = false;
    }

    pub fn pick_department(&mut self, department: &str) {
        self.fields.department = department.to_string();
        self.show_department_suggestions = false;
    }

    /// Digest a price edit: everything but digits is dropped, the display
    /// regains dot grouping, and the raw integer is reparsed. Clearing the
    /// input clears both.
    pub fn input_price(&mut self, value: &str) {
        let digits = NON_DIGITS.replace_all(value, "");
        self.price_raw = digits.parse().ok();
        self.price_display = match self.price_raw {
            Some(raw) => group_thousands(raw),
            None => String::new(),
        };
    }

    /// Clear every field and the derived price pair. Suggestions and the
    /// notification are untouched.
    pub fn reset_form(&mut self) {
        self.fields = FormState::default();
        self.price_display.clear();
        self.price_raw = None;
    }

    /// Snapshot the current form into the wire payload. Runs before any
    /// network call, so an in-flight submission never sees later edits.
    pub fn build_payload(&self) -> EquipmentPaymentPayload {
        EquipmentPaymentPayload {
            fullname: self.fields.full_name.clone(),
            branch: self.fields.branch.clone(),
            department: self.fields.department.clone(),
            equipment_name: self.fields.equipment_name.clone(),
            link: self.fields.online_store_link.clone(),
            bank_name: self.fields.bank_name.clone(),
            bank_branch: self.fields.bank_branch.clone(),
            bank_account_number: self.fields.bank_account_number.clone(),
            amount: amount_string(self.price_raw),
            date: to_ddmmyy(&self.fields.date_needed),
            detail: self.fields.details.clone(),
        }
    }

    /// Submit the form. Every field is required; the first empty one aborts
    /// the attempt before any service call. On success the form resets and
    /// a success notification opens; on failure the fields survive and an
    /// error notification opens.
    pub async fn submit(&mut self, payments: &dyn PaymentService) -> SubmitOutcome {
        if let Some(field) = self.first_missing_field() {
            return SubmitOutcome::Rejected(field);
        }
        self.submitting = true;
        let payload = self.build_payload();
        let result = payments.create_payment(&payload).await;
        self.submitting = false;
        match result {
            Ok(_) => {
                self.reset_form();
                payments.reset();
                self.open_notification(
                    NotificationKind::Success,
                    "Submission Received 🎉",
                    "Your equipment payment request has been submitted successfully."
                        .to_string(),
                );
                SubmitOutcome::Submitted
            }
            Err(err) => {
                self.open_notification(
                    NotificationKind::Error,
                    "Submission Failed",
                    format!("We couldn't submit your request. {err}"),
                );
                SubmitOutcome::Failed
            }
        }
    }

    /// Close the notification, as backdrop click or escape would.
    pub fn dismiss_notification(&mut self) {
        self.notification.open = false;
    }

    /// Drive the auto-dismiss timer: closes the notification once
    /// [`AUTO_DISMISS`] has elapsed since it opened.
    pub fn tick(&mut self, now: Instant) {
        if !self.notification.open {
            return;
        }
        if let Some(opened) = self.notification.opened_at {
            if now.duration_since(opened) >= AUTO_DISMISS {
                self.notification.open = false;
            }
        }
    }

    fn open_notification(&mut self, kind: NotificationKind, title: &str, message: String) {
        self.notification = Notification {
            open: true,
            kind,
            title: title.to_string(),
            message,
            opened_at: Some(Instant::now()),
        };
    }

    fn first_missing_field(&self) -> Option<FormField> {
        let checks = [
            (FormField::FullName, self.fields.full_name.is_empty()),
            (FormField::Branch, self.fields.branch.is_empty()),
            (FormField::Department, self.fields.department.is_empty()),
            (FormField::EquipmentName, self.fields.equipment_name.is_empty()),
            (FormField::OnlineStoreLink, self.fields.online_store_link.is_empty()),
            (FormField::BankName, self.fields.bank_name.is_empty()),
            (FormField::BankBranch, self.fields.bank_branch.is_empty()),
            (
                FormField::BankAccountNumber,
                self.fields.bank_account_number.is_empty(),
            ),
            (
                FormField::BankAccountName,
                self.fields.bank_account_name.is_empty(),
            ),
            (FormField::Price, self.price_display.is_empty()),
            (FormField::DateNeeded, self.fields.date_needed.is_empty()),
            (FormField::Details, self.fields.details.is_empty()),
        ];
        checks
            .iter()
            .find(|(_, missing)| *missing)
            .map(|(field, _)| *field)
    }
}

/// Distinct values in first-seen order, empties dropped.
fn distinct_non_empty<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.to_string()))
        .map(str::to_string)
        .collect()
}

/// Case-insensitive prefix matches, source order preserved.
fn prefix_matches(candidates: &[String], needle: &str) -> Vec<String> {
    let needle = needle.to_lowercase();
    candidates
        .iter()
        .filter(|candidate| candidate.to_lowercase().starts_with(&needle))
        .cloned()
        .collect()
}

/// Fixed two-decimal amount string; `"0.00"` when no price was entered.
pub fn amount_string(raw: Option<u64>) -> String {
    format!("{}.00", raw.unwrap_or(0))
}

/// `YYYY-MM-DD` to `DD/MM/YY`. Anything that is not a real calendar date
/// maps to the empty string.
pub fn to_ddmmyy(value: &str) -> String {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%y").to_string(),
        Err(_) => String::new(),
    }
}

/// Indonesian-style thousands grouping: `1500000` renders as `1.500.000`.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
