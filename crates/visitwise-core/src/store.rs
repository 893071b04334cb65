//! Application state container
//!
//! One [`AppState`] with a typed slice per entity, changed only by
//! dispatching an [`Action`] through pure per-slice reducers. Derived
//! values (paid status, earnings) are selectors computed on every read and
//! never stored in state.

use serde::{Deserialize, Serialize};

use crate::allocation::{allocate_payments, Allocation};
use crate::calendar::YearMonth;
use crate::config::PracticeConfig;
use crate::directory::{self, PatientFilter};
use crate::earnings::{practice_summary, practice_totals, EarningsTotals, EarningsWindow, PatientLedger, PatientSummary};
use crate::model::{MediaItem, Patient, Payment, PracticeData, Visit};
use crate::session::UserProfile;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Transient toast shown to the practitioner
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    pub notifications: Vec<Notification>,
    next_notification_id: u64,
    pending_requests: usize,
    /// Shown in the inline error panel with a manual retry
    pub last_error: Option<String>,
}

impl UiState {
    pub fn is_loading(&self) -> bool {
        self.pending_requests > 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserProfile>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub patients: Vec<Patient>,
    pub visits: Vec<Visit>,
    pub payments: Vec<Payment>,
    pub media: Vec<MediaItem>,
    pub auth: AuthState,
    pub theme: Theme,
    pub ui: UiState,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    DataImported(PracticeData),

    PatientsLoaded(Vec<Patient>),
    /// Insert or replace by id
    PatientSaved(Patient),
    PatientArchived { patient_id: String, at: i64 },
    PatientRestored { patient_id: String, at: i64 },
    /// Hard delete; cascades to the patient's visits, payments and media
    PatientDeleted(String),

    /// Replace one patient's visits with a fresh fetch
    VisitsLoaded { patient_id: String, visits: Vec<Visit> },
    VisitSaved(Visit),
    VisitDeleted(String),

    PaymentsLoaded { patient_id: String, payments: Vec<Payment> },
    PaymentSaved(Payment),
    PaymentDeleted(String),

    MediaLoaded { patient_id: String, items: Vec<MediaItem> },
    MediaAdded(MediaItem),
    MediaDeleted(String),

    SignedIn(UserProfile),
    /// Drops every cached record; only the theme survives
    SignedOut,
    ThemeChanged(Theme),

    RequestStarted,
    RequestSucceeded,
    RequestFailed(String),
    Notify { level: NotificationLevel, message: String },
    NotificationDismissed(u64),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::DataImported(_) => "data_imported",
            Action::PatientsLoaded(_) => "patients_loaded",
            Action::PatientSaved(_) => "patient_saved",
            Action::PatientArchived { .. } => "patient_archived",
            Action::PatientRestored { .. } => "patient_restored",
            Action::PatientDeleted(_) => "patient_deleted",
            Action::VisitsLoaded { .. } => "visits_loaded",
            Action::VisitSaved(_) => "visit_saved",
            Action::VisitDeleted(_) => "visit_deleted",
            Action::PaymentsLoaded { .. } => "payments_loaded",
            Action::PaymentSaved(_) => "payment_saved",
            Action::PaymentDeleted(_) => "payment_deleted",
            Action::MediaLoaded { .. } => "media_loaded",
            Action::MediaAdded(_) => "media_added",
            Action::MediaDeleted(_) => "media_deleted",
            Action::SignedIn(_) => "signed_in",
            Action::SignedOut => "signed_out",
            Action::ThemeChanged(_) => "theme_changed",
            Action::RequestStarted => "request_started",
            Action::RequestSucceeded => "request_succeeded",
            Action::RequestFailed(_) => "request_failed",
            Action::Notify { .. } => "notify",
            Action::NotificationDismissed(_) => "notification_dismissed",
        }
    }
}

// ============== Reducers ==============

fn upsert<T, F>(items: &mut Vec<T>, item: T, id_of: F)
where
    F: Fn(&T) -> &str,
{
    match items.iter().position(|existing| id_of(existing) == id_of(&item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

fn patients_reducer(mut patients: Vec<Patient>, action: &Action) -> Vec<Patient> {
    match action {
        Action::DataImported(data) => data.patients.clone(),
        Action::PatientsLoaded(loaded) => loaded.clone(),
        Action::PatientSaved(patient) => {
            upsert(&mut patients, patient.clone(), |p| &p.id);
            patients
        }
        Action::PatientArchived { patient_id, at } => {
            if let Some(patient) = patients.iter_mut().find(|p| &p.id == patient_id) {
                directory::archive(patient, *at);
            }
            patients
        }
        Action::PatientRestored { patient_id, at } => {
            if let Some(patient) = patients.iter_mut().find(|p| &p.id == patient_id) {
                directory::restore(patient, *at);
            }
            patients
        }
        Action::PatientDeleted(patient_id) => {
            patients.retain(|p| &p.id != patient_id);
            patients
        }
        _ => patients,
    }
}

fn visits_reducer(mut visits: Vec<Visit>, action: &Action) -> Vec<Visit> {
    match action {
        Action::DataImported(data) => data.visits.clone(),
        Action::VisitsLoaded { patient_id, visits: loaded } => {
            visits.retain(|v| &v.patient_id != patient_id);
            visits.extend(loaded.iter().cloned());
            visits
        }
        Action::VisitSaved(visit) => {
            upsert(&mut visits, visit.clone(), |v| &v.id);
            visits
        }
        Action::VisitDeleted(visit_id) => {
            visits.retain(|v| &v.id != visit_id);
            visits
        }
        Action::PatientDeleted(patient_id) => {
            visits.retain(|v| &v.patient_id != patient_id);
            visits
        }
        _ => visits,
    }
}

fn payments_reducer(mut payments: Vec<Payment>, action: &Action) -> Vec<Payment> {
    match action {
        Action::DataImported(data) => data.payments.clone(),
        Action::PaymentsLoaded { patient_id, payments: loaded } => {
            payments.retain(|p| &p.patient_id != patient_id);
            payments.extend(loaded.iter().cloned());
            payments
        }
        Action::PaymentSaved(payment) => {
            upsert(&mut payments, payment.clone(), |p| &p.id);
            payments
        }
        Action::PaymentDeleted(payment_id) => {
            payments.retain(|p| &p.id != payment_id);
            payments
        }
        Action::PatientDeleted(patient_id) => {
            payments.retain(|p| &p.patient_id != patient_id);
            payments
        }
        _ => payments,
    }
}

fn media_reducer(mut media: Vec<MediaItem>, action: &Action) -> Vec<MediaItem> {
    match action {
        Action::DataImported(data) => data.media.clone(),
        Action::MediaLoaded { patient_id, items } => {
            media.retain(|m| &m.patient_id != patient_id);
            media.extend(items.iter().cloned());
            media
        }
        Action::MediaAdded(item) => {
            upsert(&mut media, item.clone(), |m| &m.id);
            media
        }
        Action::MediaDeleted(media_id) => {
            media.retain(|m| &m.id != media_id);
            media
        }
        Action::PatientDeleted(patient_id) => {
            media.retain(|m| &m.patient_id != patient_id);
            media
        }
        _ => media,
    }
}

fn auth_reducer(auth: AuthState, action: &Action) -> AuthState {
    match action {
        Action::SignedIn(user) => AuthState { user: Some(user.clone()) },
        Action::SignedOut => AuthState::default(),
        _ => auth,
    }
}

fn theme_reducer(theme: Theme, action: &Action) -> Theme {
    match action {
        Action::ThemeChanged(next) => *next,
        _ => theme,
    }
}

fn ui_reducer(mut ui: UiState, action: &Action) -> UiState {
    match action {
        Action::RequestStarted => {
            ui.pending_requests += 1;
            ui.last_error = None;
        }
        Action::RequestSucceeded => {
            ui.pending_requests = ui.pending_requests.saturating_sub(1);
        }
        Action::RequestFailed(message) => {
            ui.pending_requests = ui.pending_requests.saturating_sub(1);
            ui.last_error = Some(message.clone());
            push_notification(&mut ui, NotificationLevel::Error, message.clone());
        }
        Action::Notify { level, message } => {
            push_notification(&mut ui, *level, message.clone());
        }
        Action::NotificationDismissed(id) => {
            ui.notifications.retain(|n| n.id != *id);
        }
        Action::SignedOut => return UiState::default(),
        _ => {}
    }
    ui
}

fn push_notification(ui: &mut UiState, level: NotificationLevel, message: String) {
    ui.next_notification_id += 1;
    ui.notifications.push(Notification {
        id: ui.next_notification_id,
        level,
        message,
    });
}

/// Root reducer
pub fn reduce(state: AppState, action: &Action) -> AppState {
    let signing_out = matches!(action, Action::SignedOut);
    AppState {
        patients: if signing_out { Vec::new() } else { patients_reducer(state.patients, action) },
        visits: if signing_out { Vec::new() } else { visits_reducer(state.visits, action) },
        payments: if signing_out { Vec::new() } else { payments_reducer(state.payments, action) },
        media: if signing_out { Vec::new() } else { media_reducer(state.media, action) },
        auth: auth_reducer(state.auth, action),
        theme: theme_reducer(state.theme, action),
        ui: ui_reducer(state.ui, action),
    }
}

// ============== Selectors ==============

impl AppState {
    pub fn patient(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == patient_id)
    }

    pub fn ledger(&self, patient_id: &str) -> Option<PatientLedger<'_>> {
        self.patient(patient_id)
            .map(|patient| PatientLedger::new(patient, &self.visits, &self.payments))
    }

    pub fn ledgers(&self) -> Vec<PatientLedger<'_>> {
        self.patients
            .iter()
            .map(|patient| PatientLedger::new(patient, &self.visits, &self.payments))
            .collect()
    }

    /// Paid/unpaid per visit, recomputed on every call
    pub fn payment_status(&self, patient_id: &str) -> Option<Allocation> {
        let ledger = self.ledger(patient_id)?;
        Some(allocate_payments(
            ledger.visits.iter().copied(),
            ledger.payments.iter().copied(),
            ledger.patient.charge_per_visit,
        ))
    }

    /// Home-screen card
    pub fn month_totals(&self, month: YearMonth) -> EarningsTotals {
        practice_totals(&self.ledgers(), EarningsWindow::Month(month))
    }

    /// Summary screen (all-time per patient)
    pub fn patient_summaries(&self) -> Vec<PatientSummary> {
        practice_summary(&self.ledgers())
    }

    pub fn filtered_patients(&self, filter: &PatientFilter) -> Vec<&Patient> {
        directory::filter_patients(&self.patients, filter)
    }

    /// Newest upload first
    pub fn patient_media(&self, patient_id: &str) -> Vec<&MediaItem> {
        let mut items: Vec<&MediaItem> = self.media.iter().filter(|m| m.patient_id == patient_id).collect();
        items.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        items
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.user.is_some()
    }

    pub fn to_practice_data(&self) -> PracticeData {
        PracticeData {
            patients: self.patients.clone(),
            visits: self.visits.clone(),
            payments: self.payments.clone(),
            media: self.media.clone(),
        }
    }
}

// ============== Store ==============

pub type Listener = Box<dyn Fn(&AppState)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Owns the state and notifies subscribers after each dispatch
pub struct Store {
    state: AppState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_listener_id: u64,
}

impl Default for Store {
    fn default() -> Self {
        Store::new(AppState::default())
    }
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Store {
            state,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    pub fn from_config(config: &PracticeConfig) -> Self {
        Store::new(AppState {
            theme: config.default_theme,
            ..AppState::default()
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        log::debug!("dispatch: {}", action.name());
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current, &action);
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&AppState) + 'static,
    {
        self.next_listener_id += 1;
        let id = SubscriptionId(self.next_listener_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}
