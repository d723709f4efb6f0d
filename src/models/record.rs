use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The record categories a user can keep.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Payment,
    Credit,
    Task,
    Trip,
    Renovation,
    Health,
}

impl RecordKind {
    /// Human-readable label shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Payment => "Payment",
            RecordKind::Credit => "Credit",
            RecordKind::Task => "Task",
            RecordKind::Trip => "Trip",
            RecordKind::Renovation => "Renovation",
            RecordKind::Health => "Health entry",
        }
    }

    /// Parse from the string value stored in the database.
    pub fn from_str(s: &str) -> Option<RecordKind> {
        match s {
            "payment" => Some(RecordKind::Payment),
            "credit" => Some(RecordKind::Credit),
            "task" => Some(RecordKind::Task),
            "trip" => Some(RecordKind::Trip),
            "renovation" => Some(RecordKind::Renovation),
            "health" => Some(RecordKind::Health),
            _ => None,
        }
    }

    /// Serialise to the string value stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Payment => "payment",
            RecordKind::Credit => "credit",
            RecordKind::Task => "task",
            RecordKind::Trip => "trip",
            RecordKind::Renovation => "renovation",
            RecordKind::Health => "health",
        }
    }

    /// All record kinds, in display order.
    pub fn all() -> &'static [RecordKind] {
        &[
            RecordKind::Payment,
            RecordKind::Credit,
            RecordKind::Task,
            RecordKind::Trip,
            RecordKind::Renovation,
            RecordKind::Health,
        ]
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Overdue,
    #[default]
    Unknown,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Overdue => "Overdue",
            PaymentStatus::Unknown => "No information",
        }
    }

    pub fn from_str(s: &str) -> Option<PaymentStatus> {
        match s {
            "paid" => Some(PaymentStatus::Paid),
            "overdue" => Some(PaymentStatus::Overdue),
            "unknown" => Some(PaymentStatus::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Unknown => "unknown",
        }
    }

    pub fn all() -> &'static [PaymentStatus] {
        &[PaymentStatus::Paid, PaymentStatus::Overdue, PaymentStatus::Unknown]
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
    Other,
}

impl PaymentFrequency {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "Monthly",
            PaymentFrequency::Quarterly => "Quarterly",
            PaymentFrequency::SemiAnnually => "Semi-annually",
            PaymentFrequency::Annually => "Annually",
            PaymentFrequency::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<PaymentFrequency> {
        match s {
            "monthly" => Some(PaymentFrequency::Monthly),
            "quarterly" => Some(PaymentFrequency::Quarterly),
            "semi_annually" => Some(PaymentFrequency::SemiAnnually),
            "annually" => Some(PaymentFrequency::Annually),
            "other" => Some(PaymentFrequency::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Quarterly => "quarterly",
            PaymentFrequency::SemiAnnually => "semi_annually",
            PaymentFrequency::Annually => "annually",
            PaymentFrequency::Other => "other",
        }
    }

    pub fn all() -> &'static [PaymentFrequency] {
        &[
            PaymentFrequency::Monthly,
            PaymentFrequency::Quarterly,
            PaymentFrequency::SemiAnnually,
            PaymentFrequency::Annually,
            PaymentFrequency::Other,
        ]
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    HomeLoan,
    CarLoan,
    ConsumerLoan,
    ConsolidationLoan,
    #[default]
    Other,
}

impl CreditType {
    pub fn label(&self) -> &'static str {
        match self {
            CreditType::HomeLoan => "Home loan",
            CreditType::CarLoan => "Car loan",
            CreditType::ConsumerLoan => "Consumer loan",
            CreditType::ConsolidationLoan => "Consolidation loan",
            CreditType::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<CreditType> {
        match s {
            "home_loan" => Some(CreditType::HomeLoan),
            "car_loan" => Some(CreditType::CarLoan),
            "consumer_loan" => Some(CreditType::ConsumerLoan),
            "consolidation_loan" => Some(CreditType::ConsolidationLoan),
            "other" => Some(CreditType::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditType::HomeLoan => "home_loan",
            CreditType::CarLoan => "car_loan",
            CreditType::ConsumerLoan => "consumer_loan",
            CreditType::ConsolidationLoan => "consolidation_loan",
            CreditType::Other => "other",
        }
    }

    pub fn all() -> &'static [CreditType] {
        &[
            CreditType::HomeLoan,
            CreditType::CarLoan,
            CreditType::ConsumerLoan,
            CreditType::ConsolidationLoan,
            CreditType::Other,
        ]
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Planned,
    Completed,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Planned => "Planned",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn from_str(s: &str) -> Option<TaskStatus> {
        match s {
            "planned" => Some(TaskStatus::Planned),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Planned => "planned",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn all() -> &'static [TaskStatus] {
        &[TaskStatus::Planned, TaskStatus::Completed]
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Urgent,
    Someday,
}

impl TaskPriority {
    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Urgent => "Urgent",
            TaskPriority::Someday => "Someday",
        }
    }

    pub fn from_str(s: &str) -> Option<TaskPriority> {
        match s {
            "urgent" => Some(TaskPriority::Urgent),
            "someday" => Some(TaskPriority::Someday),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Urgent => "urgent",
            TaskPriority::Someday => "someday",
        }
    }

    pub fn all() -> &'static [TaskPriority] {
        &[TaskPriority::Urgent, TaskPriority::Someday]
    }
}

/// Kind-specific payload of a record, stored as a JSON text column.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetails {
    Payment {
        #[serde(default)]
        amount: Option<f64>,
        #[serde(default)]
        status: PaymentStatus,
        #[serde(default)]
        frequency: Option<PaymentFrequency>,
        #[serde(default)]
        due_date: Option<String>,
    },
    Credit {
        #[serde(default)]
        credit_type: CreditType,
        #[serde(default)]
        amount: Option<f64>,
        #[serde(default)]
        currency: Option<String>,
        #[serde(default)]
        installment: Option<f64>,
        #[serde(default)]
        agreement_date: Option<String>,
    },
    Task {
        #[serde(default)]
        status: TaskStatus,
        #[serde(default)]
        priority: Option<TaskPriority>,
        #[serde(default)]
        due_date: Option<String>,
    },
    Trip {
        #[serde(default)]
        destination: Option<String>,
        #[serde(default)]
        start_date: Option<String>,
        #[serde(default)]
        end_date: Option<String>,
        #[serde(default)]
        estimated_cost: Option<f64>,
    },
    Renovation {
        #[serde(default)]
        estimated_cost: Option<f64>,
        #[serde(default)]
        start_date: Option<String>,
        #[serde(default)]
        end_date: Option<String>,
    },
    Health {
        #[serde(default)]
        specialization: Option<String>,
        #[serde(default)]
        practitioner: Option<String>,
        #[serde(default)]
        visit_date: Option<String>,
        #[serde(default)]
        location: Option<String>,
    },
}

impl RecordDetails {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordDetails::Payment { .. } => RecordKind::Payment,
            RecordDetails::Credit { .. } => RecordKind::Credit,
            RecordDetails::Task { .. } => RecordKind::Task,
            RecordDetails::Trip { .. } => RecordKind::Trip,
            RecordDetails::Renovation { .. } => RecordKind::Renovation,
            RecordDetails::Health { .. } => RecordKind::Health,
        }
    }

    /// A blank payload for a kind; used for fresh forms and as the fallback
    /// when a stored payload fails to parse.
    pub fn empty_for(kind: RecordKind) -> RecordDetails {
        match kind {
            RecordKind::Payment => RecordDetails::Payment {
                amount: None,
                status: PaymentStatus::default(),
                frequency: None,
                due_date: None,
            },
            RecordKind::Credit => RecordDetails::Credit {
                credit_type: CreditType::default(),
                amount: None,
                currency: None,
                installment: None,
                agreement_date: None,
            },
            RecordKind::Task => RecordDetails::Task {
                status: TaskStatus::default(),
                priority: None,
                due_date: None,
            },
            RecordKind::Trip => RecordDetails::Trip {
                destination: None,
                start_date: None,
                end_date: None,
                estimated_cost: None,
            },
            RecordKind::Renovation => RecordDetails::Renovation {
                estimated_cost: None,
                start_date: None,
                end_date: None,
            },
            RecordKind::Health => RecordDetails::Health {
                specialization: None,
                practitioner: None,
                visit_date: None,
                location: None,
            },
        }
    }

    /// Label/value pairs for the detail page; empty fields are skipped.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        match self {
            RecordDetails::Payment { amount, status, frequency, due_date } => {
                if let Some(a) = amount {
                    out.push(("Amount", format!("{:.2}", a)));
                }
                out.push(("Status", status.label().to_string()));
                if let Some(f) = frequency {
                    out.push(("Frequency", f.label().to_string()));
                }
                if let Some(d) = due_date {
                    out.push(("Due date", d.clone()));
                }
            }
            RecordDetails::Credit { credit_type, amount, currency, installment, agreement_date } => {
                out.push(("Type", credit_type.label().to_string()));
                if let Some(a) = amount {
                    out.push(("Amount", format!("{:.2}", a)));
                }
                if let Some(c) = currency {
                    out.push(("Currency", c.clone()));
                }
                if let Some(i) = installment {
                    out.push(("Installment", format!("{:.2}", i)));
                }
                if let Some(d) = agreement_date {
                    out.push(("Agreement date", d.clone()));
                }
            }
            RecordDetails::Task { status, priority, due_date } => {
                out.push(("Status", status.label().to_string()));
                if let Some(p) = priority {
                    out.push(("Priority", p.label().to_string()));
                }
                if let Some(d) = due_date {
                    out.push(("Due date", d.clone()));
                }
            }
            RecordDetails::Trip { destination, start_date, end_date, estimated_cost } => {
                if let Some(d) = destination {
                    out.push(("Destination", d.clone()));
                }
                if let Some(s) = start_date {
                    out.push(("Start date", s.clone()));
                }
                if let Some(e) = end_date {
                    out.push(("End date", e.clone()));
                }
                if let Some(c) = estimated_cost {
                    out.push(("Estimated cost", format!("{:.2}", c)));
                }
            }
            RecordDetails::Renovation { estimated_cost, start_date, end_date } => {
                if let Some(c) = estimated_cost {
                    out.push(("Estimated cost", format!("{:.2}", c)));
                }
                if let Some(s) = start_date {
                    out.push(("Start date", s.clone()));
                }
                if let Some(e) = end_date {
                    out.push(("End date", e.clone()));
                }
            }
            RecordDetails::Health { specialization, practitioner, visit_date, location } => {
                if let Some(s) = specialization {
                    out.push(("Specialization", s.clone()));
                }
                if let Some(p) = practitioner {
                    out.push(("Practitioner", p.clone()));
                }
                if let Some(d) = visit_date {
                    out.push(("Visit date", d.clone()));
                }
                if let Some(l) = location {
                    out.push(("Location", l.clone()));
                }
            }
        }
        out
    }

    /// One-line rendering of the non-empty fields, for list rows and export.
    pub fn summary(&self) -> String {
        self.fields()
            .into_iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A single owned record of any kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub owner_id: String,
    pub kind: RecordKind,
    pub name: String,
    pub notes: String,
    pub details: RecordDetails,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp of the last modification.
    pub updated_at: String,
}

impl Record {
    pub fn new(owner_id: &str, name: &str, notes: &str, details: RecordDetails) -> Record {
        let now = super::now_rfc3339();
        Record {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            kind: details.kind(),
            name: name.trim().to_string(),
            notes: notes.trim().to_string(),
            details,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_kind_roundtrip() {
        for kind in RecordKind::all() {
            let s = kind.as_str();
            let parsed = RecordKind::from_str(s).expect("should parse back");
            assert_eq!(kind, &parsed);
        }
    }

    #[test]
    fn record_kind_invalid_returns_none() {
        assert!(RecordKind::from_str("diary").is_none());
    }

    #[test]
    fn details_json_carries_kind_tag() {
        let details = RecordDetails::empty_for(RecordKind::Trip);
        let json = serde_json::to_string(&details).unwrap();
        assert!(json.contains("\"kind\":\"trip\""));
        let back: RecordDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), RecordKind::Trip);
    }

    #[test]
    fn credit_type_defaults_to_other() {
        let details: RecordDetails = serde_json::from_str(r#"{"kind":"credit"}"#).unwrap();
        match details {
            RecordDetails::Credit { credit_type, .. } => {
                assert_eq!(credit_type, CreditType::Other)
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn renovation_fields_render_dates_and_cost() {
        let details = RecordDetails::Renovation {
            estimated_cost: Some(1500.0),
            start_date: Some("2024-05-01".into()),
            end_date: None,
        };
        let fields = details.fields();
        assert_eq!(fields[0], ("Estimated cost", "1500.00".to_string()));
        assert_eq!(fields[1], ("Start date", "2024-05-01".to_string()));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn payment_status_defaults_to_unknown() {
        let details: RecordDetails = serde_json::from_str(r#"{"kind":"payment"}"#).unwrap();
        match details {
            RecordDetails::Payment { status, .. } => assert_eq!(status, PaymentStatus::Unknown),
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn fields_skip_empty_values() {
        let details = RecordDetails::Health {
            specialization: Some("cardiology".into()),
            practitioner: None,
            visit_date: None,
            location: None,
        };
        let fields = details.fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "Specialization");
    }

    #[test]
    fn summary_joins_fields() {
        let details = RecordDetails::Payment {
            amount: Some(120.5),
            status: PaymentStatus::Paid,
            frequency: None,
            due_date: None,
        };
        assert_eq!(details.summary(), "Amount: 120.50; Status: Paid");
    }

    #[test]
    fn new_record_derives_kind_from_details() {
        let record = Record::new("u1", "  Rent  ", "", RecordDetails::empty_for(RecordKind::Payment));
        assert_eq!(record.kind, RecordKind::Payment);
        assert_eq!(record.name, "Rent");
        assert_eq!(record.created_at, record.updated_at);
    }
}
