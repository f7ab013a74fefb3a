//! Ownership-scoped access control.
//!
//! Every read or write of a doctor, patient, or appointment record is decided
//! by [`authorize`]. The decision is a lookup in [`POLICY`], a static table of
//! capability rules keyed by principal kind, resource kind, and operation. A
//! triple with no rule is denied.
//!
//! | Principal | Resource | Read | Write |
//! |---|---|---|---|
//! | Doctor | own `DoctorProfile` | yes | yes |
//! | Doctor | `PatientRecord` it created | yes | yes |
//! | Doctor | `Appointment` it treats | yes | yes |
//! | Doctor | `PatientRoster` | yes | yes (create patient) |
//! | Doctor | `AppointmentBook` | yes | no |
//! | Patient | own `PatientProfile` | yes | yes |
//! | Patient | `Appointment` it attends | yes | no |
//! | Patient | `AppointmentBook` | yes | yes (book) |
//!
//! The resource carries the ownership edges it was loaded with, so the policy
//! never touches storage.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{AppointmentId, DoctorId, PatientId};

/// The authenticated actor making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Principal {
    Doctor(DoctorId),
    Patient(PatientId),
}

impl Principal {
    /// The kind of actor, without its identity.
    #[must_use]
    pub const fn kind(self) -> PrincipalKind {
        match self {
            Self::Doctor(_) => PrincipalKind::Doctor,
            Self::Patient(_) => PrincipalKind::Patient,
        }
    }

    /// The doctor ID, if this principal is a doctor.
    #[must_use]
    pub const fn as_doctor(self) -> Option<DoctorId> {
        match self {
            Self::Doctor(id) => Some(id),
            Self::Patient(_) => None,
        }
    }

    /// The patient ID, if this principal is a patient.
    #[must_use]
    pub const fn as_patient(self) -> Option<PatientId> {
        match self {
            Self::Patient(id) => Some(id),
            Self::Doctor(_) => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doctor(id) => write!(f, "doctor {id}"),
            Self::Patient(id) => write!(f, "patient {id}"),
        }
    }
}

/// Principal kind, as used to key the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Doctor,
    Patient,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Doctor => "doctor",
            Self::Patient => "patient",
        })
    }
}

/// A record, or collection of records, together with its ownership edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A doctor's own account and profile fields.
    DoctorProfile(DoctorId),
    /// A patient's own account and profile fields, as seen by the patient.
    PatientProfile(PatientId),
    /// A patient record as managed by a doctor.
    PatientRecord { id: PatientId, created_by: DoctorId },
    /// A single appointment.
    Appointment {
        id: AppointmentId,
        doctor: DoctorId,
        patient: PatientId,
    },
    /// The caller's collection of patients. Writing means creating a patient.
    PatientRoster,
    /// The caller's collection of appointments. Writing means booking one.
    AppointmentBook,
}

impl Resource {
    /// The resource kind, without identities.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::DoctorProfile(_) => ResourceKind::DoctorProfile,
            Self::PatientProfile(_) => ResourceKind::PatientProfile,
            Self::PatientRecord { .. } => ResourceKind::PatientRecord,
            Self::Appointment { .. } => ResourceKind::Appointment,
            Self::PatientRoster => ResourceKind::PatientRoster,
            Self::AppointmentBook => ResourceKind::AppointmentBook,
        }
    }
}

/// Resource kind, as used to key the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    DoctorProfile,
    PatientProfile,
    PatientRecord,
    Appointment,
    PatientRoster,
    AppointmentBook,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DoctorProfile => "doctor profile",
            Self::PatientProfile => "patient profile",
            Self::PatientRecord => "patient record",
            Self::Appointment => "appointment",
            Self::PatientRoster => "patient roster",
            Self::AppointmentBook => "appointment book",
        })
    }
}

/// What the principal wants to do with the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// The principal is authenticated but not allowed to act on the resource.
///
/// The display form is meant for logs. Clients only ever see a generic
/// permission message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{principal} may not {operation} {resource}")]
pub struct AccessDenied {
    pub principal: Principal,
    pub resource: ResourceKind,
    pub operation: Operation,
}

/// One row of the policy table.
pub struct Rule {
    pub principal: PrincipalKind,
    pub resource: ResourceKind,
    pub operations: &'static [Operation],
    pub allows: fn(Principal, &Resource) -> bool,
}

const READ: &[Operation] = &[Operation::Read];
const READ_WRITE: &[Operation] = &[Operation::Read, Operation::Write];

/// The complete access policy.
pub static POLICY: &[Rule] = &[
    Rule {
        principal: PrincipalKind::Doctor,
        resource: ResourceKind::DoctorProfile,
        operations: READ_WRITE,
        allows: is_own_doctor_profile,
    },
    Rule {
        principal: PrincipalKind::Doctor,
        resource: ResourceKind::PatientRecord,
        operations: READ_WRITE,
        allows: created_the_patient,
    },
    Rule {
        principal: PrincipalKind::Doctor,
        resource: ResourceKind::Appointment,
        operations: READ_WRITE,
        allows: treats_the_appointment,
    },
    Rule {
        principal: PrincipalKind::Doctor,
        resource: ResourceKind::PatientRoster,
        operations: READ_WRITE,
        allows: any,
    },
    Rule {
        principal: PrincipalKind::Doctor,
        resource: ResourceKind::AppointmentBook,
        operations: READ,
        allows: any,
    },
    Rule {
        principal: PrincipalKind::Patient,
        resource: ResourceKind::PatientProfile,
        operations: READ_WRITE,
        allows: is_own_patient_profile,
    },
    Rule {
        principal: PrincipalKind::Patient,
        resource: ResourceKind::Appointment,
        operations: READ,
        allows: attends_the_appointment,
    },
    Rule {
        principal: PrincipalKind::Patient,
        resource: ResourceKind::AppointmentBook,
        operations: READ_WRITE,
        allows: any,
    },
];

const fn any(_: Principal, _: &Resource) -> bool {
    true
}

fn is_own_doctor_profile(principal: Principal, resource: &Resource) -> bool {
    matches!(
        (principal, resource),
        (Principal::Doctor(me), Resource::DoctorProfile(id)) if me == *id
    )
}

fn created_the_patient(principal: Principal, resource: &Resource) -> bool {
    matches!(
        (principal, resource),
        (Principal::Doctor(me), Resource::PatientRecord { created_by, .. }) if me == *created_by
    )
}

fn treats_the_appointment(principal: Principal, resource: &Resource) -> bool {
    matches!(
        (principal, resource),
        (Principal::Doctor(me), Resource::Appointment { doctor, .. }) if me == *doctor
    )
}

fn is_own_patient_profile(principal: Principal, resource: &Resource) -> bool {
    matches!(
        (principal, resource),
        (Principal::Patient(me), Resource::PatientProfile(id)) if me == *id
    )
}

fn attends_the_appointment(principal: Principal, resource: &Resource) -> bool {
    matches!(
        (principal, resource),
        (Principal::Patient(me), Resource::Appointment { patient, .. }) if me == *patient
    )
}

/// Find the rule governing a (principal kind, resource kind, operation) triple.
#[must_use]
pub fn rule_for(
    principal: PrincipalKind,
    resource: ResourceKind,
    operation: Operation,
) -> Option<&'static Rule> {
    POLICY.iter().find(|rule| {
        rule.principal == principal
            && rule.resource == resource
            && rule.operations.contains(&operation)
    })
}

/// Decide whether `principal` may perform `operation` on `resource`.
///
/// # Errors
///
/// Returns [`AccessDenied`] when no rule covers the triple or the covering
/// rule's ownership predicate fails.
pub fn authorize(
    principal: Principal,
    resource: &Resource,
    operation: Operation,
) -> Result<(), AccessDenied> {
    let allowed = rule_for(principal.kind(), resource.kind(), operation)
        .is_some_and(|rule| (rule.allows)(principal, resource));

    if allowed {
        Ok(())
    } else {
        Err(AccessDenied {
            principal,
            resource: resource.kind(),
            operation,
        })
    }
}

/// Boolean form of [`authorize`].
#[must_use]
pub fn can(principal: Principal, resource: &Resource, operation: Operation) -> bool {
    authorize(principal, resource, operation).is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DOC_A: DoctorId = DoctorId::new(1);
    const DOC_B: DoctorId = DoctorId::new(2);
    const PAT_X: PatientId = PatientId::new(10);
    const PAT_Y: PatientId = PatientId::new(11);

    fn patient_of(created_by: DoctorId, id: PatientId) -> Resource {
        Resource::PatientRecord { id, created_by }
    }

    fn appointment(doctor: DoctorId, patient: PatientId) -> Resource {
        Resource::Appointment {
            id: AppointmentId::new(100),
            doctor,
            patient,
        }
    }

    #[test]
    fn test_doctor_manages_only_patients_it_created() {
        let mine = patient_of(DOC_A, PAT_X);
        assert!(can(Principal::Doctor(DOC_A), &mine, Operation::Read));
        assert!(can(Principal::Doctor(DOC_A), &mine, Operation::Write));

        let err = authorize(Principal::Doctor(DOC_B), &mine, Operation::Read).unwrap_err();
        assert_eq!(err.resource, ResourceKind::PatientRecord);
        assert!(!can(Principal::Doctor(DOC_B), &mine, Operation::Write));
    }

    #[test]
    fn test_doctor_manages_only_appointments_it_treats() {
        let appt = appointment(DOC_A, PAT_X);
        assert!(can(Principal::Doctor(DOC_A), &appt, Operation::Write));
        assert!(!can(Principal::Doctor(DOC_B), &appt, Operation::Read));
        assert!(!can(Principal::Doctor(DOC_B), &appt, Operation::Write));
    }

    #[test]
    fn test_patient_reads_only_own_appointments_and_never_writes() {
        let appt = appointment(DOC_A, PAT_X);
        assert!(can(Principal::Patient(PAT_X), &appt, Operation::Read));
        assert!(!can(Principal::Patient(PAT_X), &appt, Operation::Write));
        assert!(!can(Principal::Patient(PAT_Y), &appt, Operation::Read));
    }

    #[test]
    fn test_profiles_are_self_only() {
        assert!(can(Principal::Doctor(DOC_A), &Resource::DoctorProfile(DOC_A), Operation::Write));
        assert!(!can(Principal::Doctor(DOC_B), &Resource::DoctorProfile(DOC_A), Operation::Read));
        assert!(can(Principal::Patient(PAT_X), &Resource::PatientProfile(PAT_X), Operation::Write));
        assert!(!can(Principal::Patient(PAT_Y), &Resource::PatientProfile(PAT_X), Operation::Read));
    }

    #[test]
    fn test_doctor_only_resources_reject_patients() {
        assert!(!can(Principal::Patient(PAT_X), &Resource::PatientRoster, Operation::Read));
        assert!(!can(Principal::Patient(PAT_X), &Resource::PatientRoster, Operation::Write));
        assert!(!can(Principal::Patient(PAT_X), &Resource::DoctorProfile(DOC_A), Operation::Read));
        assert!(!can(Principal::Patient(PAT_X), &patient_of(DOC_A, PAT_X), Operation::Read));
    }

    #[test]
    fn test_doctors_cannot_see_patient_profiles_directly() {
        // Doctors see patients through PatientRecord, never PatientProfile
        assert!(!can(Principal::Doctor(DOC_A), &Resource::PatientProfile(PAT_X), Operation::Read));
    }

    #[test]
    fn test_appointment_book_booking_is_patient_only() {
        assert!(can(Principal::Patient(PAT_X), &Resource::AppointmentBook, Operation::Write));
        assert!(can(Principal::Doctor(DOC_A), &Resource::AppointmentBook, Operation::Read));
        assert!(!can(Principal::Doctor(DOC_A), &Resource::AppointmentBook, Operation::Write));
    }

    #[test]
    fn test_every_rule_is_reachable() {
        for rule in POLICY {
            for &op in rule.operations {
                let found = rule_for(rule.principal, rule.resource, op).unwrap();
                assert!(std::ptr::eq(found, rule), "duplicate rule for {:?}", rule.resource);
            }
        }
    }

    #[test]
    fn test_denial_message_names_the_triple() {
        let err = authorize(Principal::Patient(PAT_Y), &appointment(DOC_A, PAT_X), Operation::Read)
            .unwrap_err();
        assert_eq!(err.to_string(), "patient 11 may not read appointment");
    }

    #[test]
    fn test_principal_serializes_with_role_tag() {
        let json = serde_json::to_value(Principal::Doctor(DOC_A)).unwrap();
        assert_eq!(json, serde_json::json!({"role": "doctor", "id": 1}));
    }
}
