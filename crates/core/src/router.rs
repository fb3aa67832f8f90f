//! Maps named invocations with positional string arguments onto [`RecordService`].

use crate::config::ServiceConfig;
use crate::identity::IdentityResolver;
use crate::ledger::Ledger;
use crate::model::{Address, Closing, NewCitizen, SubRecord};
use crate::operation::{Operation, Surface};
use crate::service::{RecordService, Uniqueness};
use crate::validation::RequiredText;
use crate::{CitizenError, CitizenResult};
use serde::Serialize;
use std::sync::Arc;

/// Informational status attached to a successful response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    /// `checkUnique` found something at the ID.
    NotUnique,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Ok => "ok",
            ResponseStatus::NotUnique => "not_unique",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub payload: Vec<u8>,
    pub status: ResponseStatus,
}

impl Response {
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            status: ResponseStatus::Ok,
        }
    }

    pub fn empty() -> Self {
        Self::ok(Vec::new())
    }

    /// Payload as text, replacing invalid UTF-8.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

pub struct OperationRouter<R> {
    config: Arc<ServiceConfig>,
    service: RecordService<R>,
}

impl<R: SubRecord> OperationRouter<R> {
    pub fn new(config: Arc<ServiceConfig>) -> CitizenResult<Self> {
        let service = RecordService::new(Arc::clone(&config))?;
        Ok(Self { config, service })
    }

    pub fn service(&self) -> &RecordService<R> {
        &self.service
    }

    /// Mutating entry point.
    pub fn invoke<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        operation: &str,
        args: &[String],
    ) -> CitizenResult<Response> {
        self.dispatch(ledger, Surface::Invoke, operation, args)
    }

    /// Read-only entry point.
    pub fn query<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        operation: &str,
        args: &[String],
    ) -> CitizenResult<Response> {
        self.dispatch(ledger, Surface::Query, operation, args)
    }

    /// Bootstrap entry point: `args` alternate credential name and credential value.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::InvalidInput`] unless at least one complete pair is given.
    pub fn initialise<L: Ledger + ?Sized>(&self, ledger: &mut L, args: &[String]) -> CitizenResult<()> {
        if args.is_empty() || args.len() % 2 != 0 {
            return Err(CitizenError::InvalidInput(format!(
                "initialisation expects name/credential pairs, got {} arguments",
                args.len()
            )));
        }
        let credentials = args
            .chunks_exact(2)
            .map(|pair| -> CitizenResult<_> {
                Ok((RequiredText::new("name", pair[0].as_str())?, pair[1].clone()))
            })
            .collect::<CitizenResult<Vec<_>>>()?;
        self.service.initialise(ledger, &credentials)
    }

    fn dispatch<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        surface: Surface,
        name: &str,
        args: &[String],
    ) -> CitizenResult<Response> {
        let caller = IdentityResolver::new(self.config.roles()).resolve(&*ledger)?;

        let operation = Operation::from_name(name)
            .filter(|op| op.on_surface(surface) && op.available_in(self.config.variant()))
            .ok_or_else(|| CitizenError::UnknownOperation(name.to_string()))?;
        if args.len() != operation.arity() {
            return Err(CitizenError::ArgumentCount {
                operation: operation.name(),
                expected: operation.arity(),
                actual: args.len(),
            });
        }

        tracing::debug!(
            operation = operation.name(),
            caller = %caller.name,
            role = %caller.role_attribute,
            "dispatching"
        );

        let service = &self.service;
        match operation {
            Operation::Create => {
                let new = NewCitizen {
                    person_id: RequiredText::new("personID", args[0].as_str())?,
                    dob: args[1].clone(),
                    gender: args[2].clone(),
                };
                service.create(ledger, &caller, new)?;
                Ok(Response::empty())
            }
            Operation::SetExternalId => {
                service.set_external_id(ledger, &caller, &args[0], args[1].clone())?;
                Ok(Response::empty())
            }
            Operation::SetName => {
                service.set_name(ledger, &caller, &args[0], args[1].clone())?;
                Ok(Response::empty())
            }
            Operation::SetBloodGroup => {
                service.set_blood_group(ledger, &caller, &args[0], args[1].clone())?;
                Ok(Response::empty())
            }
            Operation::SetAddress => {
                let address = Address::from_positional(operation.name(), &args[1..])?;
                service.set_address(ledger, &caller, &args[0], address)?;
                Ok(Response::empty())
            }
            Operation::AddSubRecord => {
                let record_id = RequiredText::new("recordID", args[1].as_str())?;
                let record = R::from_positional(record_id, &args[2..])?;
                service.add_sub_record(ledger, &caller, &args[0], record)?;
                Ok(Response::empty())
            }
            Operation::CloseSubRecord => {
                let closing = Closing {
                    close_date: RequiredText::new("closeDate", args[2].as_str())?,
                    close_summary: RequiredText::new("closeSummary", args[3].as_str())?,
                };
                service.close_sub_record(ledger, &caller, &args[0], &args[1], &closing)?;
                Ok(Response::empty())
            }
            Operation::WriteKey => {
                let key = RequiredText::new("key", args[0].as_str())?;
                service.write_key(ledger, &caller, &key, args[1].clone())?;
                Ok(Response::empty())
            }
            Operation::GetRedactedEntity => {
                let citizen = service.get_redacted_entity(ledger, &caller, &args[0])?;
                encode(&args[0], &citizen)
            }
            Operation::GetFullEntity => {
                let citizen = service.get_full_entity(ledger, &caller, &args[0])?;
                encode(&args[0], &citizen)
            }
            Operation::ListAll => {
                let citizens = service.list_all(ledger, &caller)?;
                encode("listAll", &citizens)
            }
            Operation::CheckUnique => {
                let id = RequiredText::new("personID", args[0].as_str())?;
                Ok(match service.check_unique(ledger, &caller, &id)? {
                    Uniqueness::Unique => Response::ok("true"),
                    Uniqueness::NotUnique => Response {
                        payload: b"false".to_vec(),
                        status: ResponseStatus::NotUnique,
                    },
                })
            }
            Operation::ReadKey => Ok(Response::ok(service.read_key(ledger, &caller, &args[0])?)),
            Operation::GetCredential => Ok(Response::ok(service.get_credential(
                ledger, &caller, &args[0],
            )?)),
            Operation::Heartbeat => Ok(Response::ok(service.heartbeat(&caller)?)),
        }
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> CitizenResult<Response> {
    serde_json::to_vec(value)
        .map(Response::ok)
        .map_err(|source| CitizenError::Serialization {
            key: key.to_string(),
            source,
        })
}
