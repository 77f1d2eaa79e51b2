//! Delivery addresses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{is_valid_email, ValidationError};

/// A delivery address as entered at checkout. Also the snapshot stored on orders.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DeliveryAddress {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Email is required"), custom = "deliverable_email")]
    pub email: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address_line: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Pincode is required"))]
    pub pincode: String,
}

impl DeliveryAddress {
    /// Trims every field and checks it. On failure each offending field maps to
    /// exactly one message.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let address = self.trimmed();
        match address.validate() {
            Ok(()) => Ok(address),
            Err(errors) => {
                let fields = errors
                    .field_errors()
                    .into_iter()
                    .filter_map(|(field, errs)| {
                        let message = errs.first()?.message.as_ref()?.to_string();
                        Some((field.to_string(), message))
                    })
                    .collect();
                Err(ValidationError::new(fields))
            }
        }
    }

    fn trimmed(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            address_line: self.address_line.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            pincode: self.pincode.trim().to_string(),
        }
    }
}

/// Empty input is left to the `length` rule.
fn deliverable_email(email: &str) -> Result<(), validator::ValidationError> {
    if email.is_empty() || is_valid_email(email) {
        return Ok(());
    }
    let mut err = validator::ValidationError::new("email");
    err.message = Some("Invalid email format".into());
    Err(err)
}

/// An address saved under a user's profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: Uuid,
    #[serde(flatten)]
    pub address: DeliveryAddress,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated address about to be saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAddress {
    pub address: DeliveryAddress,
    pub is_default: bool,
}

impl NewAddress {
    /// The first address a user saves is always the default; later ones only when asked.
    pub fn for_book(address: DeliveryAddress, existing: usize, make_default: bool) -> Self {
        Self { address, is_default: existing == 0 || make_default }
    }
}
