use chrono::{DateTime, Utc};
use serde::Serialize;

use minicrm_core::{CustomerId, DomainError, DomainResult};

/// A stored customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("email", &self.email)?;
        require_non_blank("phone", &self.phone)
    }
}

impl CustomerPatch {
    pub fn validate(&self) -> DomainResult<()> {
        for (field, value) in [("name", &self.name), ("email", &self.email), ("phone", &self.phone)] {
            if let Some(value) = value {
                require_non_blank(field, value)?;
            }
        }
        Ok(())
    }

    /// Apply the patch onto a record in memory.
    pub fn apply_to(self, customer: &mut Customer) {
        if let Some(name) = self.name {
            customer.name = name;
        }
        if let Some(email) = self.email {
            customer.email = email;
        }
        if let Some(phone) = self.phone {
            customer.phone = phone;
        }
        if let Some(company) = self.company {
            customer.company = Some(company);
        }
    }
}

fn require_non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Customer {
        Customer {
            id: CustomerId::new(1),
            name: "Acme".into(),
            email: "ops@acme.test".into(),
            phone: "555-0100".into(),
            company: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut c = customer();
        CustomerPatch {
            phone: Some("555-0199".into()),
            company: Some("Acme Ltd".into()),
            ..Default::default()
        }
        .apply_to(&mut c);

        assert_eq!(c.email, "ops@acme.test");
        assert_eq!(c.phone, "555-0199");
        assert_eq!(c.company.as_deref(), Some("Acme Ltd"));
    }

    #[test]
    fn blank_patch_fields_are_invalid() {
        let patch = CustomerPatch {
            email: Some("  ".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(CustomerPatch::default().validate().is_ok());
    }
}
