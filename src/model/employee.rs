use serde_json::Value;

use super::{Role, check_key_fields, object_of};
use crate::error::AppError;
use crate::store::{Document, ID_FIELD};

/// Employee record as submitted to `POST /users`.
///
/// `email` is the business key; every other field is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub email: String,
    pub fields: Document,
}

impl NewEmployee {
    pub fn from_body(body: Value) -> Result<Self, AppError> {
        let mut fields = object_of(body, "Employee record must be a JSON object")?;
        fields.remove(ID_FIELD);

        let email = fields
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Employee record requires an email".into()))?;
        check_key_fields(&fields)?;

        Ok(Self { email, fields })
    }

    pub fn into_document(self) -> Document {
        self.fields
    }
}

/// Role carried by a stored employee document.
pub fn role_of(doc: &Document) -> Role {
    Role::from_field(doc.get("role"))
}

/// Fields for a `$set` patch. `_id` is never patchable. An empty patch is
/// allowed and simply modifies nothing.
pub fn patch_fields(body: Value) -> Result<Document, AppError> {
    let mut fields = object_of(body, "Payload must be a JSON object")?;
    fields.remove(ID_FIELD);
    check_key_fields(&fields)?;
    Ok(fields)
}
